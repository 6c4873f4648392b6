//! Tip Poller: keeps fetching the newest block, stores each new one and
//! appends its height to the Shared Ordered Log.
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::{CoordConfig, PollerConfig, SourceConfig, StoreConfig};
use crate::coord::{CoordError, Coordinator, RedisCoordinator};
use crate::error::{Error, FetchError};
use crate::net::BlockSource;
use crate::net::rest::RestClient;
use crate::store::dir::DirStore;
use crate::store::{Store, StoreError};
use crate::window::Window;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// A new tip was persisted and logged.
    Stored(u64),
    /// The source has not advanced since the previous poll.
    Duplicate(u64),
}

#[derive(Debug, Error)]
pub enum PollError {
    #[error("failed to fetch the latest block: {0}")]
    Fetch(#[from] FetchError),
    #[error("failed to store block {height}: {source}")]
    Store { height: u64, source: StoreError },
    #[error("failed to log block {height}: {source}")]
    Coord { height: u64, source: CoordError },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollSummary {
    pub stored: u64,
    pub duplicates: u64,
    pub failures: u64,
    pub last_height: Option<u64>,
}

pub struct TipPoller<'a, S, St, C> {
    source: &'a S,
    store: &'a St,
    coord: &'a C,
    log_key: String,
    last_seen: Option<u64>,
}

impl<'a, S, St, C> TipPoller<'a, S, St, C>
where
    S: BlockSource,
    St: Store,
    C: Coordinator,
{
    pub fn new(source: &'a S, store: &'a St, coord: &'a C, log_key: impl Into<String>) -> Self {
        TipPoller {
            source,
            store,
            coord,
            log_key: log_key.into(),
            last_seen: None,
        }
    }

    /// Height of the last block this instance stored.
    pub fn last_seen(&self) -> Option<u64> {
        self.last_seen
    }

    /// One poll of the latest endpoint.
    ///
    /// Only the immediately preceding height is suppressed; the store write
    /// is idempotent and log readers tolerate duplicates, so older repeats
    /// are written again.
    pub async fn poll_once(&mut self) -> Result<PollOutcome, PollError> {
        let block = self.source.latest().await?;
        let height = block.height;
        if self.last_seen == Some(height) {
            return Ok(PollOutcome::Duplicate(height));
        }

        self.store
            .put(height, &block.payload)
            .map_err(|source| PollError::Store { height, source })?;
        self.coord
            .append(&self.log_key, &height.to_string())
            .await
            .map_err(|source| PollError::Coord { height, source })?;

        self.last_seen = Some(height);
        Ok(PollOutcome::Stored(height))
    }

    /// Polls until the window closes. Duplicates are retried immediately,
    /// failures after `backoff`.
    pub async fn run(&mut self, window: &Window, backoff: Duration) -> PollSummary {
        let mut summary = PollSummary::default();
        info!("Fetching blocks from the online source...");

        while window.is_open() {
            let Some(result) = window.run(self.poll_once()).await else {
                debug!("execution window closed with a poll in flight");
                break;
            };
            match result {
                Ok(PollOutcome::Stored(height)) => {
                    summary.stored += 1;
                    summary.last_height = Some(height);
                    info!("Block {height} saved and logged");
                }
                Ok(PollOutcome::Duplicate(height)) => {
                    summary.duplicates += 1;
                    debug!("tip still at {height}");
                }
                Err(e) => {
                    summary.failures += 1;
                    match &e {
                        PollError::Fetch(f) if f.is_transient() => warn!("{e}"),
                        _ => error!("{e}"),
                    }
                    if !window.sleep(backoff).await {
                        break;
                    }
                }
            }
        }

        info!(
            stored = summary.stored,
            duplicates = summary.duplicates,
            failures = summary.failures,
            "Tip poller finished"
        );
        summary
    }
}

/// Connect, poll for one window, release.
pub async fn launch(
    source: &SourceConfig,
    store: &StoreConfig,
    coord: &CoordConfig,
    config: &PollerConfig,
) -> Result<PollSummary, Error> {
    let client = RestClient::new(source)?;
    let store = DirStore::from_config(store)?;
    let window = Window::new(config.window);

    let redis = match RedisCoordinator::connect_within(coord, &window).await {
        Ok(redis) => redis,
        Err(e) => {
            error!("Could not connect to Redis at {}: {e}", coord.url());
            return Ok(PollSummary::default());
        }
    };

    let summary = TipPoller::new(&client, &store, &redis, coord.log_key.as_str())
        .run(&window, config.backoff)
        .await;
    redis.close();
    Ok(summary)
}
