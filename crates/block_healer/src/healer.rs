//! Remote-State Healer: reads the Missing Set published by the detector and
//! backfills each listed height from the remote source.
//!
//! The Missing Set is a stale hint, not a queue. Nothing is acknowledged or
//! removed; heights healed since the last detector scan are simply fetched
//! and overwritten again.
use tracing::{error, info, warn};

use crate::config::{CoordConfig, CycleConfig, SourceConfig, StoreConfig};
use crate::coord::{CoordError, Coordinator, RedisCoordinator};
use crate::error::Error;
use crate::net::BlockSource;
use crate::net::rest::RestClient;
use crate::store::Store;
use crate::store::dir::DirStore;
use crate::window::Window;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealSummary {
    pub healed: Vec<u64>,
    pub failed: Vec<u64>,
}

impl HealSummary {
    pub fn attempted(&self) -> usize {
        self.healed.len() + self.failed.len()
    }
}

/// Fetches and stores each height in order. A failure is logged and the
/// batch moves on; there is no retry within a batch.
pub async fn heal_heights<S, St>(source: &S, store: &St, heights: &[u64], summary: &mut HealSummary)
where
    S: BlockSource,
    St: Store,
{
    for &height in heights {
        info!("Requesting block {height}");
        let block = match source.by_height(height).await {
            Ok(block) => block,
            Err(e) => {
                if e.is_transient() {
                    warn!("Error downloading block {height}: {e}");
                } else {
                    error!("Error downloading block {height}: {e}");
                }
                summary.failed.push(height);
                continue;
            }
        };

        match store.put(height, &block.payload) {
            Ok(()) => {
                info!("Downloaded block {height} fetched and stored");
                summary.healed.push(height);
            }
            Err(e) => {
                error!("Error storing block {height}: {e}");
                summary.failed.push(height);
            }
        }
    }
}

pub struct RemoteHealer<'a, S, St, C> {
    source: &'a S,
    store: &'a St,
    coord: &'a C,
    gaps_key: String,
}

impl<'a, S, St, C> RemoteHealer<'a, S, St, C>
where
    S: BlockSource,
    St: Store,
    C: Coordinator,
{
    pub fn new(source: &'a S, store: &'a St, coord: &'a C, gaps_key: impl Into<String>) -> Self {
        RemoteHealer {
            source,
            store,
            coord,
            gaps_key: gaps_key.into(),
        }
    }

    /// Reads the Missing Set and heals every height in it. Returns how many
    /// heights were listed.
    pub async fn heal_once(&self, summary: &mut HealSummary) -> Result<usize, CoordError> {
        let raw = self.coord.get(&self.gaps_key).await?;
        let missing = gap_scan::missing_set::decode(raw.as_deref())?;
        if missing.is_empty() {
            return Ok(0);
        }

        info!("Missing blocks: {} listed", missing.len());
        heal_heights(self.source, self.store, &missing, summary).await;
        Ok(missing.len())
    }

    /// Runs up to `config.scans` heal cycles, `config.interval` apart, inside `window`.
    pub async fn run(&self, window: &Window, config: &CycleConfig) -> HealSummary {
        let mut summary = HealSummary::default();

        for cycle in 1..=config.scans {
            if !window.is_open() {
                break;
            }
            let Some(result) = window.run(self.heal_once(&mut summary)).await else {
                break;
            };
            match result {
                Ok(0) => info!("No missing blocks detected"),
                Ok(listed) => info!("Heal cycle {cycle} processed {listed} missing blocks"),
                Err(e) => error!("Error reading missing blocks: {e}"),
            }

            if cycle < config.scans && !window.sleep(config.interval).await {
                break;
            }
        }

        info!(
            healed = summary.healed.len(),
            failed = summary.failed.len(),
            "Remote-state healer finished"
        );
        summary
    }
}

/// Connect, heal for one window, release.
pub async fn launch(
    source: &SourceConfig,
    store: &StoreConfig,
    coord: &CoordConfig,
    config: &CycleConfig,
) -> Result<HealSummary, Error> {
    let client = RestClient::new(source)?;
    let store = DirStore::from_config(store)?;
    let window = Window::new(config.window);

    let redis = match RedisCoordinator::connect_within(coord, &window).await {
        Ok(redis) => redis,
        Err(e) => {
            error!("Could not connect to Redis at {}: {e}", coord.url());
            return Ok(HealSummary::default());
        }
    };

    let summary = RemoteHealer::new(&client, &store, &redis, coord.gaps_key.as_str())
        .run(&window, config)
        .await;
    redis.close();
    Ok(summary)
}
