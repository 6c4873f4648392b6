//! Local-Scan Healer: finds gaps by listing the block directory itself and
//! backfills them. Never touches the coordination store, so it keeps
//! working when Redis is down or out of step with the files on disk.
use tracing::info;

use crate::config::{SourceConfig, StoreConfig};
use crate::error::Error;
use crate::healer::{HealSummary, heal_heights};
use crate::net::BlockSource;
use crate::net::rest::RestClient;
use crate::store::dir::DirStore;
use crate::store::{Store, StoreError};

pub struct LocalScanHealer<'a, S, St> {
    source: &'a S,
    store: &'a St,
}

impl<'a, S: BlockSource, St: Store> LocalScanHealer<'a, S, St> {
    pub fn new(source: &'a S, store: &'a St) -> Self {
        LocalScanHealer { source, store }
    }

    /// Heights missing between the stored ones, ascending.
    pub fn missing(&self) -> Result<Vec<u64>, StoreError> {
        Ok(gap_scan::missing_heights(self.store.heights()?))
    }

    /// Single pass: list, compute gaps, fetch each missing height.
    pub async fn run(&self) -> Result<HealSummary, StoreError> {
        info!("Detecting gaps in stored blocks...");
        let missing = self.missing()?;
        info!("Missing blocks: {}", missing.len());

        let mut summary = HealSummary::default();
        if !missing.is_empty() {
            heal_heights(self.source, self.store, &missing, &mut summary).await;
        }
        info!(
            healed = summary.healed.len(),
            failed = summary.failed.len(),
            "Local-scan healer finished"
        );
        Ok(summary)
    }
}

pub async fn launch(source: &SourceConfig, store: &StoreConfig) -> Result<HealSummary, Error> {
    let client = RestClient::new(source)?;
    let store = DirStore::from_config(store)?;
    Ok(LocalScanHealer::new(&client, &store).run().await?)
}
