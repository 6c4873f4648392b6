//! Local block repository: one write-once artifact per height.
//!
//! Existence of the artifact is the only record that a height was ingested.
//! Writes must be atomic so concurrent writers of the same height never
//! leave a half-written file under the final name.
use std::io;

use serde_json::Value;
use thiserror::Error;

pub mod dir;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    IO(#[from] io::Error),
    #[error("failed to serialize block {height}: {source}")]
    Serialize {
        height: u64,
        source: serde_json::Error,
    },
    #[error("height {height} does not fit in {width} digits")]
    HeightTooWide { height: u64, width: usize },
}

pub trait Store {
    /// Persists `payload` as the record for `height`, replacing any prior copy.
    fn put(&self, height: u64, payload: &Value) -> Result<(), StoreError>;
    /// Every stored height, in no particular order.
    fn heights(&self) -> Result<Vec<u64>, StoreError>;
}
