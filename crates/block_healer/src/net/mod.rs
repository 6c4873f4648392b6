//! Remote block source.
use serde::Deserialize;
use serde_json::Value;

use crate::error::FetchError;

pub mod rest;

/// One fetched record: its height and the opaque JSON payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub height: u64,
    pub payload: Value,
}

/// Anything that can serve the tip and arbitrary heights.
#[allow(async_fn_in_trait)]
pub trait BlockSource {
    /// Fetches the newest available block.
    async fn latest(&self) -> Result<Block, FetchError>;
    /// Fetches the block at `height`.
    async fn by_height(&self, height: u64) -> Result<Block, FetchError>;
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawHeight {
    Number(u64),
    Text(String),
}

/// Reads the height at `pointer`; Cosmos-style APIs encode it as a decimal string.
pub fn extract_height(payload: &Value, pointer: &str) -> Result<u64, FetchError> {
    let raw = payload
        .pointer(pointer)
        .ok_or_else(|| FetchError::MissingHeight {
            pointer: pointer.to_string(),
        })?;
    let invalid = || FetchError::InvalidHeight {
        pointer: pointer.to_string(),
        value: raw.to_string(),
    };
    match RawHeight::deserialize(raw).map_err(|_| invalid())? {
        RawHeight::Number(h) => Ok(h),
        RawHeight::Text(s) => s.trim().parse().map_err(|_| invalid()),
    }
}
