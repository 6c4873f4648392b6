//! Coordination store shared by the poller, detector and healer processes.
//!
//! Only five operations are needed: a liveness check, an append-only list
//! (the Shared Ordered Log) and a single overwritten value (the Missing Set).
use std::time::Duration;

use gap_scan::MissingSetError;
use thiserror::Error;

pub mod memory;
pub mod redis;

pub use self::memory::MemoryCoordinator;
pub use self::redis::RedisCoordinator;

#[derive(Debug, Error)]
pub enum CoordError {
    #[error("redis error: {0}")]
    Redis(#[from] ::redis::RedisError),
    #[error(transparent)]
    MissingSet(#[from] MissingSetError),
    #[error("no answer from the coordination store within {0:?}")]
    ConnectTimeout(Duration),
}

#[allow(async_fn_in_trait)]
pub trait Coordinator {
    async fn ping(&self) -> Result<(), CoordError>;
    /// Appends `value` to the list at `key`; duplicates are kept.
    async fn append(&self, key: &str, value: &str) -> Result<(), CoordError>;
    /// Every value in the list at `key`, in insertion order.
    async fn read_all(&self, key: &str) -> Result<Vec<String>, CoordError>;
    async fn get(&self, key: &str) -> Result<Option<String>, CoordError>;
    /// Replaces the whole value at `key`.
    async fn set(&self, key: &str, value: &str) -> Result<(), CoordError>;
}
