#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use block_healer::coord::{CoordError, Coordinator, MemoryCoordinator};
use block_healer::error::FetchError;
use block_healer::net::{Block, BlockSource};
use block_healer::store::{Store, StoreError};
use reqwest::StatusCode;
use serde_json::{Value, json};

pub fn payload(height: u64) -> Value {
    json!({ "block": { "header": { "height": height.to_string(), "chain_id": "test-1" } } })
}

/// Source that replays a fixed script of tips and serves every height
/// except the ones marked as failing.
#[derive(Default)]
pub struct ScriptedSource {
    tips: Mutex<VecDeque<u64>>,
    failing: HashSet<u64>,
    tip_delay: Option<Duration>,
    requested: Mutex<Vec<u64>>,
}

impl ScriptedSource {
    pub fn with_tips(tips: &[u64]) -> Self {
        ScriptedSource {
            tips: Mutex::new(tips.iter().copied().collect()),
            ..Self::default()
        }
    }

    pub fn failing(mut self, heights: &[u64]) -> Self {
        self.failing.extend(heights);
        self
    }

    /// Every `latest` call hangs for `delay` before answering.
    pub fn slow_tip(mut self, delay: Duration) -> Self {
        self.tip_delay = Some(delay);
        self
    }

    pub fn requested(&self) -> Vec<u64> {
        self.requested.lock().unwrap().clone()
    }
}

impl BlockSource for ScriptedSource {
    async fn latest(&self) -> Result<Block, FetchError> {
        if let Some(delay) = self.tip_delay {
            tokio::time::sleep(delay).await;
        }
        // Once the script runs dry the source behaves as if unreachable.
        let height = self
            .tips
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(FetchError::Timeout)?;
        Ok(Block {
            height,
            payload: payload(height),
        })
    }

    async fn by_height(&self, height: u64) -> Result<Block, FetchError> {
        self.requested.lock().unwrap().push(height);
        if self.failing.contains(&height) {
            return Err(FetchError::Status {
                status: StatusCode::NOT_FOUND,
                body: "block not found".to_string(),
            });
        }
        Ok(Block {
            height,
            payload: payload(height),
        })
    }
}

/// Wraps a store and counts writes.
pub struct CountingStore<St> {
    pub inner: St,
    puts: AtomicUsize,
}

impl<St: Store> CountingStore<St> {
    pub fn new(inner: St) -> Self {
        CountingStore {
            inner,
            puts: AtomicUsize::new(0),
        }
    }

    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

impl<St: Store> Store for CountingStore<St> {
    fn put(&self, height: u64, payload: &Value) -> Result<(), StoreError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.inner.put(height, payload)
    }

    fn heights(&self) -> Result<Vec<u64>, StoreError> {
        self.inner.heights()
    }
}

pub fn sorted(mut heights: Vec<u64>) -> Vec<u64> {
    heights.sort_unstable();
    heights
}

fn down() -> CoordError {
    CoordError::Redis(redis::RedisError::from((
        redis::ErrorKind::IoError,
        "connection refused",
    )))
}

/// Coordinator whose backend is always down.
pub struct DownCoordinator;

impl Coordinator for DownCoordinator {
    async fn ping(&self) -> Result<(), CoordError> {
        Err(down())
    }
    async fn append(&self, _: &str, _: &str) -> Result<(), CoordError> {
        Err(down())
    }
    async fn read_all(&self, _: &str) -> Result<Vec<String>, CoordError> {
        Err(down())
    }
    async fn get(&self, _: &str) -> Result<Option<String>, CoordError> {
        Err(down())
    }
    async fn set(&self, _: &str, _: &str) -> Result<(), CoordError> {
        Err(down())
    }
}

/// In-memory coordinator whose first `n` appends fail.
pub struct FlakyCoordinator {
    pub inner: MemoryCoordinator,
    failing_appends: AtomicUsize,
}

impl FlakyCoordinator {
    pub fn failing_appends(n: usize) -> Self {
        FlakyCoordinator {
            inner: MemoryCoordinator::new(),
            failing_appends: AtomicUsize::new(n),
        }
    }
}

impl Coordinator for FlakyCoordinator {
    async fn ping(&self) -> Result<(), CoordError> {
        self.inner.ping().await
    }
    async fn append(&self, key: &str, value: &str) -> Result<(), CoordError> {
        let left = self.failing_appends.load(Ordering::SeqCst);
        if left > 0 {
            self.failing_appends.store(left - 1, Ordering::SeqCst);
            return Err(down());
        }
        self.inner.append(key, value).await
    }
    async fn read_all(&self, key: &str) -> Result<Vec<String>, CoordError> {
        self.inner.read_all(key).await
    }
    async fn get(&self, key: &str) -> Result<Option<String>, CoordError> {
        self.inner.get(key).await
    }
    async fn set(&self, key: &str, value: &str) -> Result<(), CoordError> {
        self.inner.set(key, value).await
    }
}

/// Store whose first `n` writes fail.
pub struct FlakyStore<St> {
    pub inner: St,
    failing_puts: AtomicUsize,
}

impl<St: Store> FlakyStore<St> {
    pub fn failing_puts(inner: St, n: usize) -> Self {
        FlakyStore {
            inner,
            failing_puts: AtomicUsize::new(n),
        }
    }
}

impl<St: Store> Store for FlakyStore<St> {
    fn put(&self, height: u64, payload: &Value) -> Result<(), StoreError> {
        let left = self.failing_puts.load(Ordering::SeqCst);
        if left > 0 {
            self.failing_puts.store(left - 1, Ordering::SeqCst);
            return Err(StoreError::IO(std::io::Error::other("disk full")));
        }
        self.inner.put(height, payload)
    }

    fn heights(&self) -> Result<Vec<u64>, StoreError> {
        self.inner.heights()
    }
}
