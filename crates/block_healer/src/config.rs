//! Resolved runtime configuration. `main` fills these from CLI flags and
//! environment variables; the defaults mirror the historical deployment.
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_LATEST_URL: &str =
    "https://migaloo-api.polkachu.com/cosmos/base/tendermint/v1beta1/blocks/latest";
pub const DEFAULT_BLOCK_URL: &str =
    "https://migaloo-api.polkachu.com/cosmos/base/tendermint/v1beta1/blocks/{}";
pub const DEFAULT_HEIGHT_POINTER: &str = "/block/header/height";

#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub latest_url: String,
    /// Per-height URL; `{}` is replaced by the height, otherwise `/{height}` is appended.
    pub block_url: String,
    /// JSON pointer to the height field in a payload.
    pub height_pointer: String,
    pub request_timeout: Duration,
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig {
            latest_url: DEFAULT_LATEST_URL.to_string(),
            block_url: DEFAULT_BLOCK_URL.to_string(),
            height_pointer: DEFAULT_HEIGHT_POINTER.to_string(),
            request_timeout: Duration::from_secs(12),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub root: PathBuf,
    /// Digit width of a record file name.
    pub id_width: usize,
    pub json_extension: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            root: PathBuf::from("../tendermint"),
            id_width: 7,
            json_extension: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CoordConfig {
    pub host: String,
    pub port: u16,
    pub db: i64,
    pub log_key: String,
    pub gaps_key: String,
    /// Upper bound on connect + `PING` at startup.
    pub connect_timeout: Duration,
}

impl CoordConfig {
    pub fn url(&self) -> String {
        format!("redis://{}:{}/{}", self.host, self.port, self.db)
    }
}

impl Default for CoordConfig {
    fn default() -> Self {
        CoordConfig {
            host: "localhost".to_string(),
            port: 6379,
            db: 0,
            log_key: "blocks_collected".to_string(),
            gaps_key: "gaps_detected".to_string(),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub window: Duration,
    pub backoff: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        PollerConfig {
            window: Duration::from_secs(60),
            backoff: Duration::from_secs(5),
        }
    }
}

/// Shared by the gap detector and the remote-state healer.
#[derive(Debug, Clone)]
pub struct CycleConfig {
    pub window: Duration,
    pub scans: u32,
    pub interval: Duration,
}

impl Default for CycleConfig {
    fn default() -> Self {
        CycleConfig {
            window: Duration::from_secs(60),
            scans: 5,
            interval: Duration::from_secs(12),
        }
    }
}
