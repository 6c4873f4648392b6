use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};
use tokio::time::timeout;
use tracing::info;

use super::{CoordError, Coordinator};
use crate::config::CoordConfig;
use crate::window::Window;

/// Redis-backed coordinator. The log is a list (`RPUSH`/`LRANGE`), the
/// Missing Set a plain string key (`SET`/`GET`).
pub struct RedisCoordinator {
    conn: MultiplexedConnection,
    url: String,
}

impl RedisCoordinator {
    /// Opens a connection and checks it with `PING`.
    pub async fn connect(config: &CoordConfig) -> Result<Self, CoordError> {
        let url = config.url();
        let client = Client::open(url.as_str())?;
        let conn = client.get_multiplexed_async_connection().await?;
        let coord = RedisCoordinator { conn, url };
        coord.ping().await?;
        info!("Connected to Redis at {}", coord.url);
        Ok(coord)
    }

    /// `connect`, bounded by the configured connect timeout and by the end
    /// of `window`, whichever comes first. A server that accepts the TCP
    /// connection but never answers counts as unreachable.
    pub async fn connect_within(config: &CoordConfig, window: &Window) -> Result<Self, CoordError> {
        let limit = config.connect_timeout.min(window.remaining());
        timeout(limit, Self::connect(config))
            .await
            .unwrap_or(Err(CoordError::ConnectTimeout(limit)))
    }

    /// Releases the connection.
    pub fn close(self) {
        drop(self.conn);
        info!("Disconnected from Redis at {}", self.url);
    }
}

impl Coordinator for RedisCoordinator {
    async fn ping(&self) -> Result<(), CoordError> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    async fn append(&self, key: &str, value: &str) -> Result<(), CoordError> {
        let mut conn = self.conn.clone();
        let _: i64 = conn.rpush(key, value).await?;
        Ok(())
    }

    async fn read_all(&self, key: &str) -> Result<Vec<String>, CoordError> {
        let mut conn = self.conn.clone();
        Ok(conn.lrange(key, 0, -1).await?)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CoordError> {
        let mut conn = self.conn.clone();
        Ok(conn.get(key).await?)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), CoordError> {
        let mut conn = self.conn.clone();
        let _: () = conn.set(key, value).await?;
        Ok(())
    }
}
