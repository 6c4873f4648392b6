use reqwest::{Client, Url, header};
use serde_json::Value;
use tracing::debug;

use super::{Block, BlockSource, extract_height};
use crate::config::SourceConfig;
use crate::error::{Error, FetchError};

/// Longest response body excerpt kept in a `FetchError::Status`.
const BODY_EXCERPT: usize = 256;

/// HTTP client for a REST block API exposing a "latest" endpoint and a
/// per-height endpoint, both returning the same JSON shape.
///
/// Every request carries the configured timeout; there is no retry here,
/// callers decide what to do with a failure.
pub struct RestClient {
    client: Client,
    latest_url: Url,
    block_url: String,
    height_pointer: String,
}

impl RestClient {
    pub fn new(config: &SourceConfig) -> Result<Self, Error> {
        let latest_url = parse_http_url(&config.latest_url)?;
        // Validate the template with a representative height.
        parse_http_url(&fill_template(&config.block_url, 0))?;

        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::HttpClient(e.to_string()))?;

        Ok(RestClient {
            client,
            latest_url,
            block_url: config.block_url.clone(),
            height_pointer: config.height_pointer.clone(),
        })
    }

    /// URL the per-height request for `height` goes to.
    pub fn block_url(&self, height: u64) -> String {
        fill_template(&self.block_url, height)
    }

    async fn get(&self, url: &str) -> Result<Block, FetchError> {
        debug!("GET {url}");
        let res = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status,
                body: excerpt(&body),
            });
        }

        let bytes = res.bytes().await?;
        let payload: Value = serde_json::from_slice(&bytes)?;
        let height = extract_height(&payload, &self.height_pointer)?;
        Ok(Block { height, payload })
    }
}

impl BlockSource for RestClient {
    async fn latest(&self) -> Result<Block, FetchError> {
        self.get(self.latest_url.as_str()).await
    }

    async fn by_height(&self, height: u64) -> Result<Block, FetchError> {
        let block = self.get(&self.block_url(height)).await?;
        if block.height != height {
            debug!("requested block {height}, payload reports {}", block.height);
        }
        Ok(block)
    }
}

fn parse_http_url(raw: &str) -> Result<Url, Error> {
    let url = Url::parse(raw).map_err(|e| Error::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(Error::NonHttpUrl(raw.to_string())),
    }
}

fn fill_template(template: &str, height: u64) -> String {
    if template.contains("{}") {
        template.replace("{}", &height.to_string())
    } else {
        format!("{}/{height}", template.trim_end_matches('/'))
    }
}

fn excerpt(body: &str) -> String {
    let body = body.trim();
    match body.char_indices().nth(BODY_EXCERPT) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
