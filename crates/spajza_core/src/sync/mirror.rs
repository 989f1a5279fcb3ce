//! Mirror wire format and HTTP client.

use crate::model::collection::Collection;
use crate::model::product::Product;
use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{Duration, Instant};

/// Default bound for one mirror request.
pub const DEFAULT_MIRROR_TIMEOUT: Duration = Duration::from_secs(15);

/// Body of mirror `GET` responses and `POST` requests.
///
/// `categories` is optional on the wire; pushes always send it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorPayload {
    pub products: Vec<Product>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
}

impl From<&Collection> for MirrorPayload {
    fn from(value: &Collection) -> Self {
        Self {
            products: value.products.clone(),
            categories: Some(value.categories.clone()),
        }
    }
}

#[derive(Debug)]
pub enum MirrorError {
    /// Configured endpoint is not a usable URL.
    InvalidEndpoint(String),
    /// Request did not finish within the configured bound.
    Timeout(Duration),
    /// Connection, TLS or protocol failure.
    Transport(reqwest::Error),
    /// Pull answered with a non-success status.
    Status(u16),
    /// Pull body is not `{ products: [...], categories?: [...] }`.
    InvalidPayload(String),
}

impl Display for MirrorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidEndpoint(value) => write!(f, "invalid mirror endpoint: `{value}`"),
            Self::Timeout(after) => write!(f, "mirror request timed out after {}s", after.as_secs()),
            Self::Transport(err) => write!(f, "mirror request failed: {err}"),
            Self::Status(code) => write!(f, "mirror answered with HTTP {code}"),
            Self::InvalidPayload(message) => write!(f, "mirror payload is invalid: {message}"),
        }
    }
}

impl Error for MirrorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Transport(err) => Some(err),
            _ => None,
        }
    }
}

/// Whole-collection pull/push against a remote copy.
#[async_trait]
pub trait MirrorClient: Send + Sync {
    /// Fetches the full remote collection.
    async fn pull(&self) -> Result<MirrorPayload, MirrorError>;

    /// Replaces the full remote collection. The remote answer is not read.
    async fn push(&self, snapshot: &Collection) -> Result<(), MirrorError>;
}

#[derive(Debug, Clone)]
pub struct HttpMirrorConfig {
    pub url: String,
    pub timeout: Duration,
}

impl HttpMirrorConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: DEFAULT_MIRROR_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Mirror client for a plain JSON webhook (`GET` reads, `POST` replaces).
pub struct HttpMirrorClient {
    client: Client,
    url: Url,
    timeout: Duration,
}

impl HttpMirrorClient {
    pub fn new(config: HttpMirrorConfig) -> Result<Self, MirrorError> {
        let url = Url::parse(config.url.trim())
            .map_err(|_| MirrorError::InvalidEndpoint(config.url.clone()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(MirrorError::InvalidEndpoint(config.url));
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(MirrorError::Transport)?;
        Ok(Self {
            client,
            url,
            timeout: config.timeout,
        })
    }

    fn map_transport(&self, err: reqwest::Error) -> MirrorError {
        if err.is_timeout() {
            MirrorError::Timeout(self.timeout)
        } else {
            MirrorError::Transport(err)
        }
    }
}

#[async_trait]
impl MirrorClient for HttpMirrorClient {
    async fn pull(&self) -> Result<MirrorPayload, MirrorError> {
        let started_at = Instant::now();
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|err| self.map_transport(err))?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                "event=mirror_pull module=sync status=error error_code=http_status http_status={} duration_ms={}",
                status.as_u16(),
                started_at.elapsed().as_millis()
            );
            return Err(MirrorError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|err| self.map_transport(err))?;
        let payload: MirrorPayload = serde_json::from_str(&body)
            .map_err(|err| MirrorError::InvalidPayload(err.to_string()))?;

        info!(
            "event=mirror_pull module=sync status=ok products={} has_categories={} duration_ms={}",
            payload.products.len(),
            payload.categories.is_some(),
            started_at.elapsed().as_millis()
        );
        Ok(payload)
    }

    async fn push(&self, snapshot: &Collection) -> Result<(), MirrorError> {
        let started_at = Instant::now();
        let response = self
            .client
            .post(self.url.clone())
            .json(&MirrorPayload::from(snapshot))
            .send()
            .await
            .map_err(|err| self.map_transport(err))?;

        // Delivery is the success signal; the status is informational only.
        debug!(
            "event=mirror_push module=sync status=ok http_status={} products={} duration_ms={}",
            response.status().as_u16(),
            snapshot.products.len(),
            started_at.elapsed().as_millis()
        );
        Ok(())
    }
}
