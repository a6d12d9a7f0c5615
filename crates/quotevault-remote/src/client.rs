use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::retry::{is_retryable_status, with_retry, RetryConfig};

/// Default read/write endpoint. JSONPlaceholder serves a stable set of
/// post records and accepts (and discards) POSTs, which is all the mirror
/// protocol needs.
pub const DEFAULT_BASE_URL: &str = "https://jsonplaceholder.typicode.com";

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("remote request failed: {0}")]
    RequestFailed(String),

    #[error("rate limited by remote")]
    RateLimited,

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("response decode failed: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RemoteError>;

/// One record as the remote endpoint shapes it. Mapping into a Quote is the
/// core crate's business.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemotePost {
    pub id: u64,
    #[serde(default)]
    pub user_id: u64,
    pub title: String,
    #[serde(default)]
    pub body: String,
}

pub struct RemoteClient {
    client: reqwest::Client,
    base_url: String,
    retry_config: RetryConfig,
}

impl RemoteClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("quotevault/0.1.0"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.into(),
            retry_config: RetryConfig::default(),
        }
    }

    /// Create client with custom retry configuration
    pub fn with_retry_config(base_url: impl Into<String>, retry_config: RetryConfig) -> Self {
        let mut client = Self::new(base_url);
        client.retry_config = retry_config;
        client
    }

    /// Fetch the remote post collection, optionally capped.
    pub async fn fetch_posts(&self, limit: Option<usize>) -> Result<Vec<RemotePost>> {
        let url = format!("{}/posts", self.base_url);

        with_retry(&self.retry_config, || async {
            let mut request = self.client.get(&url);
            if let Some(limit) = limit {
                request = request.query(&[("_limit", limit.to_string())]);
            }

            let response = request.send().await?;

            if response.status() == 429 {
                return Err(RemoteError::RateLimited);
            }

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                if is_retryable_status(status) {
                    debug!("Retryable status {} from remote", status);
                }
                return Err(RemoteError::RequestFailed(format!(
                    "Status {}: {}",
                    status, body
                )));
            }

            // Decode by hand so transport and shape failures stay distinct
            let raw = response.text().await?;
            let posts: Vec<RemotePost> = serde_json::from_str(&raw)?;
            debug!("Fetched {} remote posts", posts.len());
            Ok(posts)
        })
        .await
    }

    /// Mirror one locally created quote outward.
    ///
    /// The endpoint's answer only ever feeds a status line; callers must not
    /// let a failure here touch local state.
    pub async fn push_post(&self, title: &str, body: &str) -> Result<()> {
        let url = format!("{}/posts", self.base_url);
        let payload = serde_json::json!({
            "title": title,
            "body": body,
            "userId": 1,
        });

        with_retry(&self.retry_config, || async {
            let response = self.client.post(&url).json(&payload).send().await?;

            if response.status() == 429 {
                return Err(RemoteError::RateLimited);
            }

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(RemoteError::RequestFailed(format!(
                    "Status {}: {}",
                    status, body
                )));
            }

            debug!("Mirrored quote to remote");
            Ok(())
        })
        .await
    }
}
