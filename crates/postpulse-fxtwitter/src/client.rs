//! HTTP client for the fxtwitter status API.

use std::time::Duration;

use chrono::Utc;
use postpulse_core::{parse_post_id, PostDetails};
use reqwest::{Client, Url};

use crate::error::FxTwitterError;
use crate::retry::retry_with_backoff;
use crate::types::StatusEnvelope;

const DEFAULT_BASE_URL: &str = "https://api.fxtwitter.com";

/// How often a transiently failing lookup is retried before it is skipped.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            backoff_base_ms: 500,
        }
    }
}

/// Client for `GET /status/{postId}`.
#[derive(Debug, Clone)]
pub struct FxTwitterClient {
    client: Client,
    base_url: Url,
    retry: RetryPolicy,
}

impl FxTwitterClient {
    /// Creates a new client pointed at the public fxtwitter API.
    ///
    /// # Errors
    ///
    /// Returns [`FxTwitterError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        retry: RetryPolicy,
    ) -> Result<Self, FxTwitterError> {
        Self::with_base_url(timeout_secs, user_agent, retry, DEFAULT_BASE_URL)
    }

    /// Creates a new client with a custom base URL.
    ///
    /// # Errors
    ///
    /// Returns [`FxTwitterError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`FxTwitterError::InvalidBaseUrl`] if
    /// `base_url` does not parse.
    pub fn with_base_url(
        timeout_secs: u64,
        user_agent: &str,
        retry: RetryPolicy,
        base_url: &str,
    ) -> Result<Self, FxTwitterError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(5))
            .user_agent(user_agent)
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| FxTwitterError::InvalidBaseUrl(format!("'{base_url}': {e}")))?;

        Ok(Self {
            client,
            base_url,
            retry,
        })
    }

    /// Looks up engagement data for a post URL.
    ///
    /// Returns `None` without a request when the URL has no numeric post id,
    /// and `None` after logging when the provider fails for any reason.
    pub async fn lookup(&self, url: &str) -> Option<PostDetails> {
        let Some(post_id) = parse_post_id(url) else {
            tracing::debug!(url, "no post id in url; skipping lookup");
            return None;
        };

        match self.fetch_status(post_id).await {
            Ok(details) => Some(details),
            Err(e) => {
                tracing::warn!(url, post_id, error = %e, "engagement lookup failed");
                None
            }
        }
    }

    /// Fetches and converts one status, retrying transient failures.
    ///
    /// # Errors
    ///
    /// - [`FxTwitterError::Status`] on a non-2xx HTTP status.
    /// - [`FxTwitterError::Api`] if the envelope `code` is not 200.
    /// - [`FxTwitterError::MissingTweet`] if the envelope has no tweet.
    /// - [`FxTwitterError::Http`] on network failure or timeout.
    /// - [`FxTwitterError::Deserialize`] if the body is not a status envelope.
    pub async fn fetch_status(&self, post_id: &str) -> Result<PostDetails, FxTwitterError> {
        let url = self
            .base_url
            .join(&format!("status/{post_id}"))
            .map_err(|e| FxTwitterError::InvalidBaseUrl(e.to_string()))?;

        let envelope = retry_with_backoff(
            self.retry.max_retries,
            self.retry.backoff_base_ms,
            || self.request_envelope(&url),
        )
        .await?;

        if envelope.code != 200 {
            return Err(FxTwitterError::Api {
                code: envelope.code,
                message: envelope.message.unwrap_or_default(),
            });
        }
        let tweet = envelope.tweet.ok_or(FxTwitterError::MissingTweet)?;
        Ok(tweet.into_details(post_id, Utc::now()))
    }

    async fn request_envelope(&self, url: &Url) -> Result<StatusEnvelope, FxTwitterError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FxTwitterError::Status {
                status: status.as_u16(),
            });
        }
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| FxTwitterError::Deserialize {
            context: url.to_string(),
            source: e,
        })
    }
}
