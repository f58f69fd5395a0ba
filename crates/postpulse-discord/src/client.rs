//! HTTP client for the Discord REST API.
//!
//! Page fetches are never retried: the caller's crawl is all-or-nothing and a
//! failed page aborts it.

use std::time::Duration;

use reqwest::{header, Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::error::DiscordError;
use crate::types::{BotUser, Message};

const DEFAULT_BASE_URL: &str = "https://discord.com/api/v10";

/// Upper bound Discord accepts for `limit`.
pub const MAX_PAGE_SIZE: u8 = 100;

/// Client for the Discord REST API.
///
/// Use [`DiscordClient::new`] for production or [`DiscordClient::with_base_url`]
/// to point at a mock server in tests.
#[derive(Clone)]
pub struct DiscordClient {
    client: Client,
    token: String,
    base_url: Url,
}

impl std::fmt::Debug for DiscordClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordClient")
            .field("base_url", &self.base_url.as_str())
            .field("token", &"[redacted]")
            .finish_non_exhaustive()
    }
}

impl DiscordClient {
    /// Creates a new client pointed at the production Discord API.
    ///
    /// # Errors
    ///
    /// Returns [`DiscordError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(token: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, DiscordError> {
        Self::with_base_url(token, timeout_secs, user_agent, DEFAULT_BASE_URL)
    }

    /// Creates a new client with a custom base URL.
    ///
    /// # Errors
    ///
    /// Returns [`DiscordError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`DiscordError::InvalidBaseUrl`] if
    /// `base_url` does not parse.
    pub fn with_base_url(
        token: &str,
        timeout_secs: u64,
        user_agent: &str,
        base_url: &str,
    ) -> Result<Self, DiscordError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // A trailing slash makes Url::join append instead of replacing the last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| DiscordError::InvalidBaseUrl(format!("'{base_url}': {e}")))?;

        Ok(Self {
            client,
            token: token.to_owned(),
            base_url,
        })
    }

    /// Validates the token against `GET /users/@me` and opens a session.
    ///
    /// # Errors
    ///
    /// - [`DiscordError::Unauthorized`] if the token is rejected.
    /// - [`DiscordError::Http`] on network failure.
    /// - [`DiscordError::UnexpectedStatus`] for any other non-2xx status.
    pub async fn connect(&self) -> Result<DiscordSession, DiscordError> {
        let url = self.endpoint("users/@me")?;
        let response = self.get(url.clone()).await?;
        let response = check_status(response, None).await?;
        let user: BotUser = parse_json(response, url.as_str()).await?;

        tracing::info!(bot = %user.username, "discord session ready");
        Ok(DiscordSession {
            client: self.clone(),
            user,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, DiscordError> {
        self.base_url
            .join(path)
            .map_err(|e| DiscordError::InvalidBaseUrl(format!("joining '{path}': {e}")))
    }

    async fn get(&self, url: Url) -> Result<Response, DiscordError> {
        let response = self
            .client
            .get(url)
            .header(header::AUTHORIZATION, format!("Bot {}", self.token))
            .send()
            .await?;
        Ok(response)
    }
}

/// An authenticated connection to Discord, obtained from [`DiscordClient::connect`].
///
/// Discord's REST API holds no server-side session state, so there is nothing
/// to tear down; dropping the value releases the HTTP client.
#[derive(Debug)]
pub struct DiscordSession {
    client: DiscordClient,
    user: BotUser,
}

impl DiscordSession {
    /// The bot account the session is authenticated as.
    #[must_use]
    pub fn user(&self) -> &BotUser {
        &self.user
    }

    /// Fetches up to `limit` messages from `channel_id`, newest first.
    ///
    /// With `before`, only messages older than that message id are returned.
    ///
    /// # Errors
    ///
    /// - [`DiscordError::InvalidChannelId`] if `channel_id` is not numeric.
    /// - [`DiscordError::Unauthorized`] if the token is rejected.
    /// - [`DiscordError::ChannelUnavailable`] on 403/404.
    /// - [`DiscordError::RateLimited`] on 429.
    /// - [`DiscordError::Http`] on network failure or timeout.
    /// - [`DiscordError::Deserialize`] if the body is not a message list.
    pub async fn fetch_messages_page(
        &self,
        channel_id: &str,
        limit: u8,
        before: Option<&str>,
    ) -> Result<Vec<Message>, DiscordError> {
        if channel_id.is_empty() || !channel_id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DiscordError::InvalidChannelId(channel_id.to_owned()));
        }

        let mut url = self
            .client
            .endpoint(&format!("channels/{channel_id}/messages"))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("limit", &limit.min(MAX_PAGE_SIZE).to_string());
            if let Some(before) = before {
                pairs.append_pair("before", before);
            }
        }

        let response = self.client.get(url.clone()).await?;
        let response = check_status(response, Some(channel_id)).await?;
        let messages: Vec<Message> = parse_json(response, url.as_str()).await?;

        tracing::debug!(
            channel = channel_id,
            before = before.unwrap_or("-"),
            count = messages.len(),
            "fetched discord message page"
        );
        Ok(messages)
    }
}

/// Maps non-2xx statuses to typed errors. `channel_id` is set for channel-scoped calls.
async fn check_status(
    response: Response,
    channel_id: Option<&str>,
) -> Result<Response, DiscordError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match (status, channel_id) {
        (StatusCode::UNAUTHORIZED, _) => Err(DiscordError::Unauthorized),
        (StatusCode::FORBIDDEN | StatusCode::NOT_FOUND, Some(channel_id)) => {
            Err(DiscordError::ChannelUnavailable {
                channel_id: channel_id.to_owned(),
                status: status.as_u16(),
            })
        }
        (StatusCode::TOO_MANY_REQUESTS, _) => {
            let retry_after = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(ToOwned::to_owned);
            Err(DiscordError::RateLimited { retry_after })
        }
        _ => {
            let body = response.text().await.unwrap_or_default();
            Err(DiscordError::UnexpectedStatus {
                status: status.as_u16(),
                body: truncate(&body, 200),
            })
        }
    }
}

async fn parse_json<T: DeserializeOwned>(
    response: Response,
    context: &str,
) -> Result<T, DiscordError> {
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| DiscordError::Deserialize {
        context: context.to_owned(),
        source: e,
    })
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(base_url: &str) -> DiscordClient {
        DiscordClient::with_base_url("test-token", 5, "postpulse-test", base_url)
            .expect("client construction should not fail")
    }

    #[test]
    fn endpoint_appends_to_versioned_base() {
        let client = test_client("https://discord.com/api/v10");
        let url = client.endpoint("users/@me").unwrap();
        assert_eq!(url.as_str(), "https://discord.com/api/v10/users/@me");
    }

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        let client = test_client("https://discord.com/api/v10/");
        let url = client.endpoint("channels/1/messages").unwrap();
        assert_eq!(url.as_str(), "https://discord.com/api/v10/channels/1/messages");
    }

    #[test]
    fn debug_hides_token() {
        let client = test_client("https://discord.com/api/v10");
        assert!(!format!("{client:?}").contains("test-token"));
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let result = DiscordClient::with_base_url("t", 5, "ua", "not a url");
        assert!(matches!(result, Err(DiscordError::InvalidBaseUrl(_))));
    }
}
