use thiserror::Error;

/// Errors returned by the Discord client.
#[derive(Debug, Error)]
pub enum DiscordError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The bot token was rejected.
    #[error("Discord rejected the bot token")]
    Unauthorized,

    /// The channel does not exist or the bot cannot read it.
    #[error("channel {channel_id} is unavailable (HTTP {status})")]
    ChannelUnavailable { channel_id: String, status: u16 },

    #[error("Discord rate limit hit (retry after {retry_after:?}s)")]
    RateLimited { retry_after: Option<String> },

    #[error("unexpected HTTP {status} from Discord: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// Channel ids are numeric snowflakes.
    #[error("invalid channel id: {0:?}")]
    InvalidChannelId(String),

    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}
