use thiserror::Error;

/// Errors raised while fetching a status from the engagement provider.
#[derive(Debug, Error)]
pub enum FxTwitterError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned HTTP {status}")]
    Status { status: u16 },

    /// The JSON envelope carried a `code` other than 200.
    #[error("provider error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("provider response has no tweet")]
    MissingTweet,

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
