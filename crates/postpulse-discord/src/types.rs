use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A channel message as returned by `GET /channels/{id}/messages`.
///
/// Only the fields the crawl needs are deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Message {
    pub id: String,
    #[serde(default)]
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub author: MessageAuthor,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MessageAuthor {
    pub username: String,
}

/// The authenticated bot account returned by `GET /users/@me`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BotUser {
    pub id: String,
    pub username: String,
}
