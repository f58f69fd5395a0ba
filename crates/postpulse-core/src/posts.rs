use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Content type of a tracked post.
///
/// `Thread` is a valid stored value but nothing currently classifies a post
/// as a thread; the engagement provider exposes no signal for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Video,
    Photo,
    Thread,
    Text,
}

impl MediaType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Photo => "photo",
            Self::Thread => "thread",
            Self::Text => "text",
        }
    }

    /// Video wins over photo; anything else is text.
    #[must_use]
    pub fn classify(has_video: bool, has_photo: bool) -> Self {
        if has_video {
            Self::Video
        } else if has_photo {
            Self::Photo
        } else {
            Self::Text
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "video" => Ok(Self::Video),
            "photo" => Ok(Self::Photo),
            "thread" => Ok(Self::Thread),
            "text" => Ok(Self::Text),
            other => Err(CoreError::InvalidMediaType(other.to_string())),
        }
    }
}

/// A post link found in chat history, before enrichment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateEntry {
    /// Chat message the link was found in.
    pub message_id: String,
    pub url: String,
    pub author: String,
    pub content: String,
    pub posted_at: DateTime<Utc>,
}

impl CandidateEntry {
    /// Identity used to collapse duplicate crawl results. The message id is
    /// deliberately excluded: a re-posted identical message is the same entry.
    #[must_use]
    pub fn dedup_key(&self) -> (&str, &str, &str, DateTime<Utc>) {
        (&self.url, &self.author, &self.content, self.posted_at)
    }
}

/// Authoritative post data returned by the engagement provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostDetails {
    pub post_id: String,
    pub author: String,
    pub content: String,
    pub view_count: u64,
    pub like_count: u64,
    pub posted_at: DateTime<Utc>,
    pub media_type: MediaType,
}

/// Insert payload for a post seen for the first time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub source_message_id: String,
    pub url: String,
    pub post_id: String,
    pub author: String,
    pub content: String,
    pub media_type: MediaType,
    pub view_count: u64,
    pub like_count: u64,
    pub posted_at: DateTime<Utc>,
    pub week_index: i32,
}

/// Mutable fields refreshed when an already-tracked URL is seen again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngagementUpdate {
    pub author: String,
    pub content: String,
    pub media_type: MediaType,
    pub view_count: u64,
    pub like_count: u64,
}

/// A stored post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostRecord {
    pub id: i64,
    pub source_message_id: String,
    pub url: String,
    pub post_id: String,
    pub author: String,
    pub content: String,
    pub media_type: MediaType,
    pub view_count: u64,
    pub like_count: u64,
    pub posted_at: DateTime<Utc>,
    pub collected_at: DateTime<Utc>,
    pub week_index: i32,
}

/// Builds the source identifier stored alongside a new post.
///
/// Keyed on the URL rather than the post id: one message may carry several
/// URL spellings of the same post, and each is tracked as its own record.
#[must_use]
pub fn source_message_id(message_id: &str, url: &str) -> String {
    format!("discord:{message_id}:{url}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostSort {
    Views,
    Likes,
    #[default]
    PostedAt,
}

impl FromStr for PostSort {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "views" => Ok(Self::Views),
            "likes" => Ok(Self::Likes),
            "posted_at" | "postedAt" => Ok(Self::PostedAt),
            other => Err(CoreError::InvalidSort(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortOrder {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(CoreError::InvalidOrder(s.to_string())),
        }
    }
}
