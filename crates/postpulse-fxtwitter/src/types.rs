//! Wire types for `GET /status/{id}`.
//!
//! Every tweet field is optional; missing values fall back to defaults when
//! converted into [`PostDetails`].

use chrono::{DateTime, Utc};
use postpulse_core::{MediaType, PostDetails};
use serde::Deserialize;

const UNKNOWN_AUTHOR: &str = "unknown";

/// Twitter's legacy timestamp layout, e.g. `Wed Oct 10 20:19:24 +0000 2018`.
const LEGACY_TIMESTAMP_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

#[derive(Debug, Deserialize)]
pub(crate) struct StatusEnvelope {
    pub code: i64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub tweet: Option<Tweet>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Tweet {
    #[serde(default)]
    pub author: Option<TweetAuthor>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub views: Option<u64>,
    #[serde(default)]
    pub likes: Option<u64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub created_timestamp: Option<i64>,
    #[serde(default)]
    pub media: Option<TweetMedia>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TweetAuthor {
    #[serde(default)]
    pub screen_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TweetMedia {
    #[serde(default)]
    pub videos: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub photos: Option<Vec<serde_json::Value>>,
}

impl Tweet {
    pub(crate) fn into_details(self, post_id: &str, now: DateTime<Utc>) -> PostDetails {
        let author = self
            .author
            .and_then(|a| a.screen_name)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());

        let posted_at = self
            .created_timestamp
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .or_else(|| self.created_at.as_deref().and_then(parse_created_at))
            .unwrap_or(now);

        let (has_video, has_photo) = self.media.map_or((false, false), |m| {
            (
                m.videos.is_some_and(|v| !v.is_empty()),
                m.photos.is_some_and(|p| !p.is_empty()),
            )
        });

        PostDetails {
            post_id: post_id.to_string(),
            author,
            content: self.text.unwrap_or_default(),
            view_count: self.views.unwrap_or(0),
            like_count: self.likes.unwrap_or(0),
            posted_at,
            media_type: MediaType::classify(has_video, has_photo),
        }
    }
}

fn parse_created_at(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(raw, LEGACY_TIMESTAMP_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
