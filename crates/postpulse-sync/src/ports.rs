//! Collaborator seams of the sync pipeline.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use postpulse_core::{EngagementUpdate, NewPost, PostDetails, PostRecord, TenantId};

use crate::error::{HistoryError, StoreError};

/// One chat message as seen by the crawler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: String,
    pub author: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Paged, newest-first access to a channel's message history.
#[async_trait]
pub trait ChatHistory: Send + Sync {
    /// Returns up to `limit` messages older than `before` (or the newest ones
    /// when `before` is `None`), newest first.
    async fn fetch_page(
        &self,
        channel_id: &str,
        limit: u8,
        before: Option<&str>,
    ) -> Result<Vec<ChatMessage>, HistoryError>;
}

/// Current engagement data for a post URL. `None` means "keep what you have".
#[async_trait]
pub trait EngagementLookup: Send + Sync {
    async fn lookup(&self, url: &str) -> Option<PostDetails>;
}

/// Tenant-scoped persistence for tracked posts.
///
/// Keyed operations must be atomic with respect to the unique `(tenant, url)` key.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn find_by_url(
        &self,
        tenant: &TenantId,
        url: &str,
    ) -> Result<Option<PostRecord>, StoreError>;

    /// Inserts a new post. Returns `None` if the URL is already tracked.
    async fn insert(
        &self,
        tenant: &TenantId,
        post: &NewPost,
    ) -> Result<Option<PostRecord>, StoreError>;

    async fn update_by_url(
        &self,
        tenant: &TenantId,
        url: &str,
        update: &EngagementUpdate,
    ) -> Result<PostRecord, StoreError>;

    /// Deletes posts with `week_index < threshold`; returns how many were removed.
    async fn delete_below_week(&self, tenant: &TenantId, threshold: i32)
        -> Result<u64, StoreError>;

    async fn list_distinct_week_indexes(&self, tenant: &TenantId) -> Result<Vec<i32>, StoreError>;
}
