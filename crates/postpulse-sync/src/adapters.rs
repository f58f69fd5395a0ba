//! Seam implementations over Postgres, Discord and fxtwitter.

use async_trait::async_trait;
use postpulse_core::{EngagementUpdate, NewPost, PostDetails, PostRecord, TenantId};
use postpulse_db::{DbError, PostRow};
use postpulse_discord::{DiscordSession, Message};
use postpulse_fxtwitter::FxTwitterClient;
use sqlx::PgPool;

use crate::error::{HistoryError, StoreError};
use crate::ports::{ChatHistory, ChatMessage, EngagementLookup, RecordStore};

// ---------------------------------------------------------------------------
// Record store
// ---------------------------------------------------------------------------

/// [`RecordStore`] backed by the `posts` table.
#[derive(Debug, Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn into_record(row: PostRow) -> Result<PostRecord, StoreError> {
    row.into_record().map_err(|e| match e {
        DbError::CorruptRow { .. } => {
            tracing::error!(error = %e, "stored post violates invariants");
            StoreError::Corrupt(e.to_string())
        }
        other => StoreError::Db(other),
    })
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn find_by_url(
        &self,
        tenant: &TenantId,
        url: &str,
    ) -> Result<Option<PostRecord>, StoreError> {
        postpulse_db::find_post_by_url(&self.pool, tenant, url)
            .await?
            .map(into_record)
            .transpose()
    }

    async fn insert(
        &self,
        tenant: &TenantId,
        post: &NewPost,
    ) -> Result<Option<PostRecord>, StoreError> {
        postpulse_db::insert_post(&self.pool, tenant, post)
            .await?
            .map(into_record)
            .transpose()
    }

    async fn update_by_url(
        &self,
        tenant: &TenantId,
        url: &str,
        update: &EngagementUpdate,
    ) -> Result<PostRecord, StoreError> {
        let row = postpulse_db::update_post_engagement(&self.pool, tenant, url, update).await?;
        into_record(row)
    }

    async fn delete_below_week(
        &self,
        tenant: &TenantId,
        threshold: i32,
    ) -> Result<u64, StoreError> {
        let removed = postpulse_db::delete_posts_before_week(&self.pool, tenant, threshold).await?;
        Ok(removed)
    }

    async fn list_distinct_week_indexes(&self, tenant: &TenantId) -> Result<Vec<i32>, StoreError> {
        let weeks = postpulse_db::list_distinct_week_indexes(&self.pool, tenant).await?;
        Ok(weeks)
    }
}

// ---------------------------------------------------------------------------
// Chat history
// ---------------------------------------------------------------------------

impl From<Message> for ChatMessage {
    fn from(message: Message) -> Self {
        Self {
            id: message.id,
            author: message.author.username,
            text: message.content,
            created_at: message.timestamp,
        }
    }
}

#[async_trait]
impl ChatHistory for DiscordSession {
    async fn fetch_page(
        &self,
        channel_id: &str,
        limit: u8,
        before: Option<&str>,
    ) -> Result<Vec<ChatMessage>, HistoryError> {
        let page = self.fetch_messages_page(channel_id, limit, before).await?;
        Ok(page.into_iter().map(ChatMessage::from).collect())
    }
}

// ---------------------------------------------------------------------------
// Engagement lookup
// ---------------------------------------------------------------------------

#[async_trait]
impl EngagementLookup for FxTwitterClient {
    async fn lookup(&self, url: &str) -> Option<PostDetails> {
        FxTwitterClient::lookup(self, url).await
    }
}
