//! In-memory fakes for the pipeline seams.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use postpulse_core::{EngagementUpdate, NewPost, PostDetails, PostRecord, TenantId};
use postpulse_db::DbError;
use postpulse_discord::DiscordError;

use crate::error::{HistoryError, StoreError};
use crate::ports::{ChatHistory, ChatMessage, EngagementLookup, RecordStore};

pub(crate) fn at(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339)
        .expect("valid timestamp")
        .with_timezone(&Utc)
}

pub(crate) fn message(id: &str, author: &str, text: &str, created_at: DateTime<Utc>) -> ChatMessage {
    ChatMessage {
        id: id.to_string(),
        author: author.to_string(),
        text: text.to_string(),
        created_at,
    }
}

// ---------------------------------------------------------------------------
// Chat history
// ---------------------------------------------------------------------------

/// Serves `messages` (newest first) in pages and records each `before` cursor.
pub(crate) struct FakeHistory {
    messages: Vec<ChatMessage>,
    fail_on_call: Option<usize>,
    calls: Mutex<Vec<Option<String>>>,
}

impl FakeHistory {
    pub(crate) fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            fail_on_call: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Makes the n-th fetch (1-based) fail.
    pub(crate) fn failing_on_call(mut self, call: usize) -> Self {
        self.fail_on_call = Some(call);
        self
    }

    pub(crate) fn calls(&self) -> Vec<Option<String>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatHistory for FakeHistory {
    async fn fetch_page(
        &self,
        _channel_id: &str,
        limit: u8,
        before: Option<&str>,
    ) -> Result<Vec<ChatMessage>, HistoryError> {
        let call_no = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(before.map(ToString::to_string));
            calls.len()
        };
        if self.fail_on_call == Some(call_no) {
            return Err(HistoryError::Discord(DiscordError::Unauthorized));
        }

        let start = match before {
            Some(id) => self
                .messages
                .iter()
                .position(|m| m.id == id)
                .map_or(self.messages.len(), |p| p + 1),
            None => 0,
        };
        Ok(self
            .messages
            .iter()
            .skip(start)
            .take(usize::from(limit))
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Engagement lookup
// ---------------------------------------------------------------------------

/// Returns canned details per URL; unknown URLs look up as `None`.
#[derive(Default)]
pub(crate) struct FakeLookup {
    details: HashMap<String, PostDetails>,
    calls: Mutex<Vec<String>>,
}

impl FakeLookup {
    pub(crate) fn with(mut self, url: &str, details: PostDetails) -> Self {
        self.details.insert(url.to_string(), details);
        self
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl EngagementLookup for FakeLookup {
    async fn lookup(&self, url: &str) -> Option<PostDetails> {
        self.calls.lock().unwrap().push(url.to_string());
        self.details.get(url).cloned()
    }
}

// ---------------------------------------------------------------------------
// Record store
// ---------------------------------------------------------------------------

/// Keeps posts per `(tenant, url)` and rejects a second `(tenant, source_message_id)`
/// like the `posts` unique constraints do. Can be told to fail writes for chosen URLs.
#[derive(Default)]
pub(crate) struct MemoryStore {
    posts: Mutex<HashMap<(String, String), PostRecord>>,
    next_id: Mutex<i64>,
    failing_urls: Vec<String>,
}

impl MemoryStore {
    pub(crate) fn failing_for(mut self, url: &str) -> Self {
        self.failing_urls.push(url.to_string());
        self
    }

    pub(crate) fn seed(&self, tenant: &TenantId, record: PostRecord) {
        self.posts
            .lock()
            .unwrap()
            .insert((tenant.to_string(), record.url.clone()), record);
    }

    pub(crate) fn get(&self, tenant: &TenantId, url: &str) -> Option<PostRecord> {
        self.posts
            .lock()
            .unwrap()
            .get(&(tenant.to_string(), url.to_string()))
            .cloned()
    }

    pub(crate) fn len(&self) -> usize {
        self.posts.lock().unwrap().len()
    }

    fn check(&self, url: &str) -> Result<(), StoreError> {
        if self.failing_urls.iter().any(|u| u == url) {
            return Err(StoreError::Db(DbError::NotFound));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn find_by_url(
        &self,
        tenant: &TenantId,
        url: &str,
    ) -> Result<Option<PostRecord>, StoreError> {
        Ok(self.get(tenant, url))
    }

    async fn insert(
        &self,
        tenant: &TenantId,
        post: &NewPost,
    ) -> Result<Option<PostRecord>, StoreError> {
        self.check(&post.url)?;
        let key = (tenant.to_string(), post.url.clone());
        let mut posts = self.posts.lock().unwrap();
        if posts.contains_key(&key) {
            return Ok(None);
        }
        if posts.iter().any(|((t, _), r)| {
            t == tenant.as_str() && r.source_message_id == post.source_message_id
        }) {
            return Err(StoreError::Db(DbError::Sqlx(sqlx::Error::Protocol(format!(
                "duplicate key value violates unique constraint \"posts_tenant_source_message_key\": {}",
                post.source_message_id
            )))));
        }
        let id = {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            *next
        };
        let record = PostRecord {
            id,
            source_message_id: post.source_message_id.clone(),
            url: post.url.clone(),
            post_id: post.post_id.clone(),
            author: post.author.clone(),
            content: post.content.clone(),
            media_type: post.media_type,
            view_count: post.view_count,
            like_count: post.like_count,
            posted_at: post.posted_at,
            collected_at: Utc::now(),
            week_index: post.week_index,
        };
        posts.insert(key, record.clone());
        Ok(Some(record))
    }

    async fn update_by_url(
        &self,
        tenant: &TenantId,
        url: &str,
        update: &EngagementUpdate,
    ) -> Result<PostRecord, StoreError> {
        self.check(url)?;
        let mut posts = self.posts.lock().unwrap();
        let record = posts
            .get_mut(&(tenant.to_string(), url.to_string()))
            .ok_or(StoreError::Db(DbError::NotFound))?;
        record.author.clone_from(&update.author);
        record.content.clone_from(&update.content);
        record.media_type = update.media_type;
        record.view_count = update.view_count;
        record.like_count = update.like_count;
        Ok(record.clone())
    }

    async fn delete_below_week(
        &self,
        tenant: &TenantId,
        threshold: i32,
    ) -> Result<u64, StoreError> {
        let mut posts = self.posts.lock().unwrap();
        let before = posts.len();
        posts.retain(|(t, _), r| t != tenant.as_str() || r.week_index >= threshold);
        Ok(u64::try_from(before - posts.len()).unwrap())
    }

    async fn list_distinct_week_indexes(&self, tenant: &TenantId) -> Result<Vec<i32>, StoreError> {
        let posts = self.posts.lock().unwrap();
        let mut weeks: Vec<i32> = posts
            .iter()
            .filter(|((t, _), _)| t == tenant.as_str())
            .map(|(_, r)| r.week_index)
            .collect();
        weeks.sort_unstable_by(|a, b| b.cmp(a));
        weeks.dedup();
        Ok(weeks)
    }
}
