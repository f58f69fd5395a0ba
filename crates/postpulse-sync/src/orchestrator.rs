//! Crawl, enrich, upsert, prune.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use postpulse_core::{
    parse_post_id, source_message_id, week_boundaries, week_index, CandidateEntry,
    EngagementUpdate, MediaType, NewPost, TenantId,
};
use serde::Serialize;

use crate::crawler::HistoryCrawler;
use crate::error::{StoreError, SyncError};
use crate::ports::{ChatHistory, EngagementLookup, RecordStore};

/// Weeks kept behind the current one. Posts with
/// `week_index < current - RETENTION_WEEKS` are pruned after every sync.
pub const RETENTION_WEEKS: i32 = 2;

/// Totals of one sync. Only `synced_count` is part of the public contract;
/// the rest feeds logs and sync-run bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncOutcome {
    /// Posts inserted for the first time.
    pub synced_count: usize,
    pub updated: usize,
    /// Already-tracked posts whose lookup failed; left as stored.
    pub unchanged: usize,
    /// Links without a parseable post id.
    pub skipped: usize,
    /// Links whose store operation failed.
    pub failed: usize,
    pub pruned: u64,
    pub scanned_messages: usize,
    pub unique_links: usize,
    pub week_index: i32,
}

enum ItemOutcome {
    Inserted,
    Updated,
    Unchanged,
    Skipped,
    Failed,
}

/// Drives one sync of a channel into the record store.
pub struct SyncOrchestrator {
    store: Arc<dyn RecordStore>,
    lookup: Arc<dyn EngagementLookup>,
    crawler: HistoryCrawler,
    max_concurrent: usize,
}

impl SyncOrchestrator {
    #[must_use]
    pub fn new(
        store: Arc<dyn RecordStore>,
        lookup: Arc<dyn EngagementLookup>,
        max_concurrent: usize,
    ) -> Self {
        Self {
            store,
            lookup,
            crawler: HistoryCrawler::default(),
            max_concurrent: max_concurrent.max(1),
        }
    }

    #[must_use]
    pub fn with_crawler(mut self, crawler: HistoryCrawler) -> Self {
        self.crawler = crawler;
        self
    }

    /// Syncs `channel_id` for the week containing the current instant.
    ///
    /// # Errors
    ///
    /// See [`SyncOrchestrator::sync_at`].
    pub async fn sync(
        &self,
        tenant: &TenantId,
        channel_id: &str,
        history: &dyn ChatHistory,
    ) -> Result<SyncOutcome, SyncError> {
        self.sync_at(tenant, channel_id, history, Utc::now()).await
    }

    /// Syncs `channel_id` as if the current instant were `now`.
    ///
    /// Per-link failures are logged and counted; they never abort the sync.
    /// Work committed before a fatal error stays committed, and re-running is
    /// safe because every write is keyed by URL.
    ///
    /// # Errors
    ///
    /// - [`SyncError::History`] / [`SyncError::PaginationLimit`] if the crawl fails.
    /// - [`SyncError::Store`] if pruning fails.
    pub async fn sync_at(
        &self,
        tenant: &TenantId,
        channel_id: &str,
        history: &dyn ChatHistory,
        now: DateTime<Utc>,
    ) -> Result<SyncOutcome, SyncError> {
        let week = week_boundaries(now);
        let current_week = week_index(now);
        tracing::info!(
            tenant = %tenant,
            channel = channel_id,
            week = current_week,
            week_label = %week.label,
            "sync started"
        );

        let crawl = self.crawler.crawl(history, channel_id, week.start).await?;
        let unique = dedup_by_url(crawl.entries);

        let mut outcome = SyncOutcome {
            scanned_messages: crawl.scanned_messages,
            unique_links: unique.len(),
            week_index: current_week,
            ..SyncOutcome::default()
        };

        let results: Vec<ItemOutcome> = stream::iter(unique)
            .map(|entry| self.process_entry(tenant, entry))
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;

        for result in results {
            match result {
                ItemOutcome::Inserted => outcome.synced_count += 1,
                ItemOutcome::Updated => outcome.updated += 1,
                ItemOutcome::Unchanged => outcome.unchanged += 1,
                ItemOutcome::Skipped => outcome.skipped += 1,
                ItemOutcome::Failed => outcome.failed += 1,
            }
        }

        outcome.pruned = self
            .store
            .delete_below_week(tenant, current_week - RETENTION_WEEKS)
            .await?;

        tracing::info!(
            tenant = %tenant,
            channel = channel_id,
            scanned = outcome.scanned_messages,
            unique_links = outcome.unique_links,
            inserted = outcome.synced_count,
            updated = outcome.updated,
            unchanged = outcome.unchanged,
            skipped = outcome.skipped,
            failed = outcome.failed,
            pruned = outcome.pruned,
            "sync finished"
        );
        Ok(outcome)
    }

    async fn process_entry(&self, tenant: &TenantId, entry: CandidateEntry) -> ItemOutcome {
        let Some(post_id) = parse_post_id(&entry.url).map(ToString::to_string) else {
            tracing::warn!(url = %entry.url, "no post id in url; skipping");
            return ItemOutcome::Skipped;
        };

        let details = self.lookup.lookup(&entry.url).await;

        let existing = match self.store.find_by_url(tenant, &entry.url).await {
            Ok(existing) => existing,
            Err(e) => {
                log_store_failure(&entry.url, &e);
                return ItemOutcome::Failed;
            }
        };

        if existing.is_some() {
            let Some(details) = details else {
                return ItemOutcome::Unchanged;
            };
            let update = EngagementUpdate {
                author: details.author,
                content: details.content,
                media_type: details.media_type,
                view_count: details.view_count,
                like_count: details.like_count,
            };
            return self.update(tenant, &entry.url, &update).await;
        }

        let post = match details {
            Some(d) => NewPost {
                source_message_id: source_message_id(&entry.message_id, &entry.url),
                url: entry.url.clone(),
                post_id,
                author: d.author,
                content: d.content,
                media_type: d.media_type,
                view_count: d.view_count,
                like_count: d.like_count,
                week_index: week_index(d.posted_at),
                posted_at: d.posted_at,
            },
            None => NewPost {
                source_message_id: source_message_id(&entry.message_id, &entry.url),
                url: entry.url.clone(),
                post_id,
                author: entry.author,
                content: entry.content,
                media_type: MediaType::Text,
                view_count: 0,
                like_count: 0,
                week_index: week_index(entry.posted_at),
                posted_at: entry.posted_at,
            },
        };

        match self.store.insert(tenant, &post).await {
            Ok(Some(_)) => {
                tracing::debug!(url = %post.url, post_id = %post.post_id, week = post.week_index, "post inserted");
                ItemOutcome::Inserted
            }
            // Lost a race with a concurrent writer; fall through to an update.
            Ok(None) => {
                let update = EngagementUpdate {
                    author: post.author,
                    content: post.content,
                    media_type: post.media_type,
                    view_count: post.view_count,
                    like_count: post.like_count,
                };
                self.update(tenant, &post.url, &update).await
            }
            Err(e) => {
                log_store_failure(&post.url, &e);
                ItemOutcome::Failed
            }
        }
    }

    async fn update(&self, tenant: &TenantId, url: &str, update: &EngagementUpdate) -> ItemOutcome {
        match self.store.update_by_url(tenant, url, update).await {
            Ok(_) => ItemOutcome::Updated,
            Err(e) => {
                log_store_failure(url, &e);
                ItemOutcome::Failed
            }
        }
    }
}

fn log_store_failure(url: &str, err: &StoreError) {
    tracing::error!(url, error = %err, "store operation failed; skipping link");
}

/// Collapses entries sharing a URL. The last entry seen in scan order wins;
/// the position of the first occurrence is kept.
fn dedup_by_url(entries: Vec<CandidateEntry>) -> Vec<CandidateEntry> {
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut unique: Vec<CandidateEntry> = Vec::with_capacity(entries.len());
    for entry in entries {
        if let Some(&slot) = slots.get(&entry.url) {
            unique[slot] = entry;
        } else {
            slots.insert(entry.url.clone(), unique.len());
            unique.push(entry);
        }
    }
    unique
}
