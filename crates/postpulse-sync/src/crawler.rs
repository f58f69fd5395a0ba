use std::collections::HashSet;

use chrono::{DateTime, Utc};
use postpulse_core::{extract_post_urls, CandidateEntry};

use crate::error::SyncError;
use crate::ports::ChatHistory;

/// Messages requested per page.
pub const PAGE_SIZE: u8 = 100;

/// Hard stop for a crawl whose cursor never reaches the boundary.
pub const MAX_PAGES: usize = 1_000;

/// Unique candidate links found by one crawl.
#[derive(Debug, Clone, Default)]
pub struct CrawlResult {
    pub entries: Vec<CandidateEntry>,
    pub scanned_messages: usize,
    pub pages: usize,
}

/// Pages backward through a channel until the week boundary or the end of history.
#[derive(Debug, Clone, Copy)]
pub struct HistoryCrawler {
    page_size: u8,
    max_pages: usize,
}

impl Default for HistoryCrawler {
    fn default() -> Self {
        Self {
            page_size: PAGE_SIZE,
            max_pages: MAX_PAGES,
        }
    }
}

impl HistoryCrawler {
    #[must_use]
    pub fn with_limits(page_size: u8, max_pages: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            max_pages: max_pages.max(1),
        }
    }

    /// Collects every post link posted in `channel_id` since `week_start`.
    ///
    /// The page that crosses `week_start` is scanned in full, older messages
    /// included, and the crawl stops after it. A short page means the start of
    /// history. Entries are deduplicated by URL, author, content and timestamp,
    /// keeping first-seen order.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::History`] if any page fetch fails; links gathered
    /// from earlier pages are discarded. Returns [`SyncError::PaginationLimit`]
    /// if neither stop condition is met within the page limit.
    pub async fn crawl(
        &self,
        history: &dyn ChatHistory,
        channel_id: &str,
        week_start: DateTime<Utc>,
    ) -> Result<CrawlResult, SyncError> {
        let mut result = CrawlResult::default();
        let mut seen: HashSet<(String, String, String, DateTime<Utc>)> = HashSet::new();
        let mut before: Option<String> = None;

        while result.pages < self.max_pages {
            let page = history
                .fetch_page(channel_id, self.page_size, before.as_deref())
                .await?;
            result.pages += 1;
            result.scanned_messages += page.len();

            let mut reached_boundary = false;
            for message in &page {
                if message.created_at < week_start {
                    reached_boundary = true;
                }
                for url in extract_post_urls(&message.text) {
                    let entry = CandidateEntry {
                        message_id: message.id.clone(),
                        url,
                        author: message.author.clone(),
                        content: message.text.clone(),
                        posted_at: message.created_at,
                    };
                    let (url, author, content, posted_at) = entry.dedup_key();
                    let key = (url.to_owned(), author.to_owned(), content.to_owned(), posted_at);
                    if seen.insert(key) {
                        result.entries.push(entry);
                    }
                }
            }

            tracing::debug!(
                channel = channel_id,
                page = result.pages,
                messages = page.len(),
                reached_boundary,
                "crawled history page"
            );

            if reached_boundary || page.len() < usize::from(self.page_size) {
                return Ok(result);
            }
            before = page.last().map(|m| m.id.clone());
        }

        Err(SyncError::PaginationLimit {
            max_pages: self.max_pages,
        })
    }
}
