//! The weekly sync pipeline.
//!
//! [`HistoryCrawler`] pages backward through a chat channel until it crosses
//! the current week's start, [`SyncOrchestrator`] enriches and upserts every
//! link it found and then prunes posts older than the retention horizon.
//! [`SyncService`] wires both to Postgres, Discord and fxtwitter and records
//! each invocation as a sync run.

mod adapters;
mod credentials;
mod crawler;
mod error;
mod guard;
mod orchestrator;
mod ports;
mod service;
#[cfg(test)]
mod testing;

pub use adapters::PgRecordStore;
pub use credentials::{load_channel_credentials, resolve_credentials, ChannelCredentials};
pub use crawler::{CrawlResult, HistoryCrawler, MAX_PAGES, PAGE_SIZE};
pub use error::{HistoryError, StoreError, SyncError};
pub use guard::{SyncGuard, SyncPermit};
pub use orchestrator::{SyncOrchestrator, SyncOutcome, RETENTION_WEEKS};
pub use ports::{ChatHistory, ChatMessage, EngagementLookup, RecordStore};
pub use service::{SyncReport, SyncService, SyncSettings};
