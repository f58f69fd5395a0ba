use postpulse_db::DbError;
use postpulse_discord::DiscordError;
use postpulse_fxtwitter::FxTwitterError;
use thiserror::Error;

/// Failure of the chat-history provider. Always fatal to the sync.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error(transparent)]
    Discord(#[from] DiscordError),
}

/// Failure of a record-store operation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A stored row violates the post invariants. Logged, never coerced.
    #[error("corrupt stored record: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Db(#[from] DbError),
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Discord credentials not fully configured")]
    MissingCredentials,

    #[error("a sync is already running for channel {channel_id}")]
    AlreadyRunning { channel_id: String },

    #[error("chat history unavailable: {0}")]
    History(#[from] HistoryError),

    /// The crawl never reached the week boundary or the end of history.
    #[error("chat history did not end within {max_pages} pages")]
    PaginationLimit { max_pages: usize },

    #[error("record store failed: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error("engagement client setup failed: {0}")]
    LookupClient(#[from] FxTwitterError),
}

impl From<DiscordError> for SyncError {
    fn from(e: DiscordError) -> Self {
        Self::History(HistoryError::Discord(e))
    }
}
