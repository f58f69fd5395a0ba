//! Production wiring of the pipeline with sync-run bookkeeping.

use std::sync::Arc;

use postpulse_core::{AppConfig, TenantId};
use postpulse_discord::DiscordClient;
use postpulse_fxtwitter::{FxTwitterClient, RetryPolicy};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::adapters::PgRecordStore;
use crate::credentials::{load_channel_credentials, ChannelCredentials};
use crate::error::SyncError;
use crate::guard::SyncGuard;
use crate::orchestrator::{SyncOrchestrator, SyncOutcome};

/// Outbound settings for the chat provider and per-link concurrency.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub discord_api_base: String,
    pub discord_timeout_secs: u64,
    pub user_agent: String,
    pub max_concurrent: usize,
}

impl SyncSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            discord_api_base: config.discord_api_base.clone(),
            discord_timeout_secs: config.discord_timeout_secs,
            user_agent: config.user_agent.clone(),
            max_concurrent: config.sync_max_concurrent_lookups,
        }
    }
}

/// Result of one recorded sync.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub run_public_id: Uuid,
    pub outcome: SyncOutcome,
}

/// Runs syncs for tenants against their configured channel.
///
/// Cheap to clone; clones share the in-flight guard.
#[derive(Clone)]
pub struct SyncService {
    pool: PgPool,
    orchestrator: Arc<SyncOrchestrator>,
    guard: SyncGuard,
    settings: SyncSettings,
}

impl SyncService {
    /// # Errors
    ///
    /// Returns [`SyncError::LookupClient`] if the engagement client cannot be built.
    pub fn new(pool: PgPool, config: &AppConfig) -> Result<Self, SyncError> {
        let retry = RetryPolicy {
            max_retries: config.lookup_max_retries,
            backoff_base_ms: config.lookup_backoff_ms,
        };
        let lookup = FxTwitterClient::with_base_url(
            config.lookup_timeout_secs,
            &config.user_agent,
            retry,
            &config.fxtwitter_api_base,
        )?;
        let settings = SyncSettings::from_app_config(config);
        let orchestrator = SyncOrchestrator::new(
            Arc::new(PgRecordStore::new(pool.clone())),
            Arc::new(lookup),
            settings.max_concurrent,
        );

        Ok(Self {
            pool,
            orchestrator: Arc::new(orchestrator),
            guard: SyncGuard::new(),
            settings,
        })
    }

    /// Syncs the tenant's configured channel and records the attempt in `sync_runs`.
    ///
    /// # Errors
    ///
    /// - [`SyncError::MissingCredentials`] if the tenant has no usable token or channel.
    /// - [`SyncError::AlreadyRunning`] if a sync for the same channel is in flight.
    /// - [`SyncError::History`] / [`SyncError::PaginationLimit`] if the crawl fails.
    /// - [`SyncError::Store`] / [`SyncError::Db`] on persistence failures.
    pub async fn run(
        &self,
        tenant: &TenantId,
        trigger_source: &str,
    ) -> Result<SyncReport, SyncError> {
        let credentials = load_channel_credentials(&self.pool, tenant).await?;
        let _permit = self.guard.try_acquire(tenant, &credentials.channel_id)?;

        let run = postpulse_db::create_sync_run(
            &self.pool,
            tenant,
            &credentials.channel_id,
            trigger_source,
        )
        .await?;

        let outcome = match self.sync_channel(tenant, &credentials).await {
            Ok(outcome) => outcome,
            Err(e) => {
                self.fail_run_best_effort(run.id, e.to_string()).await;
                return Err(e);
            }
        };

        let count = i32::try_from(outcome.synced_count).unwrap_or(i32::MAX);
        if let Err(e) = postpulse_db::complete_sync_run(&self.pool, run.id, count).await {
            self.fail_run_best_effort(run.id, e.to_string()).await;
            return Err(e.into());
        }

        Ok(SyncReport {
            run_public_id: run.public_id,
            outcome,
        })
    }

    async fn sync_channel(
        &self,
        tenant: &TenantId,
        credentials: &ChannelCredentials,
    ) -> Result<SyncOutcome, SyncError> {
        let client = DiscordClient::with_base_url(
            &credentials.token,
            self.settings.discord_timeout_secs,
            &self.settings.user_agent,
            &self.settings.discord_api_base,
        )?;
        let session = client.connect().await?;
        tracing::debug!(
            tenant = %tenant,
            bot = %session.user().username,
            channel = %credentials.channel_id,
            "discord session opened"
        );
        self.orchestrator
            .sync(tenant, &credentials.channel_id, &session)
            .await
    }

    async fn fail_run_best_effort(&self, run_id: i64, message: String) {
        if let Err(mark_err) = postpulse_db::fail_sync_run(&self.pool, run_id, &message).await {
            tracing::error!(run_id, error = %mark_err, "failed to mark sync run as failed");
        }
    }
}
