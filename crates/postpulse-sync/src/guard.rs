use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use postpulse_core::TenantId;

use crate::error::SyncError;

/// Tracks which `(tenant, channel)` pairs have a sync in flight.
#[derive(Debug, Clone, Default)]
pub struct SyncGuard {
    active: Arc<Mutex<HashSet<String>>>,
}

/// Held for the duration of one sync; releases its slot on drop.
#[derive(Debug)]
pub struct SyncPermit {
    active: Arc<Mutex<HashSet<String>>>,
    key: String,
}

impl SyncGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the slot for `channel_id` under `tenant`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::AlreadyRunning`] if a permit for the same pair is alive.
    pub fn try_acquire(&self, tenant: &TenantId, channel_id: &str) -> Result<SyncPermit, SyncError> {
        let key = format!("{tenant}/{channel_id}");
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if !active.insert(key.clone()) {
            return Err(SyncError::AlreadyRunning {
                channel_id: channel_id.to_string(),
            });
        }
        Ok(SyncPermit {
            active: Arc::clone(&self.active),
            key,
        })
    }

    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Drop for SyncPermit {
    fn drop(&mut self) {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}
