//! Per-session mutual exclusion.
//!
//! `run` and `approve` hold a session's lock for the whole
//! load -> execute -> save window. A second caller does not queue behind a
//! long-running phase; it fails fast with `SessionBusy`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::OwnedMutexGuard;
use uuid::Uuid;

use crate::error::{EngineError, Result};

#[derive(Clone, Default)]
pub struct SessionLocks {
    inner: Arc<Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the session's lock without waiting. Contention means another
    /// call is mid-phase for this session.
    pub fn try_acquire(&self, id: Uuid) -> Result<OwnedMutexGuard<()>> {
        let lock = {
            let mut map = self
                .inner
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            Arc::clone(map.entry(id).or_default())
        };

        lock.try_lock_owned()
            .map_err(|_| EngineError::SessionBusy(id))
    }

    /// Drop the lock entry for a discarded session.
    pub fn remove(&self, id: Uuid) {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&id);
    }
}
