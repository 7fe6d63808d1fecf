//! Per-identity async locks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::domain::TaskId;

/// One async mutex per task identity, created on demand.
///
/// Entries no longer held by anyone are pruned whenever a new lock is taken.
#[derive(Default)]
pub struct KeyedLocks {
    inner: Mutex<HashMap<TaskId, Arc<AsyncMutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other holder has `id`, then hold it until the guard
    /// is dropped.
    pub async fn lock(&self, id: &TaskId) -> OwnedMutexGuard<()> {
        let mutex = {
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            map.retain(|_, m| Arc::strong_count(m) > 1);
            map.entry(id.clone()).or_default().clone()
        };
        mutex.lock_owned().await
    }

    /// Number of identities currently tracked.
    pub fn tracked(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
