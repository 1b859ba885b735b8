//! Per-resource-family mutual exclusion
//!
//! A few resource families (two-sided network peerings, most notably) are
//! modelled non-atomically by the remote API: two concurrent submissions can
//! corrupt remote state. Callers serialize the *entire* submit-and-poll
//! sequence for such a family through a named lock. The registry hands out
//! owned guards, so the lock is released on every exit path the moment the
//! guard drops.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of named locks, keyed by resource-family identifier
#[derive(Debug, Default)]
pub struct LockRegistry {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

/// Held lock for one resource family; dropping it releases the family
#[derive(Debug)]
pub struct FamilyLock {
    family: String,
    _guard: OwnedMutexGuard<()>,
}

impl FamilyLock {
    pub fn family(&self) -> &str {
        &self.family
    }
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for `family`, waiting if another sequence holds it.
    ///
    /// Locks for distinct families are independent; holding one never
    /// blocks another.
    pub async fn acquire(&self, family: &str) -> FamilyLock {
        let lock = {
            let mut locks = self.locks.lock().await;
            Arc::clone(
                locks
                    .entry(family.to_string())
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };

        FamilyLock {
            family: family.to_string(),
            _guard: lock.lock_owned().await,
        }
    }
}
