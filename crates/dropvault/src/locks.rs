//! Per-path advisory locks.
//!
//! Stores take the lock for the directory or record they are about to
//! check-then-mutate, so that within one process two requests touching the
//! same mailbox, catalog or table list run one after the other. Locks are
//! advisory: other processes sharing the data dir are not excluded, and the
//! stores stay correct for them by relying on atomic filesystem operations.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::lock_api::ArcMutexGuard;
use parking_lot::{Mutex, RawMutex};

/// Number of entries at which idle locks are dropped from the table.
const PRUNE_THRESHOLD: usize = 1024;

/// Guard for one held path lock. Released on drop.
pub type PathGuard = ArcMutexGuard<RawMutex, ()>;

/// A table of mutexes keyed by filesystem path.
#[derive(Default)]
pub struct PathLocks {
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl PathLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until the lock for `path` is held.
    pub fn lock(&self, path: &Path) -> PathGuard {
        let entry = {
            let mut locks = self.locks.lock();
            if locks.len() >= PRUNE_THRESHOLD {
                // An entry referenced only by the table has no holder and no waiter.
                locks.retain(|_, m| Arc::strong_count(m) > 1);
            }
            Arc::clone(locks.entry(path.to_path_buf()).or_default())
        };
        entry.lock_arc()
    }

    /// Number of paths currently tracked.
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
