//! Registry of running stress processes.
//!
//! One entry per target, present from a successful start until the reaper
//! observes the process exit. All access goes through a single mutex that
//! is held for the map operation only, never across an `.await`.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cgstress_common::error::Result;
use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};

/// Reply channel for a kill request sent to a reaper.
pub(crate) type CancelReply = oneshot::Sender<Result<()>>;

/// Handle on a registered stress process.
#[derive(Debug, Clone)]
pub struct StressorHandle {
    pid: u32,
    started_at: DateTime<Utc>,
    cancel_tx: mpsc::Sender<CancelReply>,
}

impl StressorHandle {
    pub(crate) fn new(pid: u32, cancel_tx: mpsc::Sender<CancelReply>) -> Self {
        Self {
            pid,
            started_at: Utc::now(),
            cancel_tx,
        }
    }

    /// Pid of the stress process.
    #[must_use]
    pub const fn pid(&self) -> u32 {
        self.pid
    }

    /// When the process was registered.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub(crate) fn cancel_tx(&self) -> &mpsc::Sender<CancelReply> {
        &self.cancel_tx
    }
}

/// Snapshot of one running stress session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    /// Target identifier the session is registered under.
    pub target: String,
    /// Pid of the stress process.
    pub pid: u32,
    /// When the process was registered.
    pub started_at: DateTime<Utc>,
}

/// Shared target → stress process map.
#[derive(Debug, Clone, Default)]
pub struct StressorRegistry {
    inner: Arc<Mutex<HashMap<String, StressorHandle>>>,
}

impl StressorRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // no critical section can leave the map half-updated, so poisoning is ignored
    fn lock(&self) -> MutexGuard<'_, HashMap<String, StressorHandle>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns `true` if a stress process is registered for `target`.
    #[must_use]
    pub fn contains(&self, target: &str) -> bool {
        self.lock().contains_key(target)
    }

    /// Returns a clone of the handle registered for `target`.
    #[must_use]
    pub fn get(&self, target: &str) -> Option<StressorHandle> {
        self.lock().get(target).cloned()
    }

    /// Registers `handle` unless `target` already has an entry.
    ///
    /// Returns `false` and leaves the existing entry untouched on conflict.
    pub(crate) fn insert_if_absent(&self, target: &str, handle: StressorHandle) -> bool {
        match self.lock().entry(target.to_owned()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                let _ = slot.insert(handle);
                true
            }
        }
    }

    /// Removes the entry for `target` if it still refers to `pid`.
    pub(crate) fn remove_if_pid(&self, target: &str, pid: u32) -> bool {
        let mut map = self.lock();
        if map.get(target).is_some_and(|h| h.pid == pid) {
            let _ = map.remove(target);
            true
        } else {
            false
        }
    }

    /// Number of running stress sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if nothing is running.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Lists running sessions, ordered by target.
    #[must_use]
    pub fn sessions(&self) -> Vec<SessionInfo> {
        let mut sessions: Vec<SessionInfo> = self
            .lock()
            .iter()
            .map(|(target, handle)| SessionInfo {
                target: target.clone(),
                pid: handle.pid,
                started_at: handle.started_at,
            })
            .collect();
        sessions.sort_by(|a, b| a.target.cmp(&b.target));
        sessions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(pid: u32) -> StressorHandle {
        let (tx, _rx) = mpsc::channel(1);
        StressorHandle::new(pid, tx)
    }

    #[test]
    fn second_insert_for_same_target_is_rejected() {
        let registry = StressorRegistry::new();
        assert!(registry.insert_if_absent("docker://a", handle(10)));
        assert!(!registry.insert_if_absent("docker://a", handle(11)));
        assert_eq!(registry.get("docker://a").unwrap().pid(), 10);
    }

    #[test]
    fn remove_ignores_stale_pid() {
        let registry = StressorRegistry::new();
        assert!(registry.insert_if_absent("docker://a", handle(10)));
        assert!(!registry.remove_if_pid("docker://a", 99));
        assert!(registry.contains("docker://a"));
        assert!(registry.remove_if_pid("docker://a", 10));
        assert!(registry.is_empty());
    }

    #[test]
    fn clones_share_one_map() {
        let registry = StressorRegistry::new();
        let other = registry.clone();
        assert!(registry.insert_if_absent("docker://a", handle(10)));
        assert_eq!(other.len(), 1);
    }

    #[test]
    fn sessions_are_sorted_by_target() {
        let registry = StressorRegistry::new();
        assert!(registry.insert_if_absent("docker://b", handle(2)));
        assert!(registry.insert_if_absent("docker://a", handle(1)));
        let targets: Vec<_> = registry.sessions().into_iter().map(|s| s.target).collect();
        assert_eq!(targets, vec!["docker://a", "docker://b"]);
    }
}
