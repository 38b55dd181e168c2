use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;

use super::{SaveKey, SaveState};

/// How long a `saved` badge stays up before falling back to `idle`
pub const DEFAULT_REVERT_DELAY: Duration = Duration::from_millis(2000);

/// Names one save cycle of one key
///
/// Returned by `begin_save`; a newer `begin_save` on the same key makes older
/// tickets stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveTicket {
    key: SaveKey,
    cycle: u64,
}

impl SaveTicket {
    pub fn key(&self) -> &SaveKey {
        &self.key
    }
}

/// How a save cycle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    Failed,
}

#[derive(Debug, Default)]
struct KeyEntry {
    state: SaveState,
    cycle: u64,
    revert: Option<JoinHandle<()>>,
}

impl KeyEntry {
    fn cancel_revert(&mut self) {
        if let Some(handle) = self.revert.take() {
            handle.abort();
        }
    }
}

struct TrackerInner {
    entries: Mutex<HashMap<SaveKey, KeyEntry>>,
    next_cycle: AtomicU64,
    revert_delay: Duration,
}

impl TrackerInner {
    fn revert_to_idle(&self, key: &SaveKey, cycle: u64) {
        let mut entries = self.entries.lock();
        if let Some(entry) = entries.get_mut(key) {
            // A newer cycle owns the key now.
            if entry.cycle != cycle || entry.state != SaveState::Saved {
                return;
            }
            entry.state = SaveState::Idle;
            entry.revert = None;
            tracing::trace!(key = %key, "save state reverted to idle");
        }
    }
}

impl Drop for TrackerInner {
    fn drop(&mut self) {
        for entry in self.entries.get_mut().values_mut() {
            entry.cancel_revert();
        }
    }
}

/// Tracks the save lifecycle of many independent fields
///
/// Cloning is cheap and every clone observes the same state. Completing a save
/// spawns a tokio timer, so `complete_save` and `settle` should be called from
/// within a runtime; outside one the `saved` state simply stays until the next
/// transition.
#[derive(Clone)]
pub struct SaveStateTracker {
    inner: Arc<TrackerInner>,
}

impl SaveStateTracker {
    pub fn new(revert_delay: Duration) -> Self {
        Self {
            inner: Arc::new(TrackerInner {
                entries: Mutex::new(HashMap::new()),
                next_cycle: AtomicU64::new(1),
                revert_delay,
            }),
        }
    }

    pub fn revert_delay(&self) -> Duration {
        self.inner.revert_delay
    }

    /// Current state of a key, `Idle` when never seen
    pub fn state_of(&self, key: &SaveKey) -> SaveState {
        self.inner
            .entries
            .lock()
            .get(key)
            .map(|e| e.state)
            .unwrap_or_default()
    }

    /// Start a new save cycle, superseding whatever the key was doing
    pub fn begin_save(&self, key: &SaveKey) -> SaveTicket {
        let cycle = self.inner.next_cycle.fetch_add(1, Ordering::Relaxed);
        let mut entries = self.inner.entries.lock();
        let entry = entries.entry(key.clone()).or_default();
        entry.cancel_revert();
        entry.state = SaveState::Saving;
        entry.cycle = cycle;
        tracing::debug!(key = %key, cycle, "save started");
        SaveTicket {
            key: key.clone(),
            cycle,
        }
    }

    /// Mark the current cycle of a key as saved and schedule its revert to idle
    pub fn complete_save(&self, key: &SaveKey) {
        let mut entries = self.inner.entries.lock();
        let entry = entries.entry(key.clone()).or_default();
        self.mark_saved(key, entry);
    }

    /// Mark the current cycle of a key as failed; it stays failed until the next save
    pub fn fail_save(&self, key: &SaveKey) {
        let mut entries = self.inner.entries.lock();
        let entry = entries.entry(key.clone()).or_default();
        Self::mark_failed(key, entry);
    }

    /// Finish the cycle a ticket names
    ///
    /// Returns false, changing nothing, when a newer cycle has started for the key.
    pub fn settle(&self, ticket: &SaveTicket, outcome: SaveOutcome) -> bool {
        let mut entries = self.inner.entries.lock();
        let Some(entry) = entries.get_mut(&ticket.key) else {
            tracing::debug!(key = %ticket.key, "ignoring ticket for forgotten key");
            return false;
        };
        if entry.cycle != ticket.cycle {
            tracing::debug!(
                key = %ticket.key,
                ticket_cycle = ticket.cycle,
                current_cycle = entry.cycle,
                "ignoring superseded save result"
            );
            return false;
        }
        match outcome {
            SaveOutcome::Saved => self.mark_saved(&ticket.key, entry),
            SaveOutcome::Failed => Self::mark_failed(&ticket.key, entry),
        }
        true
    }

    /// Cancel every pending revert and forget all keys
    pub fn reset(&self) {
        let mut entries = self.inner.entries.lock();
        for entry in entries.values_mut() {
            entry.cancel_revert();
        }
        tracing::debug!(key_count = entries.len(), "clearing save states");
        entries.clear();
    }

    fn mark_saved(&self, key: &SaveKey, entry: &mut KeyEntry) {
        entry.cancel_revert();
        entry.state = SaveState::Saved;
        tracing::debug!(key = %key, cycle = entry.cycle, "save completed");
        entry.revert = self.schedule_revert(key.clone(), entry.cycle);
    }

    fn mark_failed(key: &SaveKey, entry: &mut KeyEntry) {
        entry.cancel_revert();
        entry.state = SaveState::Error;
        tracing::debug!(key = %key, cycle = entry.cycle, "save failed");
    }

    fn schedule_revert(&self, key: SaveKey, cycle: u64) -> Option<JoinHandle<()>> {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(key = %key, "no tokio runtime, saved state will not revert");
            return None;
        };
        let inner: Weak<TrackerInner> = Arc::downgrade(&self.inner);
        // Deadline is fixed now, not when the task first gets polled.
        let deadline = tokio::time::Instant::now() + self.inner.revert_delay;
        Some(runtime.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if let Some(inner) = inner.upgrade() {
                inner.revert_to_idle(&key, cycle);
            }
        }))
    }
}

impl Default for SaveStateTracker {
    fn default() -> Self {
        Self::new(DEFAULT_REVERT_DELAY)
    }
}
