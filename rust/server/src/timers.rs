//! Per-session timer bookkeeping shared by the turn clock, the combat loop and
//! the statistics purge.
//!
//! A registry holds at most one pending timer per session. Scheduling always
//! cancels the previous timer first, and every spawned task receives a
//! generation number: when it wakes up it must [`claim`](TimerRegistry::claim)
//! (one-shot timers) or check [`run_if_current`](TimerRegistry::run_if_current)
//! (repeating timers) before touching anything. A task whose generation was
//! superseded in the meantime does nothing, so an abort that races with a wake-up
//! can never fire a stale callback.
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tactica_engine::session::SessionId;
use tokio::task::JoinHandle;

pub type Generation = u64;

#[derive(Debug)]
struct TimerEntry {
    generation: Generation,
    handle: JoinHandle<()>,
}

#[derive(Debug)]
pub struct TimerRegistry {
    family: &'static str,
    entries: Mutex<HashMap<SessionId, TimerEntry>>,
    next_generation: AtomicU64,
}

impl TimerRegistry {
    pub fn new(family: &'static str) -> Self {
        Self {
            family,
            entries: Mutex::new(HashMap::new()),
            next_generation: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SessionId, TimerEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cancels the session's pending timer, then spawns `task` with a fresh
    /// generation. Must be called from within a Tokio runtime.
    pub fn schedule<F, Fut>(&self, session_id: &str, task: F) -> Generation
    where
        F: FnOnce(Generation) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed) + 1;
        let mut entries = self.lock();
        if let Some(previous) = entries.remove(session_id) {
            previous.handle.abort();
            tracing::trace!(
                session_id = %session_id,
                family = self.family,
                generation = previous.generation,
                "superseded pending timer"
            );
        }
        // The lock is held until the entry is inserted, so the new task cannot
        // observe the map before its own generation is registered.
        let handle = tokio::spawn(task(generation));
        entries.insert(session_id.to_string(), TimerEntry { generation, handle });
        generation
    }

    /// Takes ownership of a fired one-shot timer. Returns `false` when the
    /// timer was cancelled or replaced after it was scheduled.
    pub fn claim(&self, session_id: &str, generation: Generation) -> bool {
        let mut entries = self.lock();
        match entries.get(session_id) {
            Some(entry) if entry.generation == generation => {
                entries.remove(session_id);
                true
            }
            _ => false,
        }
    }

    /// Runs `f` while `generation` is still the session's registered timer.
    /// The registry stays locked during `f`, so a concurrent cancel waits for it.
    pub fn run_if_current(&self, session_id: &str, generation: Generation, f: impl FnOnce()) -> bool {
        let entries = self.lock();
        match entries.get(session_id) {
            Some(entry) if entry.generation == generation => {
                f();
                true
            }
            _ => false,
        }
    }

    /// Aborts the session's pending timer. Returns whether one existed.
    pub fn cancel(&self, session_id: &str) -> bool {
        let removed = self.lock().remove(session_id);
        match removed {
            Some(entry) => {
                entry.handle.abort();
                tracing::trace!(
                    session_id = %session_id,
                    family = self.family,
                    generation = entry.generation,
                    "cancelled timer"
                );
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&self) {
        let drained: Vec<_> = self.lock().drain().collect();
        for (_, entry) in drained {
            entry.handle.abort();
        }
    }

    pub fn is_pending(&self, session_id: &str) -> bool {
        self.lock().contains_key(session_id)
    }

    /// Number of sessions with a pending timer in this family.
    pub fn pending(&self) -> usize {
        self.lock().len()
    }
}
