use crate::errors::SessionError;
use crate::store::SessionStore;
use crate::timers::TimerRegistry;
use crate::tracking::TrackingStore;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tactica_engine::session::SessionId;
use tactica_engine::statistics::{self, GameStatistics};
use tactica_engine::tracker::GameTracker;

/// Computes end-of-game reports and keeps each one readable for the
/// retention window. Readers share the stored report; it is never recomputed.
#[derive(Clone)]
pub struct StatisticsService {
    inner: Arc<StatisticsInner>,
}

struct StatisticsInner {
    store: Arc<SessionStore>,
    tracking: Arc<TrackingStore>,
    reports: RwLock<HashMap<SessionId, StoredReport>>,
    purges: TimerRegistry,
    retention: Duration,
}

#[derive(Debug, Clone)]
struct StoredReport {
    statistics: Arc<GameStatistics>,
    created_at: DateTime<Utc>,
}

impl StatisticsService {
    pub fn new(store: Arc<SessionStore>, tracking: Arc<TrackingStore>, retention: Duration) -> Self {
        Self {
            inner: Arc::new(StatisticsInner {
                store,
                tracking,
                reports: RwLock::new(HashMap::new()),
                purges: TimerRegistry::new("statistics"),
                retention,
            }),
        }
    }

    /// Builds the report from the session's tracker and current state, stores
    /// it, and discards the tracker. A session that was never tracked gets a
    /// report with zeroed tracking figures.
    pub fn finalize(&self, session_id: &str) -> Result<Arc<GameStatistics>, SessionError> {
        self.finalize_at(session_id, Utc::now())
    }

    pub fn finalize_at(&self, session_id: &str, now: DateTime<Utc>) -> Result<Arc<GameStatistics>, SessionError> {
        let session = self.inner.store.snapshot(session_id)?;
        let tracker = self.inner.tracking.take(session_id).unwrap_or_else(|| {
            tracing::warn!(session_id = %session_id, "finalizing without a tracker");
            GameTracker::default()
        });
        let report = Arc::new(statistics::compute(&session, &tracker, now));

        {
            let mut guard = self
                .inner
                .reports
                .write()
                .map_err(|_| SessionError::StoragePoisoned)?;
            guard.insert(
                session_id.to_string(),
                StoredReport {
                    statistics: Arc::clone(&report),
                    created_at: now,
                },
            );
        }
        self.schedule_purge(session_id);

        tracing::info!(
            session_id = %session_id,
            winner_id = ?report.winner_id,
            total_turns = report.global.total_turns,
            duration = %report.global.duration,
            "game statistics finalized"
        );
        Ok(report)
    }

    /// The stored report, or `None` once it was purged (or never existed).
    pub fn get(&self, session_id: &str) -> Option<Arc<GameStatistics>> {
        let guard = self
            .inner
            .reports
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        guard.get(session_id).map(|r| Arc::clone(&r.statistics))
    }

    pub fn created_at(&self, session_id: &str) -> Option<DateTime<Utc>> {
        let guard = self
            .inner
            .reports
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        guard.get(session_id).map(|r| r.created_at)
    }

    pub fn stored_reports(&self) -> usize {
        self.inner
            .reports
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn shutdown(&self) {
        self.inner.purges.cancel_all();
    }

    fn schedule_purge(&self, session_id: &str) {
        let service = self.clone();
        let sid = session_id.to_string();
        let retention = self.inner.retention;
        self.inner.purges.schedule(session_id, move |generation| async move {
            tokio::time::sleep(retention).await;
            if !service.inner.purges.claim(&sid, generation) {
                return;
            }
            let removed = service
                .inner
                .reports
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&sid);
            if removed.is_some() {
                tracing::debug!(session_id = %sid, "statistics purged");
            }
        });
    }
}
