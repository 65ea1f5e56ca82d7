use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tactica_engine::definition::TrackerTotals;
use tactica_engine::grid::Coordinate;
use tactica_engine::session::SessionId;
use tactica_engine::tracker::GameTracker;

/// One [`GameTracker`] per running session.
///
/// Recording calls never fail: an event for a session without a tracker
/// (already finalized, or never initialized) is ignored.
#[derive(Debug, Default)]
pub struct TrackingStore {
    trackers: RwLock<HashMap<SessionId, GameTracker>>,
}

impl TrackingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a fresh tracker, replacing any previous one for the session.
    pub fn initialize(&self, session_id: &str, totals: TrackerTotals) {
        let mut guard = self
            .trackers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        guard.insert(session_id.to_string(), GameTracker::new(totals));
    }

    fn with_tracker(&self, session_id: &str, f: impl FnOnce(&mut GameTracker)) {
        let mut guard = self
            .trackers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        match guard.get_mut(session_id) {
            Some(tracker) => f(tracker),
            None => tracing::trace!(session_id = %session_id, "no tracker for session"),
        }
    }

    pub fn track_tile_visited(&self, session_id: &str, player_id: &str, at: &Coordinate) {
        self.with_tracker(session_id, |t| t.tile_visited(player_id, at));
    }

    pub fn track_teleportation(&self, session_id: &str) {
        self.with_tracker(session_id, |t| t.teleported());
    }

    pub fn track_door_toggled(&self, session_id: &str, at: &Coordinate) {
        self.with_tracker(session_id, |t| t.door_toggled(at));
    }

    pub fn track_sanctuary_used(&self, session_id: &str, at: &Coordinate) {
        self.with_tracker(session_id, |t| t.sanctuary_used(at));
    }

    pub fn track_flag_holder(&self, session_id: &str, player_id: &str) {
        self.with_tracker(session_id, |t| t.flag_held_by(player_id));
    }

    pub fn track_damage(&self, session_id: &str, attacker_id: &str, defender_id: &str, amount: u32) {
        self.with_tracker(session_id, |t| {
            t.damage_dealt(attacker_id, amount);
            t.damage_received(defender_id, amount);
        });
    }

    pub fn snapshot(&self, session_id: &str) -> Option<GameTracker> {
        let guard = self
            .trackers
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        guard.get(session_id).cloned()
    }

    /// Removes and returns the session's tracker.
    pub fn take(&self, session_id: &str) -> Option<GameTracker> {
        let mut guard = self
            .trackers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        guard.remove(session_id)
    }

    pub fn discard(&self, session_id: &str) {
        self.take(session_id);
    }

    pub fn is_tracking(&self, session_id: &str) -> bool {
        let guard = self
            .trackers
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        guard.contains_key(session_id)
    }
}
