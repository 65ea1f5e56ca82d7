//! Combat round clock.
//!
//! While a combat runs, one task per session loops forever: wait one round,
//! then emit `combat.newRound`, `combat.timerLoop` and `combat.timerRestart`.
//! The loop only ends when the combat timer is stopped.
use crate::events::{EventBus, GameEvent};
use crate::timers::TimerRegistry;
use std::sync::Arc;
use std::time::Duration;
use tactica_engine::grid::TileEffect;

#[derive(Clone)]
pub struct CombatTimer {
    inner: Arc<CombatTimerInner>,
}

struct CombatTimerInner {
    events: Arc<EventBus>,
    timers: TimerRegistry,
    round: Duration,
}

impl CombatTimer {
    pub fn new(events: Arc<EventBus>, round: Duration) -> Self {
        Self {
            inner: Arc::new(CombatTimerInner {
                events,
                timers: TimerRegistry::new("combat"),
                round,
            }),
        }
    }

    /// Announces the combat and starts the round loop, replacing any loop
    /// already running for the session.
    pub fn start_combat_timer(
        &self,
        session_id: &str,
        attacker_id: &str,
        target_id: &str,
        attacker_tile_effect: Option<TileEffect>,
        target_tile_effect: Option<TileEffect>,
    ) {
        self.inner.events.broadcast(
            session_id,
            GameEvent::CombatStarted {
                session_id: session_id.to_string(),
                attacker_id: attacker_id.to_string(),
                target_id: target_id.to_string(),
                attacker_tile_effect,
                target_tile_effect,
            },
        );
        self.inner.events.broadcast(
            session_id,
            GameEvent::CombatTimerRestart {
                session_id: session_id.to_string(),
            },
        );
        tracing::info!(
            session_id = %session_id,
            attacker_id = %attacker_id,
            target_id = %target_id,
            "combat started"
        );
        self.spawn_loop(session_id);
    }

    /// Stops the round loop. Stopping an idle session is a no-op.
    pub fn stop_combat_timer(&self, session_id: &str) {
        if self.inner.timers.cancel(session_id) {
            tracing::debug!(session_id = %session_id, "combat timer stopped");
        }
    }

    /// Cuts the current round short: emits the round triad immediately and
    /// restarts the loop with a full round.
    pub fn force_next_loop(&self, session_id: &str) {
        self.inner.timers.cancel(session_id);
        emit_round(&self.inner.events, session_id);
        self.spawn_loop(session_id);
    }

    pub fn is_running(&self, session_id: &str) -> bool {
        self.inner.timers.is_pending(session_id)
    }

    /// Sessions with a running combat loop.
    pub fn pending_timers(&self) -> usize {
        self.inner.timers.pending()
    }

    pub fn shutdown(&self) {
        self.inner.timers.cancel_all();
    }

    fn spawn_loop(&self, session_id: &str) {
        let timer = self.clone();
        let sid = session_id.to_string();
        let round = self.inner.round;
        self.inner.timers.schedule(session_id, move |generation| async move {
            loop {
                tokio::time::sleep(round).await;
                let events = &timer.inner.events;
                let current = timer
                    .inner
                    .timers
                    .run_if_current(&sid, generation, || emit_round(events, &sid));
                if !current {
                    break;
                }
            }
        });
    }
}

fn emit_round(events: &EventBus, session_id: &str) {
    events.broadcast(
        session_id,
        GameEvent::CombatNewRound {
            session_id: session_id.to_string(),
        },
    );
    events.broadcast(
        session_id,
        GameEvent::CombatTimerLoop {
            session_id: session_id.to_string(),
        },
    );
    events.broadcast(
        session_id,
        GameEvent::CombatTimerRestart {
            session_id: session_id.to_string(),
        },
    );
}
