//! Turn rotation and the per-session turn clock.
//!
//! A turn ends one of four ways: its timeout fires, the active player ends it,
//! the orchestrator forces it (player left), or an exhaustion guard ends it on
//! the player's behalf. Every path goes through [`TurnEngine::next_turn`] logic,
//! which bumps the turn number, hands the turn to the next player in the rotation,
//! and after the transition delay announces the new turn and arms its timeout.
//!
//! Timeout and transition share one timer slot per session, so a session never
//! has more than one pending turn timer.
use crate::errors::SessionError;
use crate::events::{EventBus, GameEvent};
use crate::store::SessionStore;
use crate::timers::TimerRegistry;
use std::sync::Arc;
use std::time::Duration;
use tactica_engine::errors::GameError;
use tactica_engine::player::PlayerId;
use tactica_engine::session::TurnState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnTimings {
    pub turn_duration: Duration,
    pub transition_delay: Duration,
    pub actions_per_turn: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EndCause {
    Rotation,
    Timeout,
    Manual,
    Forced,
}

#[derive(Clone)]
pub struct TurnEngine {
    inner: Arc<TurnEngineInner>,
}

struct TurnEngineInner {
    store: Arc<SessionStore>,
    events: Arc<EventBus>,
    timers: TimerRegistry,
    timings: TurnTimings,
}

/// The player after `current` in the rotation, wrapping at the end. An id that
/// is no longer in the rotation falls back to the first player.
pub fn next_player_id(turn_order: &[PlayerId], current: &str) -> Option<PlayerId> {
    let first = turn_order.first()?;
    match turn_order.iter().position(|id| id == current) {
        Some(idx) => Some(turn_order[(idx + 1) % turn_order.len()].clone()),
        None => {
            tracing::warn!(
                active_player_id = %current,
                fallback = %first,
                "active player missing from turn order, restarting rotation"
            );
            Some(first.clone())
        }
    }
}

impl TurnEngine {
    pub fn new(store: Arc<SessionStore>, events: Arc<EventBus>, timings: TurnTimings) -> Self {
        Self {
            inner: Arc::new(TurnEngineInner {
                store,
                events,
                timers: TimerRegistry::new("turn"),
                timings,
            }),
        }
    }

    pub fn timings(&self) -> TurnTimings {
        self.inner.timings
    }

    /// Makes the first player in the rotation active as turn 1, announces it
    /// and arms the turn timeout.
    pub fn start_first_turn(&self, session_id: &str, timeout: Duration) -> Result<TurnState, SessionError> {
        self.start(session_id, timeout, false)
    }

    /// Same as [`start_first_turn`](Self::start_first_turn) but refuses a
    /// session whose turns are already running.
    pub fn start_unstarted(&self, session_id: &str, timeout: Duration) -> Result<TurnState, SessionError> {
        self.start(session_id, timeout, true)
    }

    fn start(&self, session_id: &str, timeout: Duration, require_unstarted: bool) -> Result<TurnState, SessionError> {
        let actions = self.inner.timings.actions_per_turn;
        let turn = self.inner.store.update(session_id, |session| {
            if require_unstarted && session.has_started() {
                return Err(GameError::SessionAlreadyStarted);
            }
            let first = session
                .turn_order
                .first()
                .cloned()
                .ok_or(GameError::TurnOrderUndefined)?;
            session.player_mut(&first)?.reset_turn_budget(actions);
            let turn = TurnState::first(first);
            session.turn = Some(turn.clone());
            Ok(turn)
        })?;

        self.inner.timers.cancel(session_id);
        tracing::info!(
            session_id = %session_id,
            player_id = %turn.active_player_id,
            "first turn started"
        );
        self.inner.events.broadcast(
            session_id,
            GameEvent::TurnStarted {
                session_id: session_id.to_string(),
                turn_number: turn.turn_number,
                player_id: turn.active_player_id.clone(),
            },
        );
        self.arm_timeout(session_id, turn.turn_number, timeout);
        Ok(turn)
    }

    /// Advances to the next player: turn number + 1, `turn.ended` now,
    /// `turn.transition` and `turn.started` after the transition delay, then a
    /// fresh `timeout` for the new turn.
    pub fn next_turn(&self, session_id: &str, timeout: Duration) -> Result<TurnState, SessionError> {
        self.advance(session_id, timeout, None, EndCause::Rotation)?
            .ok_or_else(|| GameError::TurnOrderUndefined.into())
    }

    /// Ends the active turn at the player's request. Fails with
    /// `TurnNotStarted` while the transition into the turn is pending.
    pub fn end_turn_manual(&self, session_id: &str) -> Result<TurnState, SessionError> {
        self.advance(
            session_id,
            self.inner.timings.turn_duration,
            None,
            EndCause::Manual,
        )?
        .ok_or_else(|| GameError::TurnOrderUndefined.into())
    }

    /// Ends turn `turn_number` unless the session has already moved past it.
    /// Used by the exhaustion guards, which decide under one lock and act under
    /// another.
    pub fn end_turn_if_current(&self, session_id: &str, turn_number: u32) -> Result<Option<TurnState>, SessionError> {
        self.advance(
            session_id,
            self.inner.timings.turn_duration,
            Some(turn_number),
            EndCause::Manual,
        )
    }

    /// Ends the active turn on the orchestrator's behalf.
    pub fn force_end_turn(&self, session_id: &str) -> Result<TurnState, SessionError> {
        self.inner.timers.cancel(session_id);
        self.advance(
            session_id,
            self.inner.timings.turn_duration,
            None,
            EndCause::Forced,
        )?
        .ok_or_else(|| GameError::TurnOrderUndefined.into())
    }

    /// Cancels the pending timeout or transition without advancing.
    pub fn force_stop_timer(&self, session_id: &str) {
        if self.inner.timers.cancel(session_id) {
            tracing::debug!(session_id = %session_id, "turn timer stopped");
        }
    }

    pub fn has_pending_timer(&self, session_id: &str) -> bool {
        self.inner.timers.is_pending(session_id)
    }

    /// Sessions with a pending turn timer.
    pub fn pending_timers(&self) -> usize {
        self.inner.timers.pending()
    }

    pub fn shutdown(&self) {
        self.inner.timers.cancel_all();
    }

    fn advance(
        &self,
        session_id: &str,
        timeout: Duration,
        expected_turn: Option<u32>,
        cause: EndCause,
    ) -> Result<Option<TurnState>, SessionError> {
        let outcome = self.inner.store.update(session_id, |session| {
            let current = session.turn.clone().ok_or(GameError::TurnOrderUndefined)?;
            if expected_turn.is_some_and(|expected| expected != current.turn_number) {
                return Ok(Err("turn already advanced, nothing to end"));
            }
            if cause == EndCause::Timeout && session.combat.is_some() {
                // finish_combat rotates the turn
                return Ok(Err("combat running, timeout ignored"));
            }
            if cause == EndCause::Manual && !current.started {
                return Err(GameError::TurnNotStarted(current.turn_number));
            }
            let next_id = next_player_id(&session.turn_order, &current.active_player_id)
                .ok_or(GameError::TurnOrderUndefined)?;
            if let Some(outgoing) = session.players.get_mut(&current.active_player_id) {
                outgoing.movement_left = 0;
                outgoing.actions_left = 0;
            }
            let next = current.advance(next_id);
            session.turn = Some(next.clone());
            Ok(Ok((current, next)))
        })?;
        let (ended, next) = match outcome {
            Ok(turns) => turns,
            Err(reason) => {
                tracing::debug!(
                    session_id = %session_id,
                    expected_turn = ?expected_turn,
                    cause = ?cause,
                    "{}",
                    reason
                );
                return Ok(None);
            }
        };

        let ended_event = |turn: &TurnState| {
            let session_id = session_id.to_string();
            let turn_number = turn.turn_number;
            let player_id = turn.active_player_id.clone();
            match cause {
                EndCause::Timeout => Some(GameEvent::TurnTimeout {
                    session_id,
                    turn_number,
                    player_id,
                }),
                EndCause::Manual => Some(GameEvent::TurnManualEnd {
                    session_id,
                    turn_number,
                    player_id,
                }),
                EndCause::Forced => Some(GameEvent::TurnForcedEnd {
                    session_id,
                    turn_number,
                    player_id,
                }),
                EndCause::Rotation => None,
            }
        };
        if let Some(event) = ended_event(&ended) {
            self.inner.events.broadcast(session_id, event);
        }
        self.inner.events.broadcast(
            session_id,
            GameEvent::TurnEnded {
                session_id: session_id.to_string(),
                turn_number: ended.turn_number,
                player_id: ended.active_player_id.clone(),
            },
        );
        tracing::debug!(
            session_id = %session_id,
            ended_turn = ended.turn_number,
            cause = ?cause,
            next_player_id = %next.active_player_id,
            "turn ended"
        );

        self.arm_transition(session_id, next.turn_number, timeout);
        Ok(Some(next))
    }

    fn arm_transition(&self, session_id: &str, turn_number: u32, timeout: Duration) {
        let engine = self.clone();
        let sid = session_id.to_string();
        let delay = self.inner.timings.transition_delay;
        self.inner.timers.schedule(session_id, move |generation| async move {
            tokio::time::sleep(delay).await;
            if engine.inner.timers.claim(&sid, generation) {
                engine.begin_turn(&sid, turn_number, timeout);
            }
        });
    }

    fn begin_turn(&self, session_id: &str, turn_number: u32, timeout: Duration) {
        let actions = self.inner.timings.actions_per_turn;
        let started = self.inner.store.update(session_id, |session| {
            let Some(turn) = session.turn.clone() else {
                return Ok(None);
            };
            if turn.turn_number != turn_number {
                return Ok(None);
            }
            session
                .player_mut(&turn.active_player_id)?
                .reset_turn_budget(actions);
            if let Some(current) = session.turn.as_mut() {
                current.started = true;
            }
            Ok(Some(turn))
        });

        match started {
            Ok(Some(turn)) => {
                let player_id = turn.active_player_id;
                self.inner.events.broadcast(
                    session_id,
                    GameEvent::TurnTransition {
                        session_id: session_id.to_string(),
                        turn_number,
                        player_id: player_id.clone(),
                    },
                );
                self.inner.events.broadcast(
                    session_id,
                    GameEvent::TurnStarted {
                        session_id: session_id.to_string(),
                        turn_number,
                        player_id,
                    },
                );
                self.arm_timeout(session_id, turn_number, timeout);
            }
            Ok(None) => tracing::debug!(
                session_id = %session_id,
                turn_number,
                "transition outdated, turn not started"
            ),
            Err(err) => tracing::warn!(
                session_id = %session_id,
                turn_number,
                error = %err,
                "could not start turn after transition"
            ),
        }
    }

    fn arm_timeout(&self, session_id: &str, turn_number: u32, timeout: Duration) {
        let engine = self.clone();
        let sid = session_id.to_string();
        self.inner.timers.schedule(session_id, move |generation| async move {
            tokio::time::sleep(timeout).await;
            if !engine.inner.timers.claim(&sid, generation) {
                return;
            }
            tracing::info!(session_id = %sid, turn_number, "turn timed out");
            if let Err(err) = engine.advance(&sid, timeout, Some(turn_number), EndCause::Timeout) {
                tracing::warn!(
                    session_id = %sid,
                    turn_number,
                    error = %err,
                    "could not advance timed-out turn"
                );
            }
        });
    }
}
