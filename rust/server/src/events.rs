//! Per-session fan-out of [`GameEvent`]s.
//!
//! Each subscriber owns a bounded queue. Publishing never waits: a
//! subscriber whose queue is full or whose receiver is gone is unsubscribed
//! on the spot and gets nothing further.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tactica_engine::grid::{Coordinate, TileEffect};
use tactica_engine::player::PlayerId;
use tactica_engine::session::SessionId;
use tactica_engine::statistics::GameStatistics;
use tokio::sync::mpsc;

/// Events a subscriber may have queued and unread.
const SUBSCRIBER_QUEUE_CAPACITY: usize = 1000;

pub type EventSender = mpsc::Sender<GameEvent>;
pub type EventReceiver = mpsc::Receiver<GameEvent>;

/// A live subscription. Dropping it unsubscribes.
pub struct EventSubscription {
    bus: EventBus,
    session_id: SessionId,
    subscriber_id: usize,
    pub receiver: EventReceiver,
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        self.bus.unsubscribe(&self.session_id, self.subscriber_id);
    }
}

#[derive(Debug)]
struct Subscriber {
    id: usize,
    queue: EventSender,
}

type SubscriberTable = HashMap<SessionId, Vec<Subscriber>>;

#[derive(Debug, Clone, Default)]
pub struct EventBus {
    inner: Arc<BusState>,
}

#[derive(Debug, Default)]
struct BusState {
    sessions: RwLock<SubscriberTable>,
    last_id: AtomicUsize,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, session_id: impl Into<SessionId>) -> EventSubscription {
        let session_id = session_id.into();
        let (subscriber_id, receiver) = self.register(&session_id);
        EventSubscription {
            bus: self.clone(),
            session_id,
            subscriber_id,
            receiver,
        }
    }

    fn register(&self, session_id: &str) -> (usize, EventReceiver) {
        let (queue, receiver) = mpsc::channel(SUBSCRIBER_QUEUE_CAPACITY);
        let id = self.inner.last_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.write()
            .entry(session_id.to_string())
            .or_default()
            .push(Subscriber { id, queue });
        tracing::info!(session_id = %session_id, subscriber_id = id, "event subscriber added");
        (id, receiver)
    }

    /// Queues `event` for every subscriber of `session_id`.
    pub fn broadcast(&self, session_id: &str, event: GameEvent) {
        tracing::debug!(
            session_id = %session_id,
            event_type = event.kind(),
            "broadcasting game event"
        );

        let lagging: Vec<usize> = {
            let sessions = self.read();
            let Some(subscribers) = sessions.get(session_id) else {
                return;
            };
            subscribers
                .iter()
                .filter(|s| s.queue.try_send(event.clone()).is_err())
                .map(|s| s.id)
                .collect()
        };

        for id in &lagging {
            tracing::warn!(
                session_id = %session_id,
                subscriber_id = id,
                event_type = event.kind(),
                "subscriber queue full or closed, unsubscribing"
            );
        }
        if !lagging.is_empty() {
            self.prune(session_id, &lagging);
        }
    }

    pub fn unsubscribe(&self, session_id: &str, subscriber_id: usize) {
        self.prune(session_id, &[subscriber_id]);
    }

    /// Forgets every subscriber of a removed session.
    pub fn drop_session(&self, session_id: &str) {
        self.write().remove(session_id);
    }

    pub fn subscriber_count(&self) -> usize {
        self.read().values().map(Vec::len).sum()
    }

    fn prune(&self, session_id: &str, ids: &[usize]) {
        let mut sessions = self.write();
        let emptied = match sessions.get_mut(session_id) {
            Some(subscribers) => {
                subscribers.retain(|s| !ids.contains(&s.id));
                subscribers.is_empty()
            }
            None => false,
        };
        if emptied {
            sessions.remove(session_id);
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, SubscriberTable> {
        self.inner.sessions.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SubscriberTable> {
        self.inner.sessions.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Domain events published per session. The serialized `type` tag is the
/// dotted event name (`turn.started`, `combat.newRound`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GameEvent {
    #[serde(rename = "turn.started")]
    TurnStarted {
        session_id: SessionId,
        turn_number: u32,
        player_id: PlayerId,
    },
    #[serde(rename = "turn.ended")]
    TurnEnded {
        session_id: SessionId,
        turn_number: u32,
        player_id: PlayerId,
    },
    #[serde(rename = "turn.timeout")]
    TurnTimeout {
        session_id: SessionId,
        turn_number: u32,
        player_id: PlayerId,
    },
    #[serde(rename = "turn.transition")]
    TurnTransition {
        session_id: SessionId,
        turn_number: u32,
        player_id: PlayerId,
    },
    #[serde(rename = "turn.manualEnd")]
    TurnManualEnd {
        session_id: SessionId,
        turn_number: u32,
        player_id: PlayerId,
    },
    #[serde(rename = "turn.forcedEnd")]
    TurnForcedEnd {
        session_id: SessionId,
        turn_number: u32,
        player_id: PlayerId,
    },
    /// Tile effects are always present in the payload, `null` when absent.
    #[serde(rename = "combat.started")]
    CombatStarted {
        session_id: SessionId,
        attacker_id: PlayerId,
        target_id: PlayerId,
        attacker_tile_effect: Option<TileEffect>,
        target_tile_effect: Option<TileEffect>,
    },
    #[serde(rename = "combat.newRound")]
    CombatNewRound { session_id: SessionId },
    #[serde(rename = "combat.timerLoop")]
    CombatTimerLoop { session_id: SessionId },
    #[serde(rename = "combat.timerRestart")]
    CombatTimerRestart { session_id: SessionId },
    /// Both ids are `None` for a draw.
    #[serde(rename = "combat.ended")]
    CombatEnded {
        session_id: SessionId,
        winner_id: Option<PlayerId>,
        loser_id: Option<PlayerId>,
    },
    #[serde(rename = "player.moved")]
    PlayerMoved {
        session_id: SessionId,
        player_id: PlayerId,
        from: Coordinate,
        to: Coordinate,
    },
    #[serde(rename = "door.toggled")]
    DoorToggled {
        session_id: SessionId,
        player_id: PlayerId,
        at: Coordinate,
        open: bool,
    },
    #[serde(rename = "sanctuary.used")]
    SanctuaryUsed {
        session_id: SessionId,
        player_id: PlayerId,
        at: Coordinate,
    },
    #[serde(rename = "player.teleported")]
    PlayerTeleported {
        session_id: SessionId,
        player_id: PlayerId,
        from: Coordinate,
        to: Coordinate,
    },
    #[serde(rename = "player.left")]
    PlayerLeft {
        session_id: SessionId,
        player_id: PlayerId,
    },
    #[serde(rename = "game.ended")]
    GameEnded {
        session_id: SessionId,
        statistics: GameStatistics,
    },
}

impl GameEvent {
    /// Dotted event name, identical to the serialized `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            GameEvent::TurnStarted { .. } => "turn.started",
            GameEvent::TurnEnded { .. } => "turn.ended",
            GameEvent::TurnTimeout { .. } => "turn.timeout",
            GameEvent::TurnTransition { .. } => "turn.transition",
            GameEvent::TurnManualEnd { .. } => "turn.manualEnd",
            GameEvent::TurnForcedEnd { .. } => "turn.forcedEnd",
            GameEvent::CombatStarted { .. } => "combat.started",
            GameEvent::CombatNewRound { .. } => "combat.newRound",
            GameEvent::CombatTimerLoop { .. } => "combat.timerLoop",
            GameEvent::CombatTimerRestart { .. } => "combat.timerRestart",
            GameEvent::CombatEnded { .. } => "combat.ended",
            GameEvent::PlayerMoved { .. } => "player.moved",
            GameEvent::DoorToggled { .. } => "door.toggled",
            GameEvent::SanctuaryUsed { .. } => "sanctuary.used",
            GameEvent::PlayerTeleported { .. } => "player.teleported",
            GameEvent::PlayerLeft { .. } => "player.left",
            GameEvent::GameEnded { .. } => "game.ended",
        }
    }

    pub fn session_id(&self) -> &str {
        match self {
            GameEvent::TurnStarted { session_id, .. }
            | GameEvent::TurnEnded { session_id, .. }
            | GameEvent::TurnTimeout { session_id, .. }
            | GameEvent::TurnTransition { session_id, .. }
            | GameEvent::TurnManualEnd { session_id, .. }
            | GameEvent::TurnForcedEnd { session_id, .. }
            | GameEvent::CombatStarted { session_id, .. }
            | GameEvent::CombatNewRound { session_id }
            | GameEvent::CombatTimerLoop { session_id }
            | GameEvent::CombatTimerRestart { session_id }
            | GameEvent::CombatEnded { session_id, .. }
            | GameEvent::PlayerMoved { session_id, .. }
            | GameEvent::DoorToggled { session_id, .. }
            | GameEvent::SanctuaryUsed { session_id, .. }
            | GameEvent::PlayerTeleported { session_id, .. }
            | GameEvent::PlayerLeft { session_id, .. }
            | GameEvent::GameEnded { session_id, .. } => session_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round(session_id: &str) -> GameEvent {
        GameEvent::CombatNewRound {
            session_id: session_id.to_string(),
        }
    }

    #[test]
    fn subscription_drop_unsubscribes() {
        let bus = EventBus::new();
        {
            let _sub = bus.subscribe("s");
            assert_eq!(bus.subscriber_count(), 1);
        }
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn broadcast_reaches_all_subscribers() {
        let bus = EventBus::new();
        let mut sub1 = bus.subscribe("s");
        let mut sub2 = bus.subscribe("s");

        bus.broadcast("s", round("s"));

        let ev1 = sub1.receiver.try_recv().expect("sub1 event");
        let ev2 = sub2.receiver.try_recv().expect("sub2 event");
        assert_eq!(ev1, round("s"));
        assert_eq!(ev2, round("s"));
    }

    #[test]
    fn broadcast_is_scoped_to_the_session() {
        let bus = EventBus::new();
        let mut other = bus.subscribe("other");
        bus.broadcast("s", round("s"));
        assert!(other.receiver.try_recv().is_err());
    }

    #[test]
    fn closed_receiver_is_pruned() {
        let bus = EventBus::new();
        let (id, rx) = bus.register("s");
        drop(rx);
        bus.broadcast("s", round("s"));
        assert_eq!(bus.subscriber_count(), 0);
        // unsubscribing after removal is a no-op
        bus.unsubscribe("s", id);
    }

    #[test]
    fn full_queue_cuts_the_subscriber_off() {
        let bus = EventBus::new();
        let mut slow = bus.subscribe("s");
        let mut live = bus.subscribe("s");
        for _ in 0..SUBSCRIBER_QUEUE_CAPACITY {
            bus.broadcast("s", round("s"));
            assert!(live.receiver.try_recv().is_ok());
        }
        assert_eq!(bus.subscriber_count(), 2);

        bus.broadcast("s", round("s"));
        assert_eq!(bus.subscriber_count(), 1);
        assert!(live.receiver.try_recv().is_ok());

        // the queued backlog stays readable, then the channel reports closed
        for _ in 0..SUBSCRIBER_QUEUE_CAPACITY {
            assert!(slow.receiver.try_recv().is_ok());
        }
        assert!(matches!(
            slow.receiver.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
    }

    #[test]
    fn event_type_tag_matches_kind() {
        let event = GameEvent::CombatStarted {
            session_id: "s".into(),
            attacker_id: "a".into(),
            target_id: "b".into(),
            attacker_tile_effect: Some(TileEffect::Ice),
            target_tile_effect: None,
        };
        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["type"], event.kind());
        assert!(json["target_tile_effect"].is_null());
        assert!(json.as_object().expect("object").contains_key("target_tile_effect"));
        assert_eq!(event.session_id(), "s");
    }
}
