#![allow(dead_code)]

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tactica_engine::definition::{GameDefinition, GameMode};
use tactica_engine::grid::Coordinate;
use tactica_engine::player::{PlayerSeed, StatBlock};
use tactica_engine::session::{Session, WaitingRoom};
use tactica_server::events::{EventSubscription, GameEvent};
use tactica_server::{EngineSettings, InMemoryDefinitions, SessionOrchestrator};

pub const GAME_ID: &str = "arena";
pub const MAP_SIZE: usize = 8;

/// Players with distinct speeds so the turn order is fixed: listed order,
/// fastest first.
pub fn room(code: &str, ids: &[&str]) -> WaitingRoom {
    let fastest = 4 + ids.len() as u32;
    WaitingRoom {
        code: code.to_string(),
        game_id: GAME_ID.to_string(),
        players: ids
            .iter()
            .enumerate()
            .map(|(idx, id)| {
                PlayerSeed::new(*id, id.to_uppercase(), StatBlock::new(4, fastest - idx as u32, 4, 4))
            })
            .collect(),
        admin_mode: false,
    }
}

pub fn admin_room(code: &str, ids: &[&str]) -> WaitingRoom {
    WaitingRoom {
        admin_mode: true,
        ..room(code, ids)
    }
}

/// A session with turn order `ids`, not yet started.
pub fn bare_session(code: &str, ids: &[&str]) -> Session {
    let definition = GameDefinition::arena(GAME_ID, MAP_SIZE, GameMode::Classic, 4);
    let mut session =
        Session::from_waiting_room(room(code, ids), &definition, GameMode::Classic, Utc::now())
            .expect("session");
    session.turn_order = ids.iter().map(|id| id.to_string()).collect();
    session
}

pub fn orchestrator(settings: EngineSettings) -> SessionOrchestrator {
    let definitions = Arc::new(InMemoryDefinitions::new());
    definitions.insert(GameDefinition::arena(GAME_ID, MAP_SIZE, GameMode::Classic, 4));
    definitions.insert(GameDefinition::arena(
        "ctf",
        MAP_SIZE,
        GameMode::CaptureTheFlag,
        4,
    ));
    SessionOrchestrator::with_definitions(settings, definitions).expect("valid settings")
}

/// Puts a player on a tile, bypassing movement rules.
pub fn place(orch: &SessionOrchestrator, session_id: &str, player_id: &str, at: Coordinate) {
    orch.store()
        .update(session_id, |session| {
            session.player_mut(player_id)?.position = Some(at);
            Ok(())
        })
        .expect("place player");
}

pub fn drain(sub: &mut EventSubscription) -> Vec<GameEvent> {
    let mut events = Vec::new();
    while let Ok(event) = sub.receiver.try_recv() {
        events.push(event);
    }
    events
}

pub fn kinds(events: &[GameEvent]) -> Vec<&'static str> {
    events.iter().map(GameEvent::kind).collect()
}

/// Lets the paused clock run forward and spawned timer callbacks complete.
pub async fn advance(by: Duration) {
    tokio::time::sleep(by).await;
    for _ in 0..4 {
        tokio::task::yield_now().await;
    }
}
