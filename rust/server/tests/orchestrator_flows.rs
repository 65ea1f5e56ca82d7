//! End-to-end flows through the session orchestrator.
mod common;

use common::{admin_room, advance, drain, kinds, orchestrator, place, room};
use std::collections::HashSet;
use std::time::Duration;
use tactica_engine::definition::GameMode;
use tactica_engine::errors::GameError;
use tactica_engine::grid::{Coordinate, TileEffect, TileKind};
use tactica_engine::session::WaitingRoom;
use tactica_server::events::GameEvent;
use tactica_server::{EngineSettings, SessionOrchestrator};

const TRANSITION: Duration = Duration::from_secs(3);

fn c(x: usize, y: usize) -> Coordinate {
    Coordinate::new(x, y)
}

/// Creates and starts a classic session whose turn order is `ids`.
fn started(orch: &SessionOrchestrator, code: &str, ids: &[&str]) -> String {
    let sid = orch
        .create_session(room(code, ids), GameMode::Classic)
        .expect("create");
    orch.start_game(&sid).expect("start");
    sid
}

fn set_health(orch: &SessionOrchestrator, sid: &str, player_id: &str, health: u32) {
    orch.store()
        .update(sid, |s| {
            s.player_mut(player_id)?.health = health;
            Ok(())
        })
        .expect("set health");
}

fn game_error(result: Result<(), tactica_server::SessionError>) -> GameError {
    result
        .expect_err("operation should fail")
        .game_error()
        .cloned()
        .expect("a game error")
}

/// Session creation validates the game, start points and player list
#[tokio::test(start_paused = true)]
async fn test_create_session_rejections() {
    let orch = orchestrator(EngineSettings::default());

    let unknown = WaitingRoom {
        game_id: "nope".into(),
        ..room("r1", &["a", "b"])
    };
    let err = orch.create_session(unknown, GameMode::Classic).unwrap_err();
    assert_eq!(err.game_error(), Some(&GameError::GameNotFound("nope".into())));

    let crowded = room("r2", &["a", "b", "c", "d", "e"]);
    let err = orch.create_session(crowded, GameMode::Classic).unwrap_err();
    assert_eq!(
        err.game_error(),
        Some(&GameError::NotEnoughStartPoints {
            required: 5,
            available: 4
        })
    );
    assert!(!orch.store().contains("r2"));

    let twice = room("r3", &["a", "a"]);
    let err = orch.create_session(twice, GameMode::Classic).unwrap_err();
    assert_eq!(
        err.game_error(),
        Some(&GameError::PlayerAlreadyJoined("a".into()))
    );

    orch.create_session(room("r4", &["a", "b"]), GameMode::Classic)
        .expect("create");
    let err = orch
        .create_session(room("r4", &["a", "b"]), GameMode::Classic)
        .unwrap_err();
    assert_eq!(err.game_error(), Some(&GameError::SessionAlreadyStarted));
}

/// A new session has a turn order, distinct start tiles and a live tracker
#[tokio::test(start_paused = true)]
async fn test_create_session_places_players() {
    let orch = orchestrator(EngineSettings::default());
    let sid = orch
        .create_session(room("r", &["a", "b", "c"]), GameMode::Classic)
        .expect("create");

    let session = orch.session(&sid).expect("session");
    assert_eq!(session.turn_order, vec!["a", "b", "c"]);
    assert!(session.turn.is_none());
    let starts: HashSet<Coordinate> = session
        .players
        .values()
        .map(|p| p.position.expect("placed"))
        .collect();
    assert_eq!(starts.len(), 3);
    for player in session.players.values() {
        assert_eq!(player.position, player.start_point);
    }

    let tracker = orch.tracking().snapshot(&sid).expect("tracking");
    assert_eq!(tracker.visited_by("a"), 1);
    assert_eq!(tracker.total_tiles, 64);
}

/// Starting twice is rejected and leaves the first turn untouched
#[tokio::test(start_paused = true)]
async fn test_start_game_only_once() {
    let orch = orchestrator(EngineSettings::default());
    let sid = started(&orch, "r", &["a", "b"]);

    let err = orch.start_game(&sid).unwrap_err();
    assert_eq!(err.game_error(), Some(&GameError::SessionAlreadyStarted));
    let turn = orch.session(&sid).expect("session").turn.expect("turn");
    assert_eq!(turn.turn_number, 1);
    assert_eq!(turn.active_player_id, "a");
}

/// Only the active player may act
#[tokio::test(start_paused = true)]
async fn test_actions_out_of_turn_are_rejected() {
    let orch = orchestrator(EngineSettings::default());
    let sid = started(&orch, "r", &["a", "b"]);

    let expected = GameError::NotYourTurn {
        expected: "a".into(),
        actual: "b".into(),
    };
    assert_eq!(game_error(orch.move_player(&sid, "b", c(3, 3))), expected);
    assert_eq!(game_error(orch.end_turn(&sid, "b")), expected);
    assert_eq!(
        game_error(orch.move_player(&sid, "ghost", c(3, 3))),
        GameError::SessionOrPlayerNotFound("ghost".into())
    );
}

/// Moving spends movement points, is tracked and announced
#[tokio::test(start_paused = true)]
async fn test_move_spends_movement_and_tracks_tiles() {
    let orch = orchestrator(EngineSettings::default());
    let sid = started(&orch, "r", &["a", "b"]);
    place(&orch, &sid, "a", c(0, 1));
    place(&orch, &sid, "b", c(7, 7));
    let mut sub = orch.subscribe(&sid);

    orch.move_player(&sid, "a", c(2, 1)).expect("move");

    let session = orch.session(&sid).expect("session");
    let a = session.player("a").expect("a");
    assert_eq!(a.position, Some(c(2, 1)));
    assert_eq!(a.movement_left, 4);

    let events = drain(&mut sub);
    assert_eq!(kinds(&events), vec!["player.moved"]);
    assert!(matches!(
        &events[0],
        GameEvent::PlayerMoved { from, to, .. } if *from == c(0, 1) && *to == c(2, 1)
    ));

    let tracker = orch.tracking().snapshot(&sid).expect("tracking");
    assert!(tracker.player_tiles["a"].contains(&c(1, 1).key()));
    assert!(tracker.player_tiles["a"].contains(&c(2, 1).key()));

    assert_eq!(
        game_error(orch.move_player(&sid, "a", c(7, 1))),
        GameError::TileUnreachable(c(7, 1).key())
    );
    assert_eq!(
        game_error(orch.move_player(&sid, "a", c(7, 7))),
        GameError::TileUnreachable(c(7, 7).key())
    );
}

/// Toggling a door spends the action; the turn ends once movement runs out
#[tokio::test(start_paused = true)]
async fn test_door_then_full_move_ends_the_turn() {
    let orch = orchestrator(EngineSettings::default());
    let sid = started(&orch, "r", &["a", "b"]);
    place(&orch, &sid, "a", c(3, 5));
    place(&orch, &sid, "b", c(7, 0));
    let mut sub = orch.subscribe(&sid);

    orch.toggle_door(&sid, "a", c(4, 5)).expect("toggle");
    let session = orch.session(&sid).expect("session");
    assert_eq!(session.grid.tile(&c(4, 5)), Some(TileKind::Door { open: true }));
    assert!(session.turn.as_ref().expect("turn").has_used_action);
    assert_eq!(kinds(&drain(&mut sub)), vec!["door.toggled"]);

    assert_eq!(
        game_error(orch.toggle_door(&sid, "a", c(4, 5))),
        GameError::NoActionsRemaining
    );

    orch.move_player(&sid, "a", c(0, 2)).expect("move");
    assert_eq!(
        kinds(&drain(&mut sub)),
        vec!["player.moved", "turn.manualEnd", "turn.ended"]
    );

    advance(TRANSITION).await;
    let turn = orch.session(&sid).expect("session").turn.expect("turn");
    assert_eq!(turn.active_player_id, "b");
    assert_eq!(turn.turn_number, 2);

    let tracker = orch.tracking().snapshot(&sid).expect("tracking");
    assert_eq!(tracker.toggled_doors.len(), 1);
}

/// Doors must be adjacent, real doors, and free of players
#[tokio::test(start_paused = true)]
async fn test_door_toggle_rejections() {
    let orch = orchestrator(EngineSettings::default());
    let sid = started(&orch, "r", &["a", "b"]);
    place(&orch, &sid, "a", c(3, 5));
    place(&orch, &sid, "b", c(4, 5));

    assert_eq!(
        game_error(orch.toggle_door(&sid, "a", c(4, 5))),
        GameError::InvalidTarget(c(4, 5).key())
    );
    assert_eq!(
        game_error(orch.toggle_door(&sid, "a", c(2, 5))),
        GameError::InvalidTarget(c(2, 5).key())
    );
    assert_eq!(
        game_error(orch.toggle_door(&sid, "a", c(6, 5))),
        GameError::NotAdjacent(c(6, 5).key())
    );
}

/// A sanctuary heals fully; with no movement left the turn ends right away
#[tokio::test(start_paused = true)]
async fn test_sanctuary_heals_and_exhaustion_ends_turn() {
    let orch = orchestrator(EngineSettings::default());
    let sid = started(&orch, "r", &["a", "b"]);
    place(&orch, &sid, "a", c(4, 3));
    place(&orch, &sid, "b", c(7, 0));
    set_health(&orch, &sid, "a", 1);
    orch.store()
        .update(&sid, |s| {
            s.player_mut("a")?.movement_left = 0;
            Ok(())
        })
        .expect("drain movement");
    let mut sub = orch.subscribe(&sid);

    orch.use_sanctuary(&sid, "a", c(4, 4)).expect("sanctuary");

    let session = orch.session(&sid).expect("session");
    let a = session.player("a").expect("a");
    assert_eq!(a.health, a.max_health());
    assert_eq!(
        kinds(&drain(&mut sub)),
        vec!["sanctuary.used", "turn.manualEnd", "turn.ended"]
    );
    let tracker = orch.tracking().snapshot(&sid).expect("tracking");
    assert_eq!(tracker.used_sanctuaries.len(), 1);

    assert_eq!(
        game_error(orch.use_sanctuary(&sid, "a", c(4, 4))),
        GameError::NotYourTurn {
            expected: "b".into(),
            actual: "a".into()
        }
    );
}

/// Opening a combat pauses the turn clock and starts the round loop
#[tokio::test(start_paused = true)]
async fn test_attack_starts_combat_and_pauses_turn() {
    let orch = orchestrator(EngineSettings::default());
    let sid = started(&orch, "r", &["a", "b"]);
    place(&orch, &sid, "a", c(3, 3));
    place(&orch, &sid, "b", c(3, 4));
    orch.store()
        .update(&sid, |s| {
            s.grid.set_tile(&c(3, 4), TileKind::Ice);
            Ok(())
        })
        .expect("ice");
    let mut sub = orch.subscribe(&sid);

    orch.attack(&sid, "a", "b").expect("attack");

    let events = drain(&mut sub);
    assert_eq!(kinds(&events), vec!["combat.started", "combat.timerRestart"]);
    assert!(matches!(
        &events[0],
        GameEvent::CombatStarted {
            attacker_tile_effect: None,
            target_tile_effect: Some(TileEffect::Ice),
            ..
        }
    ));
    assert!(!orch.turns().has_pending_timer(&sid));
    assert!(orch.combat().is_running(&sid));

    // the turn would have timed out by now
    advance(Duration::from_secs(31)).await;
    let events = drain(&mut sub);
    assert!(!kinds(&events).contains(&"turn.timeout"));
    assert_eq!(
        kinds(&events)
            .iter()
            .filter(|k| **k == "combat.newRound")
            .count(),
        6
    );

    assert_eq!(
        game_error(orch.end_turn(&sid, "a")),
        GameError::AlreadyInCombat
    );
    assert_eq!(
        game_error(orch.move_player(&sid, "a", c(2, 3))),
        GameError::AlreadyInCombat
    );
}

/// Fighters alternate exchanges until one falls; the loser respawns healed
#[tokio::test(start_paused = true)]
async fn test_combat_until_defeat_then_respawn() {
    let orch = orchestrator(EngineSettings::default());
    let sid = started(&orch, "r", &["a", "b"]);
    place(&orch, &sid, "a", c(3, 3));
    place(&orch, &sid, "b", c(3, 4));
    orch.store()
        .update(&sid, |s| {
            s.grid.set_tile(&c(3, 4), TileKind::Ice);
            Ok(())
        })
        .expect("ice");
    orch.attack(&sid, "a", "b").expect("attack");
    let mut sub = orch.subscribe(&sid);

    // 4 attack against 2 defense on ice
    orch.combat_attack(&sid, "a").expect("exchange");
    assert_eq!(orch.session(&sid).expect("session").player("b").expect("b").health, 2);
    assert_eq!(
        kinds(&drain(&mut sub)),
        vec!["combat.newRound", "combat.timerLoop", "combat.timerRestart"]
    );
    assert_eq!(
        game_error(orch.combat_attack(&sid, "a")),
        GameError::NotYourTurn {
            expected: "b".into(),
            actual: "a".into()
        }
    );

    // 2 attack on ice against 4 defense: the minimum
    orch.combat_attack(&sid, "b").expect("exchange");
    assert_eq!(orch.session(&sid).expect("session").player("a").expect("a").health, 3);
    orch.combat_attack(&sid, "a").expect("finishing blow");
    drain(&mut sub);

    let session = orch.session(&sid).expect("session");
    assert!(session.combat.is_none());
    let a = session.player("a").expect("a");
    let b = session.player("b").expect("b");
    assert_eq!((a.combat.count, a.combat.wins), (1, 1));
    assert_eq!((b.combat.count, b.combat.losses), (1, 1));
    assert_eq!(b.health, b.max_health());
    assert_eq!(b.position, b.start_point);
    assert!(session.winner.is_none());
    assert!(!orch.combat().is_running(&sid));

    let tracker = orch.tracking().snapshot(&sid).expect("tracking");
    assert_eq!(tracker.player_damage["a"].health_dealt, 4);
    assert_eq!(tracker.player_damage["b"].health_lost, 4);
    assert_eq!(tracker.player_damage["a"].health_lost, 1);

    advance(TRANSITION).await;
    let turn = orch.session(&sid).expect("session").turn.expect("turn");
    assert_eq!(turn.active_player_id, "b");
    assert_eq!(turn.turn_number, 2);
}

/// Evading ends the combat as a draw for both fighters
#[tokio::test(start_paused = true)]
async fn test_evade_is_a_draw() {
    let orch = orchestrator(EngineSettings::default());
    let sid = started(&orch, "r", &["a", "b"]);
    place(&orch, &sid, "a", c(3, 3));
    place(&orch, &sid, "b", c(3, 4));
    orch.attack(&sid, "a", "b").expect("attack");
    let mut sub = orch.subscribe(&sid);

    assert_eq!(
        game_error(orch.combat_evade(&sid, "b")),
        GameError::NotYourTurn {
            expected: "a".into(),
            actual: "b".into()
        }
    );
    orch.combat_evade(&sid, "a").expect("evade");

    let events = drain(&mut sub);
    assert_eq!(kinds(&events), vec!["combat.ended", "turn.ended"]);
    assert!(matches!(
        &events[0],
        GameEvent::CombatEnded {
            winner_id: None,
            loser_id: None,
            ..
        }
    ));
    let session = orch.session(&sid).expect("session");
    for id in ["a", "b"] {
        let record = session.player(id).expect("player").combat;
        assert_eq!((record.count, record.draws), (1, 1));
    }
    assert_eq!(
        game_error(orch.combat_evade(&sid, "a")),
        GameError::NotInCombat
    );
}

/// Attacks need an adjacent opponent
#[tokio::test(start_paused = true)]
async fn test_attack_rejections() {
    let orch = orchestrator(EngineSettings::default());
    let sid = started(&orch, "r", &["a", "b"]);
    place(&orch, &sid, "a", c(1, 1));
    place(&orch, &sid, "b", c(5, 5));

    assert_eq!(
        game_error(orch.attack(&sid, "a", "b")),
        GameError::NotAdjacent(c(5, 5).key())
    );
    assert_eq!(
        game_error(orch.attack(&sid, "a", "a")),
        GameError::InvalidTarget("a".into())
    );
    assert_eq!(
        game_error(orch.attack(&sid, "a", "ghost")),
        GameError::InvalidTarget("ghost".into())
    );
    assert!(orch.turns().has_pending_timer(&sid));
}

/// Reaching the win threshold ends a classic game; nothing is allowed after
#[tokio::test(start_paused = true)]
async fn test_classic_victory_ends_the_game() {
    let orch = orchestrator(EngineSettings {
        wins_to_victory: 1,
        ..EngineSettings::default()
    });
    let sid = started(&orch, "r", &["a", "b"]);
    place(&orch, &sid, "a", c(3, 3));
    place(&orch, &sid, "b", c(3, 4));
    set_health(&orch, &sid, "b", 1);
    orch.attack(&sid, "a", "b").expect("attack");
    let mut sub = orch.subscribe(&sid);

    orch.combat_attack(&sid, "a").expect("finishing blow");

    let events = drain(&mut sub);
    assert_eq!(kinds(&events), vec!["combat.ended", "game.ended"]);
    let GameEvent::GameEnded { statistics, .. } = &events[1] else {
        panic!("expected game.ended");
    };
    assert_eq!(statistics.winner_id.as_deref(), Some("a"));
    assert_eq!(statistics.winner_name.as_deref(), Some("A"));
    assert_eq!(statistics.players[0].wins, 1);

    assert_eq!(orch.turns().pending_timers(), 0);
    assert_eq!(orch.combat().pending_timers(), 0);
    let stored = orch.statistics().get(&sid).expect("stored report");
    assert_eq!(stored.winner_id.as_deref(), Some("a"));

    assert_eq!(
        game_error(orch.move_player(&sid, "a", c(2, 3))),
        GameError::GameOver
    );
    assert_eq!(game_error(orch.end_turn(&sid, "a")), GameError::GameOver);
    assert_eq!(
        orch.end_game(&sid).unwrap_err().game_error(),
        Some(&GameError::GameOver)
    );

    advance(Duration::from_secs(60)).await;
    assert!(drain(&mut sub).is_empty());
}

/// Bringing the flag home wins a capture-the-flag game
#[tokio::test(start_paused = true)]
async fn test_flag_capture_ends_the_game() {
    let orch = orchestrator(EngineSettings::default());
    let ctf = WaitingRoom {
        game_id: "ctf".into(),
        ..room("r", &["a", "b"])
    };
    let sid = orch
        .create_session(ctf, GameMode::CaptureTheFlag)
        .expect("create");
    orch.start_game(&sid).expect("start");
    place(&orch, &sid, "a", c(5, 3));
    place(&orch, &sid, "b", c(0, 7));
    orch.store()
        .update(&sid, |s| {
            s.player_mut("a")?.start_point = Some(c(5, 1));
            Ok(())
        })
        .expect("home");
    let mut sub = orch.subscribe(&sid);

    orch.move_player(&sid, "a", c(5, 4)).expect("take flag");
    let session = orch.session(&sid).expect("session");
    assert!(session.player("a").expect("a").has_flag);
    assert!(session.winner.is_none());

    orch.move_player(&sid, "a", c(5, 1)).expect("bring it home");
    let events = drain(&mut sub);
    assert_eq!(
        kinds(&events),
        vec!["player.moved", "player.moved", "game.ended"]
    );
    let GameEvent::GameEnded { statistics, .. } = &events[2] else {
        panic!("expected game.ended");
    };
    assert_eq!(statistics.winner_id.as_deref(), Some("a"));
    assert_eq!(statistics.global.flag_holders, 1);
    assert_eq!(orch.turns().pending_timers(), 0);
}

/// Teammates cannot fight each other in capture-the-flag
#[tokio::test(start_paused = true)]
async fn test_teammates_are_not_targets() {
    let orch = orchestrator(EngineSettings::default());
    let ctf = WaitingRoom {
        game_id: "ctf".into(),
        ..room("r", &["a", "b", "c"])
    };
    let sid = orch
        .create_session(ctf, GameMode::CaptureTheFlag)
        .expect("create");
    orch.start_game(&sid).expect("start");
    place(&orch, &sid, "a", c(2, 2));
    place(&orch, &sid, "c", c(2, 3));
    place(&orch, &sid, "b", c(7, 7));

    // a and c share the red team
    assert_eq!(
        game_error(orch.attack(&sid, "a", "c")),
        GameError::InvalidTarget("c".into())
    );
}

/// With two players, the active one leaving hands the win to the other
#[tokio::test(start_paused = true)]
async fn test_active_player_leaving_ends_two_player_game() {
    let orch = orchestrator(EngineSettings::default());
    let sid = started(&orch, "r", &["a", "b"]);
    let mut sub = orch.subscribe(&sid);

    orch.player_left(&sid, "a").expect("leave");

    let events = drain(&mut sub);
    assert_eq!(
        kinds(&events),
        vec!["player.left", "turn.forcedEnd", "turn.ended", "game.ended"]
    );
    let session = orch.session(&sid).expect("session");
    assert_eq!(session.winner.as_deref(), Some("b"));
    assert!(!session.player("a").expect("a").in_game);
    assert_eq!(orch.turns().pending_timers(), 0);

    // leaving after the end changes nothing
    orch.player_left(&sid, "b").expect("late leave");
    assert_eq!(kinds(&drain(&mut sub)), vec!["player.left"]);
}

/// A waiting player leaving a larger game just drops out of the rotation
#[tokio::test(start_paused = true)]
async fn test_waiting_player_leaving_keeps_the_game_going() {
    let orch = orchestrator(EngineSettings::default());
    let sid = started(&orch, "r", &["a", "b", "c"]);
    let mut sub = orch.subscribe(&sid);

    orch.player_left(&sid, "b").expect("leave");
    assert_eq!(kinds(&drain(&mut sub)), vec!["player.left"]);
    let session = orch.session(&sid).expect("session");
    assert_eq!(session.turn_order, vec!["a", "c"]);
    assert!(!session.is_over());

    orch.end_turn(&sid, "a").expect("end turn");
    advance(TRANSITION).await;
    let turn = orch.session(&sid).expect("session").turn.expect("turn");
    assert_eq!(turn.active_player_id, "c");
}

/// Leaving mid-combat settles the combat for the opponent
#[tokio::test(start_paused = true)]
async fn test_leaving_mid_combat() {
    let orch = orchestrator(EngineSettings::default());
    let sid = started(&orch, "r", &["a", "b", "c"]);
    place(&orch, &sid, "a", c(3, 3));
    place(&orch, &sid, "b", c(3, 4));
    orch.attack(&sid, "a", "b").expect("attack");
    let mut sub = orch.subscribe(&sid);

    orch.player_left(&sid, "b").expect("leave");
    let events = drain(&mut sub);
    assert_eq!(
        kinds(&events),
        vec!["player.left", "combat.ended", "turn.ended"]
    );
    assert!(matches!(
        &events[1],
        GameEvent::CombatEnded { winner_id: Some(w), loser_id: Some(l), .. } if w == "a" && l == "b"
    ));
    assert!(!orch.combat().is_running(&sid));
    assert!(orch.session(&sid).expect("session").combat.is_none());

    advance(TRANSITION).await;
    let turn = orch.session(&sid).expect("session").turn.expect("turn");
    assert_eq!(turn.active_player_id, "c");
}

/// Removing a session drops its state but keeps the stored report
#[tokio::test(start_paused = true)]
async fn test_remove_session_keeps_statistics() {
    let orch = orchestrator(EngineSettings::default());
    let sid = started(&orch, "r", &["a", "b"]);
    orch.end_game(&sid).expect("end game");

    orch.remove_session(&sid).expect("remove");
    assert!(orch.session(&sid).is_err());
    assert!(!orch.tracking().is_tracking(&sid));
    assert!(orch.statistics().get(&sid).is_some());
    assert!(orch.remove_session(&sid).is_err());
}

/// Teleporting needs an admin-mode session
#[tokio::test(start_paused = true)]
async fn test_teleport_requires_admin_mode() {
    let orch = orchestrator(EngineSettings::default());
    let sid = started(&orch, "r", &["a", "b"]);
    assert_eq!(
        game_error(orch.teleport(&sid, "a", c(6, 6))),
        GameError::AdminModeRequired
    );

    let sid = orch
        .create_session(admin_room("admin", &["a", "b"]), GameMode::Classic)
        .expect("create");
    orch.start_game(&sid).expect("start");
    place(&orch, &sid, "b", c(7, 7));
    let mut sub = orch.subscribe(&sid);

    orch.teleport(&sid, "a", c(6, 6)).expect("teleport");
    assert_eq!(
        orch.session(&sid).expect("session").player("a").expect("a").position,
        Some(c(6, 6))
    );
    assert_eq!(kinds(&drain(&mut sub)), vec!["player.teleported"]);
    assert_eq!(
        orch.tracking().snapshot(&sid).expect("tracking").teleportations,
        1
    );
    assert_eq!(
        game_error(orch.teleport(&sid, "a", c(7, 7))),
        GameError::TileUnreachable(c(7, 7).key())
    );
}

/// An unattended turn times out through the orchestrator's clock
#[tokio::test(start_paused = true)]
async fn test_unattended_turn_times_out() {
    let orch = orchestrator(EngineSettings {
        turn_duration_ms: 1_000,
        transition_delay_ms: 0,
        ..EngineSettings::default()
    });
    let sid = started(&orch, "r", &["a", "b"]);
    let mut sub = orch.subscribe(&sid);

    advance(Duration::from_millis(1_050)).await;
    advance(Duration::from_millis(10)).await;
    assert_eq!(
        kinds(&drain(&mut sub)),
        vec!["turn.timeout", "turn.ended", "turn.transition", "turn.started"]
    );
}

/// The next player may not act or end their turn before `turn.started`
#[tokio::test(start_paused = true)]
async fn test_incoming_player_waits_for_the_transition() {
    let orch = orchestrator(EngineSettings::default());
    let sid = started(&orch, "r", &["a", "b", "c"]);
    let mut sub = orch.subscribe(&sid);

    orch.end_turn(&sid, "a").expect("end turn");
    assert_eq!(game_error(orch.end_turn(&sid, "b")), GameError::TurnNotStarted(2));
    assert_eq!(
        game_error(orch.move_player(&sid, "b", c(0, 1))),
        GameError::TurnNotStarted(2)
    );
    assert_eq!(kinds(&drain(&mut sub)), vec!["turn.manualEnd", "turn.ended"]);

    advance(TRANSITION).await;
    assert_eq!(kinds(&drain(&mut sub)), vec!["turn.transition", "turn.started"]);
    orch.end_turn(&sid, "b").expect("end turn");
    advance(TRANSITION).await;
    let turn = orch.session(&sid).expect("session").turn.expect("turn");
    assert_eq!((turn.turn_number, turn.active_player_id.as_str()), (3, "c"));
}
