use crate::errors::GameError;
use crate::grid::{Coordinate, TileEffect};
use crate::player::Player;
use crate::session::Session;

/// Checks that `player_id` holds the active turn and that the turn has
/// started.
///
/// # Examples
///
/// ```
/// use tactica_engine::errors::GameError;
/// use tactica_engine::rules::validate_turn;
/// # use tactica_engine::definition::{GameDefinition, GameMode};
/// # use tactica_engine::player::{PlayerSeed, DEFAULT_STATS};
/// # use tactica_engine::session::{Session, TurnState, WaitingRoom};
/// # let def = GameDefinition::arena("g", 10, GameMode::Classic, 2);
/// # let room = WaitingRoom {
/// #     code: "r".into(),
/// #     game_id: "g".into(),
/// #     players: vec![PlayerSeed::new("a", "A", DEFAULT_STATS), PlayerSeed::new("b", "B", DEFAULT_STATS)],
/// #     admin_mode: false,
/// # };
/// # let mut session = Session::from_waiting_room(room, &def, GameMode::Classic, chrono::Utc::now()).unwrap();
/// # session.turn_order = vec!["a".into(), "b".into()];
/// session.turn = Some(TurnState::first("a".into()));
/// assert!(validate_turn(&session, "a").is_ok());
/// assert!(matches!(validate_turn(&session, "b"), Err(GameError::NotYourTurn { .. })));
///
/// session.turn = Some(TurnState::first("a".into()).advance("b".into()));
/// assert_eq!(validate_turn(&session, "b"), Err(GameError::TurnNotStarted(2)));
/// ```
pub fn validate_turn(session: &Session, player_id: &str) -> Result<(), GameError> {
    session.player(player_id)?;
    let active = session
        .active_player_id()
        .ok_or(GameError::TurnOrderUndefined)?;
    if active != player_id {
        return Err(GameError::NotYourTurn {
            expected: active.clone(),
            actual: player_id.to_string(),
        });
    }
    match &session.turn {
        Some(turn) if !turn.started => Err(GameError::TurnNotStarted(turn.turn_number)),
        _ => Ok(()),
    }
}

/// Checks that the active player may still spend an action this turn.
pub fn validate_action_budget(session: &Session, player_id: &str) -> Result<(), GameError> {
    validate_turn(session, player_id)?;
    let player = session.player(player_id)?;
    let used = session.turn.as_ref().is_some_and(|t| t.has_used_action);
    if player.actions_left == 0 || used {
        return Err(GameError::NoActionsRemaining);
    }
    Ok(())
}

/// The tile must share an edge with the player's position.
pub fn validate_adjacent(player: &Player, target: &Coordinate) -> Result<(), GameError> {
    match player.position {
        Some(position) if position.is_adjacent(target) => Ok(()),
        _ => Err(GameError::NotAdjacent(target.key())),
    }
}

/// Damage dealt by one exchange: attack minus defense, at least 1. Tile effects
/// under each fighter lower both their attack and defense.
///
/// # Examples
///
/// ```
/// use tactica_engine::grid::TileEffect;
/// use tactica_engine::rules::combat_damage;
///
/// assert_eq!(combat_damage(6, None, 4, None), 2);
/// assert_eq!(combat_damage(4, None, 6, None), 1);
/// assert_eq!(combat_damage(6, None, 4, Some(TileEffect::Ice)), 4);
/// ```
pub fn combat_damage(
    attack: u32,
    attacker_effect: Option<TileEffect>,
    defense: u32,
    defender_effect: Option<TileEffect>,
) -> u32 {
    let attack = attack.saturating_sub(attacker_effect.map_or(0, |e| e.combat_penalty()));
    let defense = defense.saturating_sub(defender_effect.map_or(0, |e| e.combat_penalty()));
    attack.saturating_sub(defense).max(1)
}
