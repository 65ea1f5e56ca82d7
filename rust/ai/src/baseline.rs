//! Baseline bot used by the simulator.
//!
//! Rule-based and deterministic for a given session snapshot, so simulations
//! seeded the same way play out the same way.

use crate::{Bot, BotAction};
use tactica_engine::definition::{GameMode, PlaceableKind};
use tactica_engine::grid::{Coordinate, TileKind};
use tactica_engine::player::{Player, PlayerId};
use tactica_engine::session::Session;

/// Health at or below which the bot walks away from a fight.
const EVADE_AT_HEALTH: u32 = 1;

/// Simple rule-based bot.
///
/// # Strategy
///
/// - **In combat:** attack when it is its exchange; evade once down to
///   [`EVADE_AT_HEALTH`].
/// - **Adjacent opponent:** attack the weakest one if the action is unspent.
/// - **Otherwise:** take one step that strictly closes the distance to its goal
///   (the closest opponent; in capture the flag the flag, or home while
///   carrying it), opening a closed door in the way if that is the only
///   option.
/// - **Nothing left:** end the turn.
///
/// # Example
///
/// ```rust
/// use tactica_ai::baseline::BaselineBot;
/// use tactica_ai::Bot;
///
/// let bot = BaselineBot::new();
/// assert_eq!(bot.name(), "BaselineBot");
/// ```
#[derive(Debug, Clone, Default)]
pub struct BaselineBot;

impl BaselineBot {
    pub fn new() -> Self {
        Self
    }

    fn fight(session: &Session, me: &Player) -> Option<BotAction> {
        let combat = session.combat.as_ref()?;
        if combat.current_fighter != me.id {
            return None;
        }
        if me.health <= EVADE_AT_HEALTH && me.max_health() > EVADE_AT_HEALTH {
            Some(BotAction::Evade)
        } else {
            Some(BotAction::CombatAttack)
        }
    }

    /// Weakest adjacent opponent, ties broken by id.
    fn adjacent_opponent(session: &Session, me: &Player) -> Option<PlayerId> {
        let at = me.position?;
        session
            .players
            .values()
            .filter(|p| p.in_game && session.are_opponents(&me.id, &p.id))
            .filter(|p| p.position.is_some_and(|pos| pos.is_adjacent(&at)))
            .min_by(|a, b| a.health.cmp(&b.health).then_with(|| a.id.cmp(&b.id)))
            .map(|p| p.id.clone())
    }

    fn goal(session: &Session, me: &Player) -> Option<Coordinate> {
        if session.mode == GameMode::CaptureTheFlag {
            if me.has_flag {
                return me.start_point;
            }
            if let Some(flag) = session
                .placeables
                .iter()
                .find(|p| p.kind == PlaceableKind::Flag)
            {
                return Some(flag.position);
            }
        }
        let at = me.position?;
        session
            .players
            .values()
            .filter(|p| p.in_game && session.are_opponents(&me.id, &p.id))
            .filter_map(|p| p.position.map(|pos| (pos.distance(&at), p.id.as_str(), pos)))
            .min_by_key(|(distance, id, _)| (*distance, *id))
            .map(|(_, _, pos)| pos)
    }

    /// Free neighbouring tiles that get strictly closer to `goal`, closest first.
    fn closer_neighbors(session: &Session, me: &Player, goal: Coordinate) -> Vec<Coordinate> {
        let Some(at) = me.position else {
            return Vec::new();
        };
        let occupied = session.occupied_tiles();
        let current = at.distance(&goal);
        let mut tiles: Vec<Coordinate> = at
            .neighbors(session.map_size())
            .into_iter()
            .filter(|n| !occupied.contains(n) && n.distance(&goal) < current)
            .collect();
        tiles.sort_by_key(|n| (n.distance(&goal), n.y, n.x));
        tiles
    }

    fn step_toward(session: &Session, me: &Player, goal: Coordinate) -> Option<Coordinate> {
        Self::closer_neighbors(session, me, goal)
            .into_iter()
            .find(|n| {
                session
                    .grid
                    .tile(n)
                    .and_then(|t| t.move_cost())
                    .is_some_and(|cost| cost <= me.movement_left)
            })
    }

    fn door_toward(session: &Session, me: &Player, goal: Coordinate) -> Option<Coordinate> {
        Self::closer_neighbors(session, me, goal)
            .into_iter()
            .find(|n| session.grid.tile(n) == Some(TileKind::Door { open: false }))
    }
}

impl Bot for BaselineBot {
    fn decide(&self, session: &Session, player_id: &str) -> Option<BotAction> {
        if session.is_over() {
            return None;
        }
        let me = session.player(player_id).ok()?;
        if !me.in_game {
            return None;
        }
        // a running combat freezes everyone else
        if session.combat.is_some() {
            return Self::fight(session, me);
        }
        let turn = session.turn.as_ref()?;
        if turn.active_player_id != player_id {
            return None;
        }

        let can_act = me.actions_left > 0 && !turn.has_used_action;
        if can_act {
            if let Some(target) = Self::adjacent_opponent(session, me) {
                return Some(BotAction::Attack(target));
            }
        }
        if let Some(goal) = Self::goal(session, me) {
            if let Some(step) = Self::step_toward(session, me, goal) {
                return Some(BotAction::Move(step));
            }
            if can_act {
                if let Some(door) = Self::door_toward(session, me, goal) {
                    return Some(BotAction::ToggleDoor(door));
                }
            }
        }
        Some(BotAction::EndTurn)
    }

    fn name(&self) -> &str {
        "BaselineBot"
    }
}
