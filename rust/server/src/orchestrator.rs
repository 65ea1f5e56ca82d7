//! Session orchestration: the single entry point for everything a player or
//! the lobby can do to a running game.
//!
//! Each operation validates and mutates the session under its lock, then
//! updates occupancy and tracking, publishes events and finally hands off to
//! the turn engine or combat timer. Timer and event work never happens while a
//! session lock is held.
use crate::combat::CombatTimer;
use crate::errors::SessionError;
use crate::events::{EventBus, EventSubscription, GameEvent};
use crate::initialization::InitializationService;
use crate::ports::{
    GameDefinitionSource, GridPathfinder, OccupancyMap, OccupancyTracker, Pathfinder,
};
use crate::settings::{EngineSettings, SettingsError};
use crate::statistics::StatisticsService;
use crate::store::SessionStore;
use crate::tracking::TrackingStore;
use crate::turn::{TurnEngine, TurnTimings};
use std::sync::Arc;
use tactica_engine::definition::{GameMode, Placeable, PlaceableKind};
use tactica_engine::errors::GameError;
use tactica_engine::grid::Coordinate;
use tactica_engine::player::PlayerId;
use tactica_engine::rules;
use tactica_engine::session::{CombatState, Session, SessionId, TurnState, WaitingRoom};
use tactica_engine::statistics::GameStatistics;

pub struct SessionOrchestrator {
    settings: EngineSettings,
    store: Arc<SessionStore>,
    tracking: Arc<TrackingStore>,
    events: Arc<EventBus>,
    turns: TurnEngine,
    combat: CombatTimer,
    statistics: StatisticsService,
    initialization: InitializationService,
    occupancy: Arc<dyn OccupancyTracker>,
    pathfinder: Arc<dyn Pathfinder>,
}

/// How a combat ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CombatOutcome {
    Victory { winner: PlayerId, loser: PlayerId },
    Draw,
}

/// Result of spending an action: whether the player has nothing left this
/// turn, and which turn that was.
#[derive(Debug, Clone, Copy)]
struct ActionSpent {
    exhausted: bool,
    turn_number: u32,
}

struct Moved {
    from: Coordinate,
    path: Vec<Coordinate>,
    picked_flag: bool,
    captured: bool,
    exhausted: bool,
    turn_number: u32,
}

struct Respawn {
    from: Option<Coordinate>,
    to: Coordinate,
}

struct Departure {
    game_over: bool,
    position: Option<Coordinate>,
    was_active: bool,
    combat_opponent: Option<PlayerId>,
}

impl SessionOrchestrator {
    pub fn new(
        settings: EngineSettings,
        definitions: Arc<dyn GameDefinitionSource>,
        occupancy: Arc<dyn OccupancyTracker>,
        pathfinder: Arc<dyn Pathfinder>,
    ) -> Result<Self, SettingsError> {
        settings.validate()?;

        let store = Arc::new(SessionStore::new());
        let tracking = Arc::new(TrackingStore::new());
        let events = Arc::new(EventBus::new());
        let turns = TurnEngine::new(
            Arc::clone(&store),
            Arc::clone(&events),
            TurnTimings {
                turn_duration: settings.turn_duration(),
                transition_delay: settings.transition_delay(),
                actions_per_turn: settings.actions_per_turn,
            },
        );
        let combat = CombatTimer::new(Arc::clone(&events), settings.combat_round());
        let statistics = StatisticsService::new(
            Arc::clone(&store),
            Arc::clone(&tracking),
            settings.statistics_retention(),
        );
        let initialization = InitializationService::new(
            Arc::clone(&store),
            Arc::clone(&tracking),
            definitions,
            Arc::clone(&occupancy),
        );

        Ok(Self {
            settings,
            store,
            tracking,
            events,
            turns,
            combat,
            statistics,
            initialization,
            occupancy,
            pathfinder,
        })
    }

    /// In-process occupancy map and grid pathfinding.
    pub fn with_definitions(
        settings: EngineSettings,
        definitions: Arc<dyn GameDefinitionSource>,
    ) -> Result<Self, SettingsError> {
        Self::new(
            settings,
            definitions,
            Arc::new(OccupancyMap::new()),
            Arc::new(GridPathfinder),
        )
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn tracking(&self) -> &Arc<TrackingStore> {
        &self.tracking
    }

    pub fn turns(&self) -> &TurnEngine {
        &self.turns
    }

    pub fn combat(&self) -> &CombatTimer {
        &self.combat
    }

    pub fn statistics(&self) -> &StatisticsService {
        &self.statistics
    }

    pub fn initialization(&self) -> &InitializationService {
        &self.initialization
    }

    pub fn subscribe(&self, session_id: &str) -> EventSubscription {
        self.events.subscribe(session_id)
    }

    pub fn session(&self, session_id: &str) -> Result<Session, SessionError> {
        self.store.snapshot(session_id)
    }

    fn observe<T>(
        &self,
        operation: &str,
        session_id: &str,
        result: Result<T, SessionError>,
    ) -> Result<T, SessionError> {
        if let Err(err) = &result {
            err.log(operation, session_id);
        }
        result
    }

    pub fn create_session(&self, room: WaitingRoom, mode: GameMode) -> Result<SessionId, SessionError> {
        let code = room.code.clone();
        let result = self.initialization.create_session(room, mode);
        self.observe("create_session", &code, result)
    }

    /// Starts the first turn. A session can only be started once.
    pub fn start_game(&self, session_id: &str) -> Result<TurnState, SessionError> {
        let result = self
            .turns
            .start_unstarted(session_id, self.settings.turn_duration());
        self.observe("start_game", session_id, result)
    }

    pub fn move_player(&self, session_id: &str, player_id: &str, to: Coordinate) -> Result<(), SessionError> {
        let result = self.move_player_inner(session_id, player_id, to);
        self.observe("move_player", session_id, result)
    }

    fn move_player_inner(&self, session_id: &str, player_id: &str, to: Coordinate) -> Result<(), SessionError> {
        let pathfinder = Arc::clone(&self.pathfinder);
        let moved = self.store.update(session_id, |session| {
            ensure_playing(session)?;
            rules::validate_turn(session, player_id)?;
            if session.combat.is_some() {
                return Err(GameError::AlreadyInCombat);
            }
            let player = session.player(player_id)?;
            let budget = player.movement_left;
            let from = player
                .position
                .ok_or_else(|| GameError::TileUnreachable(to.key()))?;
            let path = pathfinder
                .find_path(session, player_id, to, budget)
                .filter(|path| path.cost <= budget)
                .ok_or_else(|| GameError::TileUnreachable(to.key()))?;

            let player = session.player_mut(player_id)?;
            player.position = Some(to);
            player.movement_left = budget - path.cost;

            let mut picked_flag = false;
            if session.mode == GameMode::CaptureTheFlag
                && session.take_placeable(&to, PlaceableKind::Flag)
            {
                session.player_mut(player_id)?.has_flag = true;
                picked_flag = true;
            }
            let (captured, movement_left) = {
                let player = session.player(player_id)?;
                (
                    player.has_flag && player.start_point == Some(to),
                    player.movement_left,
                )
            };
            if captured {
                session.winner = Some(player_id.to_string());
            }
            let turn = session.turn.as_ref().ok_or(GameError::TurnOrderUndefined)?;
            Ok(Moved {
                from,
                path: path.tiles,
                picked_flag,
                captured,
                exhausted: movement_left == 0 && turn.has_used_action,
                turn_number: turn.turn_number,
            })
        })?;

        self.occupancy.vacate(session_id, moved.from);
        self.occupancy.occupy(session_id, to, player_id);
        for tile in &moved.path {
            self.tracking.track_tile_visited(session_id, player_id, tile);
        }
        if moved.picked_flag {
            self.tracking.track_flag_holder(session_id, player_id);
        }
        self.events.broadcast(
            session_id,
            GameEvent::PlayerMoved {
                session_id: session_id.to_string(),
                player_id: player_id.to_string(),
                from: moved.from,
                to,
            },
        );

        if moved.captured {
            tracing::info!(session_id = %session_id, player_id = %player_id, "flag captured");
            self.end_game_inner(session_id)?;
            return Ok(());
        }
        // post-move guard: out of movement with the action already spent
        if moved.exhausted {
            self.turns.end_turn_if_current(session_id, moved.turn_number)?;
        }
        Ok(())
    }

    pub fn toggle_door(&self, session_id: &str, player_id: &str, at: Coordinate) -> Result<(), SessionError> {
        let result = self.toggle_door_inner(session_id, player_id, at);
        self.observe("toggle_door", session_id, result)
    }

    fn toggle_door_inner(&self, session_id: &str, player_id: &str, at: Coordinate) -> Result<(), SessionError> {
        let (open, spent) = self.store.update(session_id, |session| {
            ensure_idle_turn(session, player_id)?;
            rules::validate_adjacent(session.player(player_id)?, &at)?;
            if !session.grid.tile(&at).is_some_and(|t| t.is_door()) {
                return Err(GameError::InvalidTarget(at.key()));
            }
            if session.player_at(&at).is_some() {
                return Err(GameError::InvalidTarget(at.key()));
            }
            let open = session
                .grid
                .toggle_door(&at)
                .ok_or_else(|| GameError::InvalidTarget(at.key()))?;
            Ok((open, spend_action(session, player_id)?))
        })?;

        self.tracking.track_door_toggled(session_id, &at);
        self.events.broadcast(
            session_id,
            GameEvent::DoorToggled {
                session_id: session_id.to_string(),
                player_id: player_id.to_string(),
                at,
                open,
            },
        );
        self.after_action(session_id, spent)
    }

    pub fn use_sanctuary(&self, session_id: &str, player_id: &str, at: Coordinate) -> Result<(), SessionError> {
        let result = self.use_sanctuary_inner(session_id, player_id, at);
        self.observe("use_sanctuary", session_id, result)
    }

    fn use_sanctuary_inner(&self, session_id: &str, player_id: &str, at: Coordinate) -> Result<(), SessionError> {
        let spent = self.store.update(session_id, |session| {
            ensure_idle_turn(session, player_id)?;
            rules::validate_adjacent(session.player(player_id)?, &at)?;
            if !session.placeable_at(&at, PlaceableKind::Sanctuary) {
                return Err(GameError::InvalidTarget(at.key()));
            }
            session.player_mut(player_id)?.heal_full();
            spend_action(session, player_id)
        })?;

        self.tracking.track_sanctuary_used(session_id, &at);
        self.events.broadcast(
            session_id,
            GameEvent::SanctuaryUsed {
                session_id: session_id.to_string(),
                player_id: player_id.to_string(),
                at,
            },
        );
        self.after_action(session_id, spent)
    }

    /// Admin-only relocation to any free walkable tile. Costs nothing.
    pub fn teleport(&self, session_id: &str, player_id: &str, to: Coordinate) -> Result<(), SessionError> {
        let result = self.teleport_inner(session_id, player_id, to);
        self.observe("teleport", session_id, result)
    }

    fn teleport_inner(&self, session_id: &str, player_id: &str, to: Coordinate) -> Result<(), SessionError> {
        let from = self.store.update(session_id, |session| {
            ensure_playing(session)?;
            if !session.admin_mode {
                return Err(GameError::AdminModeRequired);
            }
            rules::validate_turn(session, player_id)?;
            if session.combat.is_some() {
                return Err(GameError::AlreadyInCombat);
            }
            let walkable = session.grid.tile(&to).is_some_and(|t| t.is_walkable());
            if !walkable || session.player_at(&to).is_some() {
                return Err(GameError::TileUnreachable(to.key()));
            }
            let player = session.player_mut(player_id)?;
            let from = player
                .position
                .ok_or_else(|| GameError::TileUnreachable(to.key()))?;
            player.position = Some(to);
            Ok(from)
        })?;

        self.occupancy.vacate(session_id, from);
        self.occupancy.occupy(session_id, to, player_id);
        self.tracking.track_teleportation(session_id);
        self.tracking.track_tile_visited(session_id, player_id, &to);
        self.events.broadcast(
            session_id,
            GameEvent::PlayerTeleported {
                session_id: session_id.to_string(),
                player_id: player_id.to_string(),
                from,
                to,
            },
        );
        Ok(())
    }

    /// Opens a combat against an adjacent opponent. The turn clock is paused
    /// until the combat ends.
    pub fn attack(&self, session_id: &str, attacker_id: &str, target_id: &str) -> Result<(), SessionError> {
        let result = self.attack_inner(session_id, attacker_id, target_id);
        self.observe("attack", session_id, result)
    }

    fn attack_inner(&self, session_id: &str, attacker_id: &str, target_id: &str) -> Result<(), SessionError> {
        let (attacker_effect, target_effect) = self.store.update(session_id, |session| {
            ensure_idle_turn(session, attacker_id)?;
            let target = session
                .player(target_id)
                .map_err(|_| GameError::InvalidTarget(target_id.to_string()))?;
            if !target.in_game || !session.are_opponents(attacker_id, target_id) {
                return Err(GameError::InvalidTarget(target_id.to_string()));
            }
            let target_position = target
                .position
                .ok_or_else(|| GameError::InvalidTarget(target_id.to_string()))?;
            rules::validate_adjacent(session.player(attacker_id)?, &target_position)?;

            let attacker_effect = session.tile_effect_under(attacker_id);
            let target_effect = session.tile_effect_under(target_id);
            session.combat = Some(CombatState {
                attacker_id: attacker_id.to_string(),
                target_id: target_id.to_string(),
                current_fighter: attacker_id.to_string(),
                attacker_tile_effect: attacker_effect,
                target_tile_effect: target_effect,
            });
            spend_action(session, attacker_id)?;
            Ok((attacker_effect, target_effect))
        })?;

        self.turns.force_stop_timer(session_id);
        self.combat.start_combat_timer(
            session_id,
            attacker_id,
            target_id,
            attacker_effect,
            target_effect,
        );
        Ok(())
    }

    /// One exchange by the fighter whose turn it is in the combat.
    pub fn combat_attack(&self, session_id: &str, player_id: &str) -> Result<(), SessionError> {
        let result = self.combat_attack_inner(session_id, player_id);
        self.observe("combat_attack", session_id, result)
    }

    fn combat_attack_inner(&self, session_id: &str, player_id: &str) -> Result<(), SessionError> {
        let (defender_id, lost, defeated) = self.store.update(session_id, |session| {
            let combat = current_exchange(session, player_id)?;
            let defender_id = combat
                .opponent_of(player_id)
                .cloned()
                .ok_or(GameError::NotInCombat)?;
            let damage = rules::combat_damage(
                session.player(player_id)?.attack(),
                combat.tile_effect_of(player_id),
                session.player(&defender_id)?.defense(),
                combat.tile_effect_of(&defender_id),
            );
            let defender = session.player_mut(&defender_id)?;
            let lost = defender.take_damage(damage);
            let defeated = defender.is_defeated();
            if !defeated {
                if let Some(state) = session.combat.as_mut() {
                    state.current_fighter = defender_id.clone();
                }
            }
            Ok((defender_id, lost, defeated))
        })?;

        self.tracking
            .track_damage(session_id, player_id, &defender_id, lost);
        tracing::debug!(
            session_id = %session_id,
            attacker_id = %player_id,
            defender_id = %defender_id,
            damage = lost,
            defeated,
            "combat exchange"
        );

        if defeated {
            self.finish_combat(
                session_id,
                CombatOutcome::Victory {
                    winner: player_id.to_string(),
                    loser: defender_id,
                },
            )
        } else {
            self.combat.force_next_loop(session_id);
            Ok(())
        }
    }

    /// Walks away from the combat; it ends as a draw.
    pub fn combat_evade(&self, session_id: &str, player_id: &str) -> Result<(), SessionError> {
        let result = self
            .store
            .update(session_id, |session| current_exchange(session, player_id).map(|_| ()))
            .and_then(|()| self.finish_combat(session_id, CombatOutcome::Draw));
        self.observe("combat_evade", session_id, result)
    }

    fn finish_combat(&self, session_id: &str, outcome: CombatOutcome) -> Result<(), SessionError> {
        self.combat.stop_combat_timer(session_id);
        let wins_to_victory = self.settings.wins_to_victory;
        let (respawn, victory) = self.store.update(session_id, |session| {
            let combat = session.combat.take().ok_or(GameError::NotInCombat)?;
            for id in [&combat.attacker_id, &combat.target_id] {
                session.player_mut(id)?.combat.count += 1;
            }
            match &outcome {
                CombatOutcome::Draw => {
                    for id in [&combat.attacker_id, &combat.target_id] {
                        session.player_mut(id)?.combat.draws += 1;
                    }
                    Ok((None, false))
                }
                CombatOutcome::Victory { winner, loser } => {
                    let wins = {
                        let record = &mut session.player_mut(winner)?.combat;
                        record.wins += 1;
                        record.wins
                    };
                    session.player_mut(loser)?.combat.losses += 1;
                    let respawned = respawn(session, loser)?;
                    let victory = session.mode == GameMode::Classic && wins >= wins_to_victory;
                    if victory {
                        session.winner = Some(winner.clone());
                    }
                    Ok((respawned, victory))
                }
            }
        })?;

        if let Some(respawn) = &respawn {
            if let CombatOutcome::Victory { loser, .. } = &outcome {
                if let Some(from) = respawn.from {
                    self.occupancy.vacate(session_id, from);
                }
                self.occupancy.occupy(session_id, respawn.to, loser);
            }
        }
        let (winner_id, loser_id) = match outcome {
            CombatOutcome::Victory { winner, loser } => (Some(winner), Some(loser)),
            CombatOutcome::Draw => (None, None),
        };
        tracing::info!(
            session_id = %session_id,
            winner_id = ?winner_id,
            loser_id = ?loser_id,
            "combat ended"
        );
        self.events.broadcast(
            session_id,
            GameEvent::CombatEnded {
                session_id: session_id.to_string(),
                winner_id,
                loser_id,
            },
        );

        if victory {
            self.end_game_inner(session_id)?;
        } else {
            self.turns
                .next_turn(session_id, self.settings.turn_duration())?;
        }
        Ok(())
    }

    pub fn end_turn(&self, session_id: &str, player_id: &str) -> Result<(), SessionError> {
        let result = self
            .store
            .read(session_id, |session| -> Result<u32, GameError> {
                ensure_playing(session)?;
                rules::validate_turn(session, player_id)?;
                if session.combat.is_some() {
                    return Err(GameError::AlreadyInCombat);
                }
                session
                    .turn
                    .as_ref()
                    .map(|t| t.turn_number)
                    .ok_or(GameError::TurnOrderUndefined)
            })
            .and_then(|checked| checked.map_err(SessionError::from))
            .and_then(|turn_number| self.turns.end_turn_if_current(session_id, turn_number))
            .map(|_| ());
        self.observe("end_turn", session_id, result)
    }

    /// Removes a player from play. Ends their turn or combat if they were in
    /// one, and ends the game when fewer than two players remain.
    pub fn player_left(&self, session_id: &str, player_id: &str) -> Result<(), SessionError> {
        let result = self.player_left_inner(session_id, player_id);
        self.observe("player_left", session_id, result)
    }

    fn player_left_inner(&self, session_id: &str, player_id: &str) -> Result<(), SessionError> {
        let departure = self.store.update(session_id, |session| {
            let game_over = session.is_over();
            let was_active = session.active_player_id().is_some_and(|id| id == player_id);
            let player = session.player_mut(player_id)?;
            if !player.in_game {
                return Ok(None);
            }
            player.in_game = false;
            player.joined = false;
            let position = player.position.take();
            let dropped_flag = std::mem::take(&mut player.has_flag);
            if let (true, Some(at)) = (dropped_flag, position) {
                session
                    .placeables
                    .push(Placeable::new(PlaceableKind::Flag, at));
            }
            if !was_active {
                // the active player's successor is computed from their slot
                session.turn_order.retain(|id| id != player_id);
            }
            let combat_opponent = session
                .combat
                .as_ref()
                .and_then(|c| c.opponent_of(player_id).cloned());
            if combat_opponent.is_some() {
                session.combat = None;
            }
            Ok(Some(Departure {
                game_over,
                position,
                was_active,
                combat_opponent,
            }))
        })?;
        let Some(departure) = departure else {
            return Ok(());
        };

        if let Some(at) = departure.position {
            self.occupancy.vacate(session_id, at);
        }
        tracing::info!(session_id = %session_id, player_id = %player_id, "player left");
        self.events.broadcast(
            session_id,
            GameEvent::PlayerLeft {
                session_id: session_id.to_string(),
                player_id: player_id.to_string(),
            },
        );
        if departure.game_over {
            return Ok(());
        }

        if let Some(opponent) = &departure.combat_opponent {
            self.combat.stop_combat_timer(session_id);
            self.events.broadcast(
                session_id,
                GameEvent::CombatEnded {
                    session_id: session_id.to_string(),
                    winner_id: Some(opponent.clone()),
                    loser_id: Some(player_id.to_string()),
                },
            );
        }
        if departure.was_active {
            self.turns.force_end_turn(session_id)?;
        } else if departure.combat_opponent.is_some() {
            // the combat paused the active player's clock
            self.turns
                .next_turn(session_id, self.settings.turn_duration())?;
        }

        let remaining = self.store.update(session_id, |session| {
            session.turn_order.retain(|id| id != player_id);
            let remaining = session.in_game_player_ids();
            if remaining.len() < 2 {
                session.winner = remaining.first().cloned();
            }
            Ok(remaining.len())
        })?;
        if remaining < 2 {
            self.turns.force_stop_timer(session_id);
            self.end_game_inner(session_id)?;
        }
        Ok(())
    }

    /// Ends the game now, with whatever winner the session records (possibly
    /// none). The session stays readable until [`remove_session`](Self::remove_session).
    pub fn end_game(&self, session_id: &str) -> Result<Arc<GameStatistics>, SessionError> {
        let result = self.end_game_inner(session_id);
        self.observe("end_game", session_id, result)
    }

    fn end_game_inner(&self, session_id: &str) -> Result<Arc<GameStatistics>, SessionError> {
        self.store.update(session_id, |session| {
            if session.finished {
                return Err(GameError::GameOver);
            }
            session.finished = true;
            Ok(())
        })?;
        self.turns.force_stop_timer(session_id);
        self.combat.stop_combat_timer(session_id);

        let report = self.statistics.finalize(session_id)?;
        self.events.broadcast(
            session_id,
            GameEvent::GameEnded {
                session_id: session_id.to_string(),
                statistics: (*report).clone(),
            },
        );
        tracing::info!(
            session_id = %session_id,
            winner_id = ?report.winner_id,
            "game ended"
        );
        Ok(report)
    }

    pub fn remove_session(&self, session_id: &str) -> Result<(), SessionError> {
        self.turns.force_stop_timer(session_id);
        self.combat.stop_combat_timer(session_id);
        self.tracking.discard(session_id);
        self.occupancy.clear_session(session_id);
        let result = self.store.remove(session_id);
        if result.is_ok() {
            self.events.drop_session(session_id);
            tracing::info!(session_id = %session_id, "session removed");
        }
        self.observe("remove_session", session_id, result)
    }

    /// Cancels every pending timer of every session.
    pub fn shutdown(&self) {
        self.turns.shutdown();
        self.combat.shutdown();
        self.statistics.shutdown();
    }

    fn after_action(&self, session_id: &str, spent: ActionSpent) -> Result<(), SessionError> {
        // post-action guard: out of actions with no movement left
        if spent.exhausted {
            self.turns.end_turn_if_current(session_id, spent.turn_number)?;
        }
        Ok(())
    }
}

fn ensure_playing(session: &Session) -> Result<(), GameError> {
    if session.is_over() {
        return Err(GameError::GameOver);
    }
    Ok(())
}

/// Active player, action available, no combat running.
fn ensure_idle_turn(session: &Session, player_id: &str) -> Result<(), GameError> {
    ensure_playing(session)?;
    rules::validate_action_budget(session, player_id)?;
    if session.combat.is_some() {
        return Err(GameError::AlreadyInCombat);
    }
    Ok(())
}

fn current_exchange(session: &Session, player_id: &str) -> Result<CombatState, GameError> {
    ensure_playing(session)?;
    let combat = session.combat.clone().ok_or(GameError::NotInCombat)?;
    if combat.current_fighter != player_id {
        return Err(GameError::NotYourTurn {
            expected: combat.current_fighter,
            actual: player_id.to_string(),
        });
    }
    Ok(combat)
}

fn spend_action(session: &mut Session, player_id: &str) -> Result<ActionSpent, GameError> {
    let player = session.player_mut(player_id)?;
    player.actions_left = player.actions_left.saturating_sub(1);
    let out_of_actions = player.actions_left == 0;
    let exhausted = out_of_actions && player.movement_left == 0;
    let turn = session.turn.as_mut().ok_or(GameError::TurnOrderUndefined)?;
    turn.has_used_action = out_of_actions;
    Ok(ActionSpent {
        exhausted,
        turn_number: turn.turn_number,
    })
}

/// Sends a defeated player back to their start point (or the nearest free
/// tile) at full health. A carried flag drops where they fell.
fn respawn(session: &mut Session, player_id: &str) -> Result<Option<Respawn>, GameError> {
    let player = session.player(player_id)?;
    let from = player.position;
    let home = player.start_point.or(from);
    let carried_flag = player.has_flag;

    let to = home.and_then(|home| session.nearest_free_tile(home, player_id));
    if let (true, Some(at)) = (carried_flag, from) {
        session
            .placeables
            .push(Placeable::new(PlaceableKind::Flag, at));
    }

    let player = session.player_mut(player_id)?;
    player.heal_full();
    player.has_flag = false;
    let Some(to) = to else {
        return Ok(None);
    };
    player.position = Some(to);
    Ok(Some(Respawn { from, to }))
}
