use crate::definition::{GameDefinition, GameMode, Placeable, PlaceableKind};
use crate::errors::GameError;
use crate::grid::{Coordinate, Grid, TileEffect};
use crate::player::{Player, PlayerId, PlayerSeed};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

pub type SessionId = String;

/// Whose turn it is. `active_player_id` is always a member of the turn order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnState {
    pub turn_number: u32,
    pub active_player_id: PlayerId,
    pub has_used_action: bool,
    /// False while the transition into this turn is pending. The active
    /// player cannot act or end the turn until it flips.
    #[serde(default)]
    pub started: bool,
}

impl TurnState {
    pub fn first(active_player_id: PlayerId) -> Self {
        Self {
            turn_number: 1,
            active_player_id,
            has_used_action: false,
            started: true,
        }
    }

    /// The state that follows this one, handing the turn to `next_player_id`.
    pub fn advance(&self, next_player_id: PlayerId) -> Self {
        Self {
            turn_number: self.turn_number + 1,
            active_player_id: next_player_id,
            has_used_action: false,
            started: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    Red,
    Blue,
}

/// An ongoing encounter between two players.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatState {
    pub attacker_id: PlayerId,
    pub target_id: PlayerId,
    /// Fighter whose exchange it is.
    pub current_fighter: PlayerId,
    pub attacker_tile_effect: Option<TileEffect>,
    pub target_tile_effect: Option<TileEffect>,
}

impl CombatState {
    pub fn opponent_of(&self, player_id: &str) -> Option<&PlayerId> {
        if self.attacker_id == player_id {
            Some(&self.target_id)
        } else if self.target_id == player_id {
            Some(&self.attacker_id)
        } else {
            None
        }
    }

    pub fn involves(&self, player_id: &str) -> bool {
        self.opponent_of(player_id).is_some()
    }

    pub fn tile_effect_of(&self, player_id: &str) -> Option<TileEffect> {
        if self.attacker_id == player_id {
            self.attacker_tile_effect
        } else {
            self.target_tile_effect
        }
    }
}

/// Lobby data handed over when a waiting room transitions into play.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitingRoom {
    /// Access code of the room; becomes the session id.
    pub code: String,
    pub game_id: String,
    pub players: Vec<PlayerSeed>,
    #[serde(default)]
    pub admin_mode: bool,
}

/// Authoritative state of one running game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub game_id: String,
    pub mode: GameMode,
    pub grid: Grid,
    /// Flags and sanctuaries still on the map; start points are consumed at setup.
    pub placeables: Vec<Placeable>,
    pub players: HashMap<PlayerId, Player>,
    pub teams: HashMap<PlayerId, Team>,
    /// `None` until the first turn starts.
    pub turn: Option<TurnState>,
    pub turn_order: Vec<PlayerId>,
    pub start_points: HashMap<PlayerId, Coordinate>,
    pub admin_mode: bool,
    pub game_started_at: DateTime<Utc>,
    pub combat: Option<CombatState>,
    pub winner: Option<PlayerId>,
    /// Set when the game ends, with or without a winner.
    #[serde(default)]
    pub finished: bool,
}

impl Session {
    /// Builds a session from a waiting room. Rejects rooms that list a player twice.
    pub fn from_waiting_room(
        room: WaitingRoom,
        definition: &GameDefinition,
        mode: GameMode,
        now: DateTime<Utc>,
    ) -> Result<Self, GameError> {
        let mut players = HashMap::with_capacity(room.players.len());
        for seed in room.players {
            if players.contains_key(&seed.id) {
                return Err(GameError::PlayerAlreadyJoined(seed.id));
            }
            players.insert(seed.id.clone(), Player::from_seed(seed));
        }

        let placeables = definition
            .placeables
            .iter()
            .filter(|p| p.kind != PlaceableKind::StartPoint)
            .copied()
            .collect();

        Ok(Self {
            id: room.code,
            game_id: room.game_id,
            mode,
            grid: definition.grid.clone(),
            placeables,
            players,
            teams: HashMap::new(),
            turn: None,
            turn_order: Vec::new(),
            start_points: HashMap::new(),
            admin_mode: room.admin_mode,
            game_started_at: now,
            combat: None,
            winner: None,
            finished: false,
        })
    }

    pub fn map_size(&self) -> usize {
        self.grid.size()
    }

    pub fn has_started(&self) -> bool {
        self.turn.is_some()
    }

    pub fn is_over(&self) -> bool {
        self.finished || self.winner.is_some()
    }

    pub fn active_player_id(&self) -> Option<&PlayerId> {
        self.turn.as_ref().map(|t| &t.active_player_id)
    }

    pub fn player(&self, id: &str) -> Result<&Player, GameError> {
        self.players
            .get(id)
            .ok_or_else(|| GameError::SessionOrPlayerNotFound(id.to_string()))
    }

    pub fn player_mut(&mut self, id: &str) -> Result<&mut Player, GameError> {
        self.players
            .get_mut(id)
            .ok_or_else(|| GameError::SessionOrPlayerNotFound(id.to_string()))
    }

    pub fn player_at(&self, at: &Coordinate) -> Option<&Player> {
        self.players
            .values()
            .find(|p| p.in_game && p.position.as_ref() == Some(at))
    }

    pub fn in_game_player_ids(&self) -> Vec<PlayerId> {
        self.turn_order
            .iter()
            .filter(|id| self.players.get(*id).is_some_and(|p| p.in_game))
            .cloned()
            .collect()
    }

    /// Opponents are everyone still in the game except teammates.
    pub fn are_opponents(&self, a: &str, b: &str) -> bool {
        if a == b {
            return false;
        }
        match (self.teams.get(a), self.teams.get(b)) {
            (Some(ta), Some(tb)) => ta != tb,
            _ => true,
        }
    }

    pub fn tile_effect_under(&self, player_id: &str) -> Option<TileEffect> {
        let position = self.players.get(player_id)?.position?;
        self.grid.tile(&position)?.effect()
    }

    pub fn placeable_at(&self, at: &Coordinate, kind: PlaceableKind) -> bool {
        self.placeables
            .iter()
            .any(|p| p.kind == kind && p.position == *at)
    }

    pub fn take_placeable(&mut self, at: &Coordinate, kind: PlaceableKind) -> bool {
        let before = self.placeables.len();
        self.placeables
            .retain(|p| !(p.kind == kind && p.position == *at));
        before != self.placeables.len()
    }

    /// Tiles currently taken by players still in the game.
    pub fn occupied_tiles(&self) -> HashSet<Coordinate> {
        self.players
            .values()
            .filter(|p| p.in_game)
            .filter_map(|p| p.position)
            .collect()
    }

    /// Closest walkable tile to `around` not held by anyone but `player_id`.
    /// Ties go to the lowest row, then column.
    pub fn nearest_free_tile(&self, around: Coordinate, player_id: &str) -> Option<Coordinate> {
        let taken: HashSet<Coordinate> = self
            .players
            .values()
            .filter(|p| p.in_game && p.id != player_id)
            .filter_map(|p| p.position)
            .collect();
        self.grid
            .coordinates()
            .filter(|c| !taken.contains(c))
            .filter(|c| self.grid.tile(c).is_some_and(|t| t.is_walkable()))
            .min_by_key(|c| (c.distance(&around), c.y, c.x))
    }
}
