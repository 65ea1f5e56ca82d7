//! Seams to services that live outside the session runtime: where game
//! definitions come from, who keeps the shared occupancy map, and how paths are
//! computed. Each comes with an in-process implementation.
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::sync::{PoisonError, RwLock};
use tactica_engine::definition::GameDefinition;
use tactica_engine::grid::Coordinate;
use tactica_engine::player::PlayerId;
use tactica_engine::session::{Session, SessionId};

pub trait GameDefinitionSource: Send + Sync {
    fn definition(&self, game_id: &str) -> Option<GameDefinition>;
}

#[derive(Debug, Default)]
pub struct InMemoryDefinitions {
    games: RwLock<HashMap<String, GameDefinition>>,
}

impl InMemoryDefinitions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, definition: GameDefinition) {
        self.games
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(definition.id.clone(), definition);
    }
}

impl GameDefinitionSource for InMemoryDefinitions {
    fn definition(&self, game_id: &str) -> Option<GameDefinition> {
        self.games
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(game_id)
            .cloned()
    }
}

/// Which player stands on which tile, as seen by map renderers and other
/// services outside the session record.
pub trait OccupancyTracker: Send + Sync {
    fn occupy(&self, session_id: &str, at: Coordinate, player_id: &str);
    fn vacate(&self, session_id: &str, at: Coordinate);
    fn clear_session(&self, session_id: &str);
}

#[derive(Debug, Default)]
pub struct OccupancyMap {
    tiles: RwLock<HashMap<SessionId, HashMap<Coordinate, PlayerId>>>,
}

impl OccupancyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn occupant(&self, session_id: &str, at: &Coordinate) -> Option<PlayerId> {
        self.tiles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(session_id)
            .and_then(|tiles| tiles.get(at))
            .cloned()
    }

    pub fn occupied_count(&self, session_id: &str) -> usize {
        self.tiles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(session_id)
            .map_or(0, HashMap::len)
    }
}

impl OccupancyTracker for OccupancyMap {
    fn occupy(&self, session_id: &str, at: Coordinate, player_id: &str) {
        self.tiles
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(session_id.to_string())
            .or_default()
            .insert(at, player_id.to_string());
    }

    fn vacate(&self, session_id: &str, at: Coordinate) {
        if let Some(tiles) = self
            .tiles
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(session_id)
        {
            tiles.remove(&at);
        }
    }

    fn clear_session(&self, session_id: &str) {
        self.tiles
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(session_id);
    }
}

/// A route to a destination: the tiles entered in order (the destination last)
/// and the movement points they cost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    pub tiles: Vec<Coordinate>,
    pub cost: u32,
}

pub trait Pathfinder: Send + Sync {
    /// Cheapest route for `player_id` from its position to `to` within
    /// `budget` movement points, or `None` when the tile cannot be reached.
    fn find_path(&self, session: &Session, player_id: &str, to: Coordinate, budget: u32) -> Option<Path>;
}

/// Dijkstra over tile move costs. Tiles held by other players block the way.
#[derive(Debug, Default, Clone, Copy)]
pub struct GridPathfinder;

impl Pathfinder for GridPathfinder {
    fn find_path(&self, session: &Session, player_id: &str, to: Coordinate, budget: u32) -> Option<Path> {
        let from = session.players.get(player_id)?.position?;
        if from == to || !session.grid.contains(&to) {
            return None;
        }
        let size = session.map_size();
        let blocked = session.occupied_tiles();

        let mut best: HashMap<Coordinate, u32> = HashMap::from([(from, 0)]);
        let mut previous: HashMap<Coordinate, Coordinate> = HashMap::new();
        let mut frontier = BinaryHeap::from([Reverse((0u32, from.x, from.y))]);

        while let Some(Reverse((cost, x, y))) = frontier.pop() {
            let at = Coordinate::new(x, y);
            if at == to {
                break;
            }
            if best.get(&at).is_some_and(|known| *known < cost) {
                continue;
            }
            for next in at.neighbors(size) {
                if blocked.contains(&next) {
                    continue;
                }
                let Some(step) = session.grid.tile(&next).and_then(|t| t.move_cost()) else {
                    continue;
                };
                let total = cost + step;
                if total > budget || best.get(&next).is_some_and(|known| *known <= total) {
                    continue;
                }
                best.insert(next, total);
                previous.insert(next, at);
                frontier.push(Reverse((total, next.x, next.y)));
            }
        }

        let cost = *best.get(&to)?;
        let mut tiles = vec![to];
        let mut cursor = to;
        while let Some(prev) = previous.get(&cursor) {
            if *prev == from {
                break;
            }
            tiles.push(*prev);
            cursor = *prev;
        }
        tiles.reverse();
        Some(Path { tiles, cost })
    }
}
