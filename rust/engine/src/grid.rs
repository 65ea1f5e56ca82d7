use serde::{Deserialize, Serialize};
use std::fmt;

/// A tile position on the square map. `x` is the column, `y` the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: usize,
    pub y: usize,
}

impl Coordinate {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Key used by tracking sets, formatted as `"x,y"`.
    pub fn key(&self) -> String {
        format!("{},{}", self.x, self.y)
    }

    /// Manhattan distance between two tiles.
    pub fn distance(&self, other: &Coordinate) -> usize {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// True when `other` shares an edge with this tile.
    pub fn is_adjacent(&self, other: &Coordinate) -> bool {
        self.distance(other) == 1
    }

    /// Orthogonal neighbours that fall inside a `size` x `size` map.
    pub fn neighbors(&self, size: usize) -> Vec<Coordinate> {
        let mut out = Vec::with_capacity(4);
        if self.x > 0 {
            out.push(Coordinate::new(self.x - 1, self.y));
        }
        if self.x + 1 < size {
            out.push(Coordinate::new(self.x + 1, self.y));
        }
        if self.y > 0 {
            out.push(Coordinate::new(self.x, self.y - 1));
        }
        if self.y + 1 < size {
            out.push(Coordinate::new(self.x, self.y + 1));
        }
        out
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileKind {
    Ground,
    Water,
    Ice,
    Wall,
    Door { open: bool },
    Teleport,
}

impl TileKind {
    /// Walls and closed doors block movement.
    pub fn is_walkable(&self) -> bool {
        !matches!(self, TileKind::Wall | TileKind::Door { open: false })
    }

    /// Movement points spent to enter this tile, `None` when impassable.
    pub fn move_cost(&self) -> Option<u32> {
        match self {
            TileKind::Wall | TileKind::Door { open: false } => None,
            TileKind::Ice => Some(0),
            TileKind::Water => Some(2),
            TileKind::Ground | TileKind::Door { open: true } | TileKind::Teleport => Some(1),
        }
    }

    pub fn is_door(&self) -> bool {
        matches!(self, TileKind::Door { .. })
    }

    /// Combat modifier carried by the tile a fighter stands on.
    pub fn effect(&self) -> Option<TileEffect> {
        match self {
            TileKind::Ice => Some(TileEffect::Ice),
            TileKind::Water => Some(TileEffect::Water),
            _ => None,
        }
    }
}

/// Terrain effect reported in `combat.started` payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileEffect {
    Ice,
    Water,
}

impl TileEffect {
    /// Penalty applied to both attack and defense while fighting on this tile.
    pub fn combat_penalty(&self) -> u32 {
        match self {
            TileEffect::Ice => 2,
            TileEffect::Water => 0,
        }
    }
}

/// Row-major square grid of tiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    size: usize,
    tiles: Vec<TileKind>,
}

impl Grid {
    /// A `size` x `size` grid of ground tiles.
    pub fn filled(size: usize, kind: TileKind) -> Self {
        Self {
            size,
            tiles: vec![kind; size * size],
        }
    }

    /// Builds a grid from rows; returns `None` unless every row has `rows.len()` tiles.
    pub fn from_rows(rows: Vec<Vec<TileKind>>) -> Option<Self> {
        let size = rows.len();
        if rows.iter().any(|row| row.len() != size) {
            return None;
        }
        Some(Self {
            size,
            tiles: rows.into_iter().flatten().collect(),
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn contains(&self, at: &Coordinate) -> bool {
        at.x < self.size && at.y < self.size
    }

    pub fn tile(&self, at: &Coordinate) -> Option<TileKind> {
        if !self.contains(at) {
            return None;
        }
        self.tiles.get(at.y * self.size + at.x).copied()
    }

    pub fn set_tile(&mut self, at: &Coordinate, kind: TileKind) -> bool {
        if !self.contains(at) {
            return false;
        }
        self.tiles[at.y * self.size + at.x] = kind;
        true
    }

    /// Flips an open door closed and vice versa. Returns the new state, or
    /// `None` when the tile is not a door.
    pub fn toggle_door(&mut self, at: &Coordinate) -> Option<bool> {
        match self.tile(at)? {
            TileKind::Door { open } => {
                let next = !open;
                self.set_tile(at, TileKind::Door { open: next });
                Some(next)
            }
            _ => None,
        }
    }

    pub fn coordinates(&self) -> impl Iterator<Item = Coordinate> + '_ {
        (0..self.size).flat_map(move |y| (0..self.size).map(move |x| Coordinate::new(x, y)))
    }

    /// Tiles a player can ever stand on (everything but walls; doors count).
    pub fn walkable_tile_count(&self) -> usize {
        self.tiles
            .iter()
            .filter(|kind| !matches!(kind, TileKind::Wall))
            .count()
    }

    pub fn door_count(&self) -> usize {
        self.tiles.iter().filter(|kind| kind.is_door()).count()
    }

    pub fn teleport_count(&self) -> usize {
        self.tiles
            .iter()
            .filter(|kind| matches!(kind, TileKind::Teleport))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinate_key_matches_tracking_format() {
        assert_eq!(Coordinate::new(3, 7).key(), "3,7");
    }

    #[test]
    fn neighbors_stay_inside_map() {
        let corner = Coordinate::new(0, 0);
        let n = corner.neighbors(5);
        assert_eq!(n.len(), 2);
        assert!(n.contains(&Coordinate::new(1, 0)));
        assert!(n.contains(&Coordinate::new(0, 1)));
    }

    #[test]
    fn doors_toggle_and_block_movement_when_closed() {
        let mut grid = Grid::filled(3, TileKind::Ground);
        let door = Coordinate::new(1, 1);
        grid.set_tile(&door, TileKind::Door { open: false });
        assert_eq!(grid.tile(&door).and_then(|t| t.move_cost()), None);
        assert_eq!(grid.toggle_door(&door), Some(true));
        assert_eq!(grid.tile(&door).and_then(|t| t.move_cost()), Some(1));
        assert_eq!(grid.toggle_door(&Coordinate::new(0, 0)), None);
    }

    #[test]
    fn counts_ignore_walls() {
        let grid = Grid::from_rows(vec![
            vec![TileKind::Ground, TileKind::Wall],
            vec![TileKind::Door { open: true }, TileKind::Teleport],
        ])
        .expect("square grid");
        assert_eq!(grid.walkable_tile_count(), 3);
        assert_eq!(grid.door_count(), 1);
        assert_eq!(grid.teleport_count(), 1);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        assert!(Grid::from_rows(vec![vec![TileKind::Ground], vec![]]).is_none());
    }
}
