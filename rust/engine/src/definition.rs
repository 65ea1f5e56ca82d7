use crate::grid::{Coordinate, Grid, TileKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    Classic,
    CaptureTheFlag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceableKind {
    StartPoint,
    Flag,
    Sanctuary,
}

/// An object authored onto the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placeable {
    pub kind: PlaceableKind,
    pub position: Coordinate,
}

impl Placeable {
    pub fn new(kind: PlaceableKind, position: Coordinate) -> Self {
        Self { kind, position }
    }
}

/// Authored game: map, mode and placeables. Read once when a session starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameDefinition {
    pub id: String,
    pub name: String,
    pub mode: GameMode,
    pub grid: Grid,
    pub placeables: Vec<Placeable>,
}

impl GameDefinition {
    pub fn size(&self) -> usize {
        self.grid.size()
    }

    pub fn start_points(&self) -> Vec<Coordinate> {
        self.positions_of(PlaceableKind::StartPoint)
    }

    pub fn positions_of(&self, kind: PlaceableKind) -> Vec<Coordinate> {
        self.placeables
            .iter()
            .filter(|p| p.kind == kind)
            .map(|p| p.position)
            .collect()
    }

    /// Denominators used by the statistics report.
    pub fn tracker_totals(&self) -> TrackerTotals {
        TrackerTotals {
            total_tiles: self.grid.walkable_tile_count(),
            total_doors: self.grid.door_count(),
            total_sanctuaries: self.positions_of(PlaceableKind::Sanctuary).len(),
            total_teleport_tiles: self.grid.teleport_count(),
        }
    }

    /// Open square arena with start points along the border, a sanctuary in the
    /// middle and a door next to it. Used by the simulator and tests.
    pub fn arena(id: impl Into<String>, size: usize, mode: GameMode, start_points: usize) -> Self {
        let mut grid = Grid::filled(size, TileKind::Ground);
        let center = Coordinate::new(size / 2, size / 2);
        let door = Coordinate::new(size / 2, size / 2 + 1);
        grid.set_tile(&door, TileKind::Door { open: false });

        let border: Vec<Coordinate> = grid
            .coordinates()
            .filter(|c| c.x == 0 || c.y == 0 || c.x + 1 == size || c.y + 1 == size)
            .collect();
        let step = (border.len() / start_points.max(1)).max(1);
        let mut placeables: Vec<Placeable> = border
            .iter()
            .step_by(step)
            .take(start_points)
            .map(|c| Placeable::new(PlaceableKind::StartPoint, *c))
            .collect();
        placeables.push(Placeable::new(PlaceableKind::Sanctuary, center));
        if mode == GameMode::CaptureTheFlag {
            placeables.push(Placeable::new(
                PlaceableKind::Flag,
                Coordinate::new(size / 2 + 1, size / 2),
            ));
        }

        let id = id.into();
        Self {
            name: format!("arena-{size}"),
            id,
            mode,
            grid,
            placeables,
        }
    }
}

/// Map-wide totals captured when tracking starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerTotals {
    pub total_tiles: usize,
    pub total_doors: usize,
    pub total_sanctuaries: usize,
    pub total_teleport_tiles: usize,
}
