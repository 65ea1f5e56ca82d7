use crate::definition::TrackerTotals;
use crate::grid::Coordinate;
use crate::player::PlayerId;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Health exchanged by one player during the game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageTally {
    pub health_lost: u32,
    pub health_dealt: u32,
}

/// Per-session accumulation counters. Every insertion has set semantics, so
/// recording the same tile, door, sanctuary or holder twice changes nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameTracker {
    pub player_tiles: HashMap<PlayerId, HashSet<String>>,
    pub total_tiles: usize,
    pub teleportations: u32,
    pub toggled_doors: HashSet<String>,
    pub used_sanctuaries: HashSet<String>,
    pub total_doors: usize,
    pub total_sanctuaries: usize,
    pub total_teleport_tiles: usize,
    pub flag_holders: HashSet<PlayerId>,
    pub player_damage: HashMap<PlayerId, DamageTally>,
}

impl GameTracker {
    pub fn new(totals: TrackerTotals) -> Self {
        Self {
            total_tiles: totals.total_tiles,
            total_doors: totals.total_doors,
            total_sanctuaries: totals.total_sanctuaries,
            total_teleport_tiles: totals.total_teleport_tiles,
            ..Self::default()
        }
    }

    pub fn tile_visited(&mut self, player_id: &str, at: &Coordinate) {
        self.player_tiles
            .entry(player_id.to_string())
            .or_default()
            .insert(at.key());
    }

    pub fn teleported(&mut self) {
        self.teleportations += 1;
    }

    pub fn door_toggled(&mut self, at: &Coordinate) {
        self.toggled_doors.insert(at.key());
    }

    pub fn sanctuary_used(&mut self, at: &Coordinate) {
        self.used_sanctuaries.insert(at.key());
    }

    pub fn flag_held_by(&mut self, player_id: &str) {
        self.flag_holders.insert(player_id.to_string());
    }

    pub fn damage_dealt(&mut self, player_id: &str, amount: u32) {
        self.player_damage
            .entry(player_id.to_string())
            .or_default()
            .health_dealt += amount;
    }

    pub fn damage_received(&mut self, player_id: &str, amount: u32) {
        self.player_damage
            .entry(player_id.to_string())
            .or_default()
            .health_lost += amount;
    }

    pub fn visited_by(&self, player_id: &str) -> usize {
        self.player_tiles.get(player_id).map_or(0, |tiles| tiles.len())
    }

    /// Tiles visited by at least one player.
    pub fn visited_by_anyone(&self) -> usize {
        self.player_tiles
            .values()
            .flatten()
            .collect::<HashSet<_>>()
            .len()
    }
}
