//! End-of-game report computed from the tracker and the final session state.

use crate::player::PlayerId;
use crate::session::Session;
use crate::tracker::GameTracker;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStatistics {
    pub player_id: PlayerId,
    pub name: String,
    pub combat_count: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub health_lost: u32,
    pub health_dealt: u32,
    pub tiles_visited_percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalStatistics {
    /// `minutes:seconds`, seconds zero-padded.
    pub duration: String,
    pub total_turns: u32,
    pub tiles_visited_percentage: u32,
    pub doors_manipulated_percentage: u32,
    pub sanctuaries_used_percentage: u32,
    pub teleportations: u32,
    pub flag_holders: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStatistics {
    pub winner_id: Option<PlayerId>,
    pub winner_name: Option<String>,
    pub players: Vec<PlayerStatistics>,
    pub global: GlobalStatistics,
}

/// `round(part / total * 100)`, or 0 when `total` is 0.
///
/// ```
/// use tactica_engine::statistics::percentage;
///
/// assert_eq!(percentage(10, 225), 4);
/// assert_eq!(percentage(3, 0), 0);
/// ```
pub fn percentage(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (part as f64 / total as f64 * 100.0).round() as u32
}

/// Formats elapsed milliseconds as `m:ss`.
///
/// ```
/// use tactica_engine::statistics::format_duration;
///
/// assert_eq!(format_duration(1_000_000), "16:40");
/// assert_eq!(format_duration(30_000), "0:30");
/// ```
pub fn format_duration(elapsed_ms: i64) -> String {
    let total_seconds = elapsed_ms.max(0) / 1000;
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// Builds the report at `now`. Players are listed in turn order, followed by
/// anyone who already left the turn order.
pub fn compute(session: &Session, tracker: &GameTracker, now: DateTime<Utc>) -> GameStatistics {
    let mut ids: Vec<&PlayerId> = session.turn_order.iter().collect();
    let mut others: Vec<&PlayerId> = session
        .players
        .keys()
        .filter(|id| !session.turn_order.contains(*id))
        .collect();
    others.sort();
    ids.extend(others);

    let players = ids
        .into_iter()
        .filter_map(|id| session.players.get(id))
        .map(|player| {
            let damage = tracker
                .player_damage
                .get(&player.id)
                .copied()
                .unwrap_or_default();
            PlayerStatistics {
                player_id: player.id.clone(),
                name: player.name.clone(),
                combat_count: player.combat.count,
                wins: player.combat.wins,
                losses: player.combat.losses,
                draws: player.combat.draws,
                health_lost: damage.health_lost,
                health_dealt: damage.health_dealt,
                tiles_visited_percentage: percentage(
                    tracker.visited_by(&player.id),
                    tracker.total_tiles,
                ),
            }
        })
        .collect();

    let elapsed_ms = (now - session.game_started_at).num_milliseconds();
    let global = GlobalStatistics {
        duration: format_duration(elapsed_ms),
        total_turns: session.turn.as_ref().map_or(0, |t| t.turn_number),
        tiles_visited_percentage: percentage(tracker.visited_by_anyone(), tracker.total_tiles),
        doors_manipulated_percentage: percentage(tracker.toggled_doors.len(), tracker.total_doors),
        sanctuaries_used_percentage: percentage(
            tracker.used_sanctuaries.len(),
            tracker.total_sanctuaries,
        ),
        teleportations: tracker.teleportations,
        flag_holders: tracker.flag_holders.len(),
    };

    let winner_name = session
        .winner
        .as_ref()
        .and_then(|id| session.players.get(id))
        .map(|p| p.name.clone());

    GameStatistics {
        winner_id: session.winner.clone(),
        winner_name,
        players,
        global,
    }
}
