//! One-shot computations run when a session is created.

use crate::definition::{GameDefinition, GameMode};
use crate::errors::GameError;
use crate::grid::Coordinate;
use crate::player::{Player, PlayerId};
use crate::session::{Session, Team};
use rand::seq::SliceRandom;
use rand::Rng;

/// Orders players by descending speed. Players with equal speed are shuffled
/// uniformly, so ties come out in a different order from call to call.
///
/// # Examples
///
/// ```
/// use tactica_engine::player::{Player, PlayerSeed, StatBlock};
/// use tactica_engine::setup::make_turn_order;
///
/// let fast = Player::from_seed(PlayerSeed::new("fast", "Fast", StatBlock::new(4, 6, 4, 4)));
/// let slow = Player::from_seed(PlayerSeed::new("slow", "Slow", StatBlock::new(4, 4, 4, 4)));
/// let order = make_turn_order([&slow, &fast], &mut rand::rng());
/// assert_eq!(order, vec!["fast".to_string(), "slow".to_string()]);
/// ```
pub fn make_turn_order<'a, I, R>(players: I, rng: &mut R) -> Vec<PlayerId>
where
    I: IntoIterator<Item = &'a Player>,
    R: Rng + ?Sized,
{
    let mut ranked: Vec<(u32, PlayerId)> = players
        .into_iter()
        .map(|p| (p.speed(), p.id.clone()))
        .collect();
    // shuffle first; the stable sort then keeps the random order inside each speed group
    ranked.shuffle(rng);
    ranked.sort_by(|a, b| b.0.cmp(&a.0));
    ranked.into_iter().map(|(_, id)| id).collect()
}

/// Shuffles the definition's start points and hands them out 1:1 following the
/// turn order. Writes each player's position and start point and returns the
/// placements in turn order.
pub fn assign_start_points<R>(
    session: &mut Session,
    definition: &GameDefinition,
    rng: &mut R,
) -> Result<Vec<(PlayerId, Coordinate)>, GameError>
where
    R: Rng + ?Sized,
{
    let mut points = definition.start_points();
    if points.len() < session.turn_order.len() {
        return Err(GameError::NotEnoughStartPoints {
            required: session.turn_order.len(),
            available: points.len(),
        });
    }
    points.shuffle(rng);

    let mut placements = Vec::with_capacity(session.turn_order.len());
    for (player_id, point) in session.turn_order.clone().into_iter().zip(points) {
        let player = session.player_mut(&player_id)?;
        player.position = Some(point);
        player.start_point = Some(point);
        session.start_points.insert(player_id.clone(), point);
        placements.push((player_id, point));
    }
    Ok(placements)
}

/// Capture-the-flag sessions split players into two teams alternating along
/// the turn order. Other modes have no teams.
pub fn assign_teams(session: &mut Session) {
    session.teams.clear();
    if session.mode != GameMode::CaptureTheFlag {
        return;
    }
    for (idx, id) in session.turn_order.iter().enumerate() {
        let team = if idx % 2 == 0 { Team::Red } else { Team::Blue };
        session.teams.insert(id.clone(), team);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::{PlayerSeed, StatBlock};
    use crate::session::WaitingRoom;
    use chrono::Utc;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn player(id: &str, speed: u32) -> Player {
        Player::from_seed(PlayerSeed::new(id, id, StatBlock::new(4, speed, 4, 4)))
    }

    #[test]
    fn same_seed_gives_same_order() {
        let players = [player("a", 4), player("b", 4), player("c", 4)];
        let first = make_turn_order(&players, &mut ChaCha20Rng::seed_from_u64(9));
        let second = make_turn_order(&players, &mut ChaCha20Rng::seed_from_u64(9));
        assert_eq!(first, second);
    }

    #[test]
    fn ctf_teams_alternate() {
        let def = GameDefinition::arena("g", 10, GameMode::CaptureTheFlag, 4);
        let room = WaitingRoom {
            code: "r".into(),
            game_id: "g".into(),
            players: ["a", "b", "c"]
                .iter()
                .map(|id| PlayerSeed::new(*id, *id, StatBlock::new(4, 4, 4, 4)))
                .collect(),
            admin_mode: false,
        };
        let mut session =
            Session::from_waiting_room(room, &def, GameMode::CaptureTheFlag, Utc::now())
                .expect("session");
        session.turn_order = vec!["c".into(), "a".into(), "b".into()];
        assign_teams(&mut session);
        assert_eq!(session.teams["c"], Team::Red);
        assert_eq!(session.teams["a"], Team::Blue);
        assert_eq!(session.teams["b"], Team::Red);
    }
}
