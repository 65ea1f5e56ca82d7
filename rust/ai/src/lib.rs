//! # tactica-ai: Virtual Players
//!
//! Bots that drive headless sessions. A bot looks at a session snapshot and
//! proposes the next action for one player; the caller submits it to the
//! orchestrator and asks again once the session changes.
//!
//! ## Core Components
//!
//! - [`Bot`] - Trait defining the decision interface
//! - [`BotAction`] - The actions a bot can ask for
//! - [`baseline`] - Baseline bot used by the simulator and tests
//! - [`create_bot`] - Factory for bots by name
//!
//! ## Quick Start
//!
//! ```rust
//! use tactica_ai::create_bot;
//!
//! let bot = create_bot("baseline").expect("known bot");
//! assert_eq!(bot.name(), "BaselineBot");
//! ```

use tactica_engine::grid::Coordinate;
use tactica_engine::player::PlayerId;
use tactica_engine::session::Session;

pub mod baseline;

/// An action a bot wants to take, mirroring the orchestrator's action surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotAction {
    Move(Coordinate),
    Attack(PlayerId),
    CombatAttack,
    Evade,
    ToggleDoor(Coordinate),
    EndTurn,
}

/// Decision interface for virtual players.
///
/// # Example Implementation
///
/// ```rust
/// use tactica_ai::{Bot, BotAction};
/// use tactica_engine::session::Session;
///
/// struct Passive;
///
/// impl Bot for Passive {
///     fn decide(&self, session: &Session, player_id: &str) -> Option<BotAction> {
///         let active = session.active_player_id()?;
///         (active == player_id).then_some(BotAction::EndTurn)
///     }
///
///     fn name(&self) -> &str {
///         "Passive"
///     }
/// }
/// ```
pub trait Bot: Send + Sync {
    /// The next action for `player_id`, or `None` when the player has nothing
    /// to do right now (not their turn, or waiting on an opponent in combat).
    fn decide(&self, session: &Session, player_id: &str) -> Option<BotAction>;

    fn name(&self) -> &str;
}

/// Creates a bot by name. Returns `None` for unknown names.
///
/// Supported names: `"baseline"`.
///
/// ```rust
/// use tactica_ai::create_bot;
///
/// assert!(create_bot("baseline").is_some());
/// assert!(create_bot("grandmaster").is_none());
/// ```
pub fn create_bot(name: &str) -> Option<Box<dyn Bot>> {
    match name {
        "baseline" => Some(Box::new(baseline::BaselineBot::new())),
        _ => None,
    }
}
