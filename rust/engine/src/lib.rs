//! # tactica-engine: Turn-Based Grid Game Core
//!
//! Synchronous domain model for multiplayer sessions played on a square grid:
//! maps, players, the session record, turn-order computation, action rules,
//! tracking counters and the end-of-game statistics report.
//!
//! Nothing in this crate schedules timers or performs I/O; the async runtime
//! side lives in `tactica_server`.
//!
//! ## Core Modules
//!
//! - [`grid`] - Coordinates, tile kinds and the square grid
//! - [`definition`] - Authored games: map, mode and placeables
//! - [`player`] - Player stats, budgets and combat counters
//! - [`session`] - Session record, turn state and combat state
//! - [`setup`] - Turn order and start-point assignment
//! - [`rules`] - Turn, budget and adjacency validation, combat damage
//! - [`tracker`] - Per-session accumulation counters
//! - [`statistics`] - Statistics report computation
//! - [`errors`] - Error types for game operations
//!
//! ## Quick Start
//!
//! ```rust
//! use tactica_engine::definition::{GameDefinition, GameMode};
//! use tactica_engine::player::{PlayerSeed, DEFAULT_STATS};
//! use tactica_engine::session::{Session, WaitingRoom};
//! use tactica_engine::setup::{assign_start_points, make_turn_order};
//!
//! let definition = GameDefinition::arena("demo", 10, GameMode::Classic, 2);
//! let room = WaitingRoom {
//!     code: "4242".into(),
//!     game_id: "demo".into(),
//!     players: vec![
//!         PlayerSeed::new("a", "Ana", DEFAULT_STATS),
//!         PlayerSeed::new("b", "Bo", DEFAULT_STATS),
//!     ],
//!     admin_mode: false,
//! };
//! let mut session =
//!     Session::from_waiting_room(room, &definition, GameMode::Classic, chrono::Utc::now())
//!         .expect("valid room");
//!
//! let mut rng = rand::rng();
//! session.turn_order = make_turn_order(session.players.values(), &mut rng);
//! let placements = assign_start_points(&mut session, &definition, &mut rng).expect("enough points");
//! assert_eq!(placements.len(), 2);
//! ```

pub mod definition;
pub mod errors;
pub mod grid;
pub mod player;
pub mod rules;
pub mod session;
pub mod setup;
pub mod statistics;
pub mod tracker;
