//! # tactica_server: Session Runtime
//!
//! Runs multiplayer turn-based sessions on top of `tactica_engine`: the
//! session and tracking stores, the turn clock, the combat round loop, the
//! statistics service and the orchestrator that ties them together and
//! publishes domain events.
//!
//! Timers are Tokio tasks; every operation that arms one must run inside a
//! Tokio runtime.

pub mod combat;
pub mod errors;
pub mod events;
pub mod initialization;
pub mod logging;
pub mod orchestrator;
pub mod ports;
pub mod settings;
pub mod statistics;
pub mod store;
pub mod timers;
pub mod tracking;
pub mod turn;

pub use combat::CombatTimer;
pub use errors::{ErrorSeverity, SessionError};
pub use events::{EventBus, EventSubscription, GameEvent};
pub use initialization::InitializationService;
pub use logging::{init_logging, init_test_logging, LogEntry, LogFormat, TestLogSubscriber};
pub use orchestrator::{CombatOutcome, SessionOrchestrator};
pub use ports::{
    GameDefinitionSource, GridPathfinder, InMemoryDefinitions, OccupancyMap, OccupancyTracker,
    Path, Pathfinder,
};
pub use settings::{EngineSettings, SettingsError};
pub use statistics::StatisticsService;
pub use store::SessionStore;
pub use tracking::TrackingStore;
pub use turn::{TurnEngine, TurnTimings};
