use thiserror::Error;

/// Rule violations raised synchronously by session operations.
///
/// None of these are retried; the caller decides how to recover.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Turn order is undefined: the session has no players")]
    TurnOrderUndefined,
    #[error("Not enough start points: {available} available, {required} required")]
    NotEnoughStartPoints { required: usize, available: usize },
    #[error("Session already started")]
    SessionAlreadyStarted,
    #[error("Session or player not found: {0}")]
    SessionOrPlayerNotFound(String),
    #[error("It's not player {actual}'s turn (expected player {expected})")]
    NotYourTurn { expected: String, actual: String },
    #[error("Turn {0} has not started yet")]
    TurnNotStarted(u32),
    #[error("No actions remaining this turn")]
    NoActionsRemaining,
    #[error("Player already joined: {0}")]
    PlayerAlreadyJoined(String),
    #[error("Tile {0} is not reachable")]
    TileUnreachable(String),
    #[error("Tile {0} is not adjacent")]
    NotAdjacent(String),
    #[error("Invalid target: {0}")]
    InvalidTarget(String),
    #[error("No combat in progress")]
    NotInCombat,
    #[error("A combat is already in progress")]
    AlreadyInCombat,
    #[error("Admin mode required")]
    AdminModeRequired,
    #[error("Game not found: {0}")]
    GameNotFound(String),
    #[error("Game is over")]
    GameOver,
}
