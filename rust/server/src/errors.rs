//! Error types for the session runtime.
//!
//! Domain rule violations come from `tactica_engine` as [`GameError`] and are
//! wrapped unchanged; the runtime only adds failures of its own shared storage.
use tactica_engine::errors::GameError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Game(#[from] GameError),
    #[error("Session storage poisoned")]
    StoragePoisoned,
}

/// Error classification for logging levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Rule violations - expected, normal operation
    Client,
    /// Unexpected state - needs investigation
    Server,
    /// Critical errors - system integrity at risk
    Critical,
}

impl SessionError {
    pub fn not_found(id: impl Into<String>) -> Self {
        SessionError::Game(GameError::SessionOrPlayerNotFound(id.into()))
    }

    /// The wrapped rule violation, if this is one.
    pub fn game_error(&self) -> Option<&GameError> {
        match self {
            SessionError::Game(err) => Some(err),
            SessionError::StoragePoisoned => None,
        }
    }

    /// Machine-readable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            SessionError::Game(err) => match err {
                GameError::TurnOrderUndefined => "turn_order_undefined",
                GameError::NotEnoughStartPoints { .. } => "not_enough_start_points",
                GameError::SessionAlreadyStarted => "session_already_started",
                GameError::SessionOrPlayerNotFound(_) => "session_or_player_not_found",
                GameError::NotYourTurn { .. } => "not_your_turn",
                GameError::TurnNotStarted(_) => "turn_not_started",
                GameError::NoActionsRemaining => "no_actions_remaining",
                GameError::PlayerAlreadyJoined(_) => "player_already_joined",
                GameError::TileUnreachable(_) => "tile_unreachable",
                GameError::NotAdjacent(_) => "not_adjacent",
                GameError::InvalidTarget(_) => "invalid_target",
                GameError::NotInCombat => "not_in_combat",
                GameError::AlreadyInCombat => "already_in_combat",
                GameError::AdminModeRequired => "admin_mode_required",
                GameError::GameNotFound(_) => "game_not_found",
                GameError::GameOver => "game_over",
            },
            SessionError::StoragePoisoned => "storage_poisoned",
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            SessionError::Game(GameError::NotEnoughStartPoints { .. })
            | SessionError::Game(GameError::TurnOrderUndefined) => ErrorSeverity::Server,
            SessionError::Game(_) => ErrorSeverity::Client,
            SessionError::StoragePoisoned => ErrorSeverity::Critical,
        }
    }

    /// Logs the failure of `operation` at a level matching its severity.
    pub fn log(&self, operation: &str, session_id: &str) {
        let code = self.error_code();
        match self.severity() {
            ErrorSeverity::Client => tracing::info!(
                session_id = %session_id,
                operation,
                error_code = code,
                error = %self,
                "operation rejected"
            ),
            ErrorSeverity::Server => tracing::warn!(
                session_id = %session_id,
                operation,
                error_code = code,
                error = %self,
                "operation failed"
            ),
            ErrorSeverity::Critical => tracing::error!(
                session_id = %session_id,
                operation,
                error_code = code,
                error = %self,
                "critical failure"
            ),
        }
    }
}
