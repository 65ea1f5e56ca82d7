//! Error types for the CLI application.
//!
//! Every command returns `Result<(), CliError>`; [`run`](crate::run) turns the
//! error into a message on stderr and exit code `2`.

use std::fmt;
use tactica_server::{SessionError, SettingsError};

/// Custom error type for CLI operations.
#[derive(Debug)]
pub enum CliError {
    /// I/O error (stdout/stderr writes, config file reads, runtime start-up)
    Io(std::io::Error),

    /// Invalid user input or command-line arguments
    InvalidInput(String),

    /// Configuration error
    Config(String),

    /// A session operation failed
    Engine(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Io(e) => write!(f, "I/O error: {}", e),
            CliError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Engine(msg) => write!(f, "Engine error: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(error: std::io::Error) -> Self {
        CliError::Io(error)
    }
}

impl From<SessionError> for CliError {
    fn from(error: SessionError) -> Self {
        CliError::Engine(format!("{} ({})", error, error.error_code()))
    }
}

impl From<SettingsError> for CliError {
    fn from(error: SettingsError) -> Self {
        CliError::Config(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tactica_engine::errors::GameError;

    #[test]
    fn test_session_errors_carry_their_code() {
        let error = CliError::from(SessionError::from(GameError::TurnOrderUndefined));
        let message = error.to_string();
        assert!(message.starts_with("Engine error: "));
        assert!(message.contains("turn_order_undefined"), "{message}");
    }

    #[test]
    fn test_io_error_is_the_source() {
        use std::error::Error;
        let error = CliError::from(std::io::Error::other("disk"));
        assert!(error.source().is_some());
        assert!(CliError::InvalidInput("x".into()).source().is_none());
    }
}
