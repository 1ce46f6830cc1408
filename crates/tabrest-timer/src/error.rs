//! Error types for idle timers.

use thiserror::Error;

/// Errors that can occur while managing timers.
#[derive(Debug, Error)]
pub enum TimerError {
    /// The idle timeout must be positive.
    #[error("Invalid idle timeout: {0} ms")]
    InvalidTimeout(i64),

    /// The background ticker could not be started or has stopped.
    #[error("Ticker error: {0}")]
    Ticker(String),
}

/// Result type for timer operations.
pub type TimerResult<T> = std::result::Result<T, TimerError>;
