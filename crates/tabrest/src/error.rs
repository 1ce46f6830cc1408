//! Errors surfaced by the suspender.

use tabrest_core::{CoreError, SettingsError, SuspendedUrlError};
use tabrest_host::HostError;
use tabrest_policy::PolicyError;
use tabrest_timer::TimerError;

/// Errors from the suspender.
#[derive(Debug, thiserror::Error)]
pub enum TabrestError {
    /// Core model error.
    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    /// Settings were rejected.
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    /// A suspended-page URL could not be read.
    #[error("Suspended page error: {0}")]
    SuspendedUrl(#[from] SuspendedUrlError),

    /// Policy error.
    #[error("Policy error: {0}")]
    Policy(#[from] PolicyError),

    /// The browser or its storage failed.
    #[error("Host error: {0}")]
    Host(#[from] HostError),

    /// Timer error.
    #[error("Timer error: {0}")]
    Timer(#[from] TimerError),

    /// A message could not be understood.
    #[error("Invalid message: {0}")]
    InvalidMessage(String),
}

/// Result type for suspender operations.
pub type TabrestResult<T> = std::result::Result<T, TabrestError>;
