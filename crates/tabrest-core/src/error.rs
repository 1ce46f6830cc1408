//! Core error types for Tabrest.
//!
//! Errors are split by origin: settings that fail to parse or validate,
//! and suspended-page URLs that cannot be decoded.

use thiserror::Error;

/// Top-level error type for Tabrest core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Error while loading, merging or validating settings.
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    /// Error while decoding a suspended-page URL.
    #[error("Suspended page error: {0}")]
    SuspendedUrl(#[from] SuspendedUrlError),
}

/// Errors in user settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The suspension timeout must be at least one minute.
    #[error("Invalid suspension timeout: {0} minutes (must be at least 1)")]
    InvalidTimeout(u64),

    /// Stored settings could not be parsed.
    #[error("Malformed settings: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A `key=value` assignment named an unknown setting.
    #[error("Unknown setting: '{0}'")]
    UnknownKey(String),

    /// A `key=value` assignment had a value of the wrong type.
    #[error("Invalid value for '{key}': '{value}'")]
    InvalidValue {
        /// The setting name.
        key: String,
        /// The rejected value.
        value: String,
    },
}

/// Errors decoding a suspended-page URL.
#[derive(Debug, Error)]
pub enum SuspendedUrlError {
    /// The URL does not point at the suspended page.
    #[error("Not a suspended page: {0}")]
    NotSuspendedPage(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Result type alias for settings operations.
pub type SettingsResult<T> = std::result::Result<T, SettingsError>;
