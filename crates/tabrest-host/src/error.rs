//! Error types for the host seam.

use tabrest_core::{TabId, WindowId};
use thiserror::Error;

use crate::storage::StorageArea;

/// Errors reported by the extension host.
#[derive(Debug, Error)]
pub enum HostError {
    /// The tab does not exist (closed, or never existed).
    #[error("No tab with id {0}")]
    TabNotFound(TabId),

    /// The window does not exist.
    #[error("No window with id {0}")]
    WindowNotFound(WindowId),

    /// A storage operation failed.
    #[error("Storage error in {area} area for key '{key}': {reason}")]
    Storage {
        /// The storage area.
        area: StorageArea,
        /// The key being accessed.
        key: String,
        /// The reason for failure.
        reason: String,
    },

    /// Reading or writing a backing file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored value could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The host refused the operation.
    #[error("Host unavailable: {0}")]
    Unavailable(String),
}

/// Result type for host operations.
pub type HostResult<T> = std::result::Result<T, HostError>;
