//! Error types for the policy system.

use thiserror::Error;

use crate::rule::{DenialReason, RuleId};

/// Errors related to suspension rules.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// A rule vetoed suspension.
    #[error("Suspension denied: {reason}")]
    Denied {
        /// The reason for denial.
        reason: DenialReason,
    },

    /// A rule with this ID already exists.
    #[error("Rule already exists: {0}")]
    AlreadyExists(RuleId),

    /// Invalid rule configuration.
    #[error("Invalid rule configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for policy operations.
pub type PolicyResult<T> = std::result::Result<T, PolicyError>;
