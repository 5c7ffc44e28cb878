//! Error types for the rig resolver

use serde::{Deserialize, Serialize};

/// Errors surfaced by skeleton construction, presets and the resolver.
///
/// Only [`RigError::InvalidInput`] aborts a resolution run; every softer
/// condition is reported as a [`crate::ResolveIssue`] inside the result.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum RigError {
    /// Skeleton or request data that cannot be resolved at all
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    /// A joint lookup by id or name failed
    #[error("Joint not found: {key} in skeleton '{skeleton}'")]
    JointNotFound { skeleton: String, key: String },

    /// Preset lookup failed
    #[error("Preset not found: {name}")]
    PresetNotFound { name: String },

    /// Serialization error
    #[error("Serialization error: {reason}")]
    Serialization { reason: String },
}

pub type Result<T> = core::result::Result<T, RigError>;

impl RigError {
    /// Shorthand for an [`RigError::InvalidInput`].
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Check if this is a recoverable error
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::JointNotFound { .. } | Self::PresetNotFound { .. })
    }

    /// Get error category for logging
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "validation",
            Self::JointNotFound { .. } => "skeleton",
            Self::PresetNotFound { .. } => "preset",
            Self::Serialization { .. } => "serialization",
        }
    }
}

impl From<serde_json::Error> for RigError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            reason: err.to_string(),
        }
    }
}
