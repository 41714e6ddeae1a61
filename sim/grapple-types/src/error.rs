//! Error types for grapple operations.

use thiserror::Error;

/// Errors that can occur while driving a grapple.
///
/// A grapple that extends to full range without hitting anything is not an
/// error; that outcome is reported as a fail notification.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GrappleError {
    /// Invalid body ID referenced.
    #[error("invalid body ID: {0}")]
    InvalidBodyId(u64),

    /// Invalid joint ID referenced.
    #[error("invalid joint ID: {0}")]
    InvalidJointId(u64),

    /// Invalid collider ID referenced.
    #[error("invalid collider ID: {0}")]
    InvalidColliderId(u64),

    /// Link index past the end of the pool.
    #[error("link index {index} out of range (capacity={capacity})")]
    LinkIndexOutOfRange {
        /// The offending index.
        index: usize,
        /// Pool capacity.
        capacity: usize,
    },

    /// Operation needs at least one active link.
    #[error("no active links in the chain")]
    EmptyChain,

    /// Invalid configuration.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the configuration error.
        reason: String,
    },
}

impl GrappleError {
    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Check if this is a configuration error.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::InvalidConfig { .. })
    }

    /// Check if this error refers to a stale or unknown backend handle.
    #[must_use]
    pub fn is_invalid_handle(&self) -> bool {
        matches!(
            self,
            Self::InvalidBodyId(_) | Self::InvalidJointId(_) | Self::InvalidColliderId(_)
        )
    }
}
