// ============================================
// File: crates/fleetsim-client/src/error.rs
// ============================================
//! # Simulator Error Types

use thiserror::Error;

use fleetsim_api::ApiError;
use fleetsim_common::CommonError;
use fleetsim_core::CoreError;

/// Result type for simulator operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Simulator error types.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Failed to load configuration from '{path}': {reason}")]
    ConfigLoad {
        path: String,
        reason: String,
    },

    #[error("Invalid configuration: {field} - {reason}")]
    ConfigInvalid {
        field: String,
        reason: String,
    },

    /// Unusable key material; terminates only the owning device session.
    #[error(transparent)]
    Identity(#[from] CoreError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Common(#[from] CommonError),

    #[error("I/O error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl ClientError {
    pub fn config_load(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn config_invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Configuration errors fail fast, before any device session starts.
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::ConfigLoad { .. } | Self::ConfigInvalid { .. })
    }

    /// Returns `true` if this error ends the owning device session.
    ///
    /// Fatal errors never propagate across sessions; the fleet keeps
    /// running the other devices.
    #[must_use]
    pub const fn is_fatal_for_session(&self) -> bool {
        matches!(
            self,
            Self::Identity(_) | Self::ConfigLoad { .. } | Self::ConfigInvalid { .. }
        )
    }
}
