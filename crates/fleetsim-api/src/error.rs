// ============================================
// File: crates/fleetsim-api/src/error.rs
// ============================================
//! # API Error Types
//!
//! ## Creation Reason
//! The simulator's error handling hinges on telling two failure classes
//! apart: a rejected credential (reauthorize) and everything transient
//! (retry locally, never propagate). This module encodes that taxonomy
//! as typed values instead of inferring it from raw status codes at the
//! call sites.
//!
//! ## Error Categories
//! 1. **CredentialRejected**: the bearer token is no longer accepted
//! 2. **Status**: unexpected HTTP status (retryable at the caller's pace)
//! 3. **Transport**: connection-level failure (retryable)
//! 4. **Decode**: response body did not match the expected shape
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use thiserror::Error;

/// Result type for backend API operations.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors produced by backend API calls.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The backend rejected the device's bearer credential.
    ///
    /// Surfaces up to the device session, which reacts by discarding the
    /// credential and re-running the authorization handshake.
    #[error("Credential rejected by the backend")]
    CredentialRejected,

    /// The backend answered with an unexpected HTTP status.
    #[error("Unexpected status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body (may be empty)
        body: String,
    },

    /// The request failed at the transport level.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A response body could not be decoded.
    #[error("Failed to decode {context}: {details}")]
    Decode {
        /// What was being decoded
        context: String,
        /// Error details
        details: String,
    },
}

impl ApiError {
    /// Creates a `Status` error.
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }

    /// Creates a `Decode` error.
    pub fn decode(context: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Decode {
            context: context.into(),
            details: details.into(),
        }
    }

    /// Returns `true` if this error means the device must reauthorize.
    #[must_use]
    pub const fn is_credential_invalid(&self) -> bool {
        matches!(self, Self::CredentialRejected)
    }

    /// Returns `true` if retrying the same call later may succeed.
    ///
    /// Everything except a rejected credential and a malformed body is
    /// treated as transient; the retry point closest to the call decides
    /// the pacing.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Status { .. } | Self::Transport(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(ApiError::CredentialRejected.is_credential_invalid());
        assert!(!ApiError::CredentialRejected.is_retryable());

        let status = ApiError::status(500, "boom");
        assert!(status.is_retryable());
        assert!(!status.is_credential_invalid());

        let decode = ApiError::decode("update body", "missing field");
        assert!(!decode.is_retryable());
    }

    #[test]
    fn test_status_display() {
        let err = ApiError::status(502, "bad gateway");
        assert!(err.to_string().contains("502"));
        assert!(err.to_string().contains("bad gateway"));
    }
}
