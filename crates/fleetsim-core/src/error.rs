// ============================================
// File: crates/fleetsim-core/src/error.rs
// ============================================
//! # Core Error Types
//!
//! ## Creation Reason
//! Defines error types for identity key generation, storage, and signing.
//!
//! ## ⚠️ Important Note for Next Developer
//! - NEVER include key material in error messages
//! - A key storage failure is fatal for the owning device session only;
//!   callers must not let it take down other sessions
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use thiserror::Error;

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error types for device identity operations.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Failed to generate or reconstruct a cryptographic key.
    #[error("Key generation failed: {context}")]
    KeyGeneration {
        /// What key was being generated
        context: String,
    },

    /// Failed to read or write persisted key material.
    ///
    /// This is the `FatalIdentity` condition: a device without usable key
    /// material cannot authorize and its session must terminate.
    #[error("Key storage failure at '{path}': {reason}")]
    KeyStorage {
        /// Path of the key file involved
        path: String,
        /// What went wrong
        reason: String,
    },
}

impl CoreError {
    /// Creates a `KeyGeneration` error.
    pub fn key_generation(context: impl Into<String>) -> Self {
        Self::KeyGeneration {
            context: context.into(),
        }
    }

    /// Creates a `KeyStorage` error.
    pub fn key_storage(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::KeyStorage {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
