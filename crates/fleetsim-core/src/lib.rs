// ============================================
// File: crates/fleetsim-core/src/lib.rs
// ============================================
//! # Fleetsim Core - Device Identity Library
//!
//! ## Creation Reason
//! Implements the cryptographic identity of one simulated device: the
//! long-term signing keypair, its on-disk persistence, and the request
//! signature used by the authorization handshake.
//!
//! ## Main Functionality
//! - [`identity`]: `DeviceKeyPair` generation, persistence, signing
//! - [`error`]: Core error types
//!
//! ## Key Lifecycle
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │  DeviceKeyPair (Long-term, one per device)                 │
//! │  ├─ Generated once at first session start                  │
//! │  ├─ Persisted to a per-device key file                     │
//! │  ├─ Signs the authorization request body                   │
//! │  └─ Never regenerated mid-run                              │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - The signing scheme is illustrative for the simulator, not a
//!   hardened production client
//! - Private key material must never be logged
//!
//! ## Last Modified
//! v0.1.0 - Initial identity implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod identity;

pub use error::{CoreError, Result};
pub use identity::DeviceKeyPair;
