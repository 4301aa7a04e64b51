// ============================================
// File: crates/fleetsim-api/src/lib.rs
// ============================================
//! # Fleetsim API - Backend Boundary Library
//!
//! ## Creation Reason
//! Defines the abstract boundary between the device simulator and the
//! remote device-management service, plus the concrete HTTP client.
//! The simulator core never touches HTTP directly; it consumes the
//! [`DeviceApi`] trait so tests can substitute a scripted backend.
//!
//! ## Main Functionality
//! - [`traits`]: `DeviceApi` async trait (authorize, inventory, update poll,
//!   status and log reporting, image fetch)
//! - [`models`]: request/response bodies and the bearer [`Credential`]
//! - [`http`]: `HttpDeviceApi`, the reqwest-backed implementation
//! - [`error`]: `ApiError` taxonomy (credential-invalid vs transient)
//!
//! ## Endpoint Map
//! ```text
//! POST  /authentication/auth_requests            signed body, no bearer
//! PATCH /inventory/device/attributes             bearer
//! GET   /deployments/device/update               bearer (204 = no update)
//! PUT   /deployments/device/deployments/{id}/status   bearer
//! PUT   /deployments/device/deployments/{id}/log      bearer
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - 401/403 from any bearer-authenticated call MUST surface as
//!   `ApiError::CredentialRejected`; the session layer reacts to exactly
//!   that variant by reauthorizing
//!
//! ## Last Modified
//! v0.1.0 - Initial API boundary

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod http;
pub mod models;
pub mod traits;

pub use error::{ApiError, Result};
pub use http::HttpDeviceApi;
pub use models::{
    AuthRequest, Credential, DeploymentLog, DeploymentStatus, InventoryAttribute,
    SignedAuthRequest, UpdateInfo,
};
pub use traits::DeviceApi;
