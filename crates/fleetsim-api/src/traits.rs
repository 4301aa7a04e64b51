// ============================================
// File: crates/fleetsim-api/src/traits.rs
// ============================================
//! # Backend API Trait
//!
//! ## Creation Reason
//! Abstracts the device-management backend so the simulator core depends
//! on a contract, not on HTTP. Tests drive whole device sessions against
//! scripted in-memory backends through this trait.
//!
//! ## Main Functionality
//! - `DeviceApi`: the five device-facing operations plus image retrieval
//!
//! ## Design Philosophy
//! - Async-first design with `async_trait`
//! - Credential handling is explicit: every authenticated call takes the
//!   credential as an argument, keeping ownership with the session layer
//! - A rejected credential is a typed error, never a raw status code
//!
//! ## Last Modified
//! v0.1.0 - Initial trait definitions

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    Credential, DeploymentLog, DeploymentStatus, InventoryAttribute, SignedAuthRequest, UpdateInfo,
};

/// Device-facing operations of the management backend.
///
/// # Contract
/// - `authorize` carries no bearer credential; all other calls do
/// - Implementations map HTTP 401/403 on authenticated calls to
///   [`ApiError::CredentialRejected`](crate::error::ApiError::CredentialRejected)
/// - `poll_update` returns `Ok(None)` when no deployment is pending
///
/// # Example
/// ```ignore
/// async fn poll_once(api: &dyn DeviceApi, credential: &Credential) -> Result<()> {
///     if let Some(update) = api.poll_update(credential).await? {
///         api.report_status(credential, &update.id, DeploymentStatus::Installing)
///             .await?;
///     }
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait DeviceApi: Send + Sync {
    /// Submits a signed authorization request.
    ///
    /// # Errors
    /// Any non-success response is an error; the auth handshake retries
    /// indefinitely until this call succeeds.
    async fn authorize(&self, request: &SignedAuthRequest) -> Result<Credential>;

    /// Pushes the device's inventory attribute set.
    ///
    /// # Errors
    /// `CredentialRejected` if the bearer credential is refused; transient
    /// errors otherwise.
    async fn submit_inventory(
        &self,
        credential: &Credential,
        attributes: &[InventoryAttribute],
    ) -> Result<()>;

    /// Polls for a pending deployment.
    ///
    /// # Errors
    /// `CredentialRejected` if the bearer credential is refused.
    async fn poll_update(&self, credential: &Credential) -> Result<Option<UpdateInfo>>;

    /// Reports a deployment phase for one deployment.
    ///
    /// # Errors
    /// `CredentialRejected` if the bearer credential is refused.
    async fn report_status(
        &self,
        credential: &Credential,
        deployment_id: &str,
        status: DeploymentStatus,
    ) -> Result<()>;

    /// Uploads a deployment log.
    ///
    /// # Errors
    /// Failures here are logged by callers and never abort an update cycle.
    async fn report_log(
        &self,
        credential: &Credential,
        deployment_id: &str,
        log: &DeploymentLog,
    ) -> Result<()>;

    /// Retrieves the image content behind a deployment's URI.
    ///
    /// # Errors
    /// Transient download failures; callers treat them as non-fatal.
    async fn fetch_image(&self, uri: &str) -> Result<Vec<u8>>;
}
