// ============================================
// File: crates/fleetsim-client/src/update.rs
// ============================================
//! # Update Worker - deployment cycle state machine
//!
//! ## Creation Reason
//! Drives one device through the simulated firmware-update flow: poll for
//! a pending deployment, then walk the status sequence to a terminal
//! outcome.
//!
//! ## State Machine
//! ```text
//! polling ──► installing ──► downloading ──► rebooting ──► success
//!    │                                                       │
//!    │ (no update: sleep 5s, re-poll)          (fail_message set)
//!    │                                                       ▼
//!    └── credential rejected at any point ──► cycle aborts  failure
//! ```
//! Strict forward order, no skipping, no going back within one cycle.
//!
//! ## ⚠️ Important Note for Next Developer
//! - A rejected credential aborts the cycle immediately: no later phase
//!   may be reported once any call returns `CredentialRejected`
//! - Transient poll failures are absorbed here (log + 5s delay), never
//!   propagated to the session
//!
//! ## Last Modified
//! v0.1.0 - Initial update worker

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use fleetsim_api::models::{DeploymentLog, DeploymentStatus, UpdateInfo};
use fleetsim_api::{Credential, DeviceApi};
use fleetsim_common::DeviceAddress;

use crate::config::SessionSettings;
use crate::session::CredentialSlot;

// ============================================
// Constants
// ============================================

/// Delay between update polls while no deployment is pending.
pub const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

// ============================================
// Outcome Types
// ============================================

/// Terminal outcome of one completed update cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The cycle ended reporting `success`.
    Success,
    /// The cycle ended reporting `failure` (forced by configuration).
    Failure,
}

impl fmt::Display for CycleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::Failure => f.write_str("failure"),
        }
    }
}

/// Typed signal that aborts an update cycle.
#[derive(Debug, Error)]
pub enum CycleError {
    /// The backend rejected the credential; the session must reauthorize
    /// and start a fresh cycle from polling.
    #[error("credential rejected during update cycle")]
    CredentialRejected,
}

// ============================================
// UpdateWorker
// ============================================

/// Runs update cycles for one device.
///
/// Cycles are strictly sequential: the session awaits each `run_cycle`
/// before starting the next one.
pub struct UpdateWorker {
    api: Arc<dyn DeviceApi>,
    address: DeviceAddress,
    credentials: CredentialSlot,
    settings: Arc<SessionSettings>,
}

impl UpdateWorker {
    /// Creates a worker bound to one device session.
    #[must_use]
    pub fn new(
        api: Arc<dyn DeviceApi>,
        address: DeviceAddress,
        credentials: CredentialSlot,
        settings: Arc<SessionSettings>,
    ) -> Self {
        Self {
            api,
            address,
            credentials,
            settings,
        }
    }

    /// Drives one full update cycle to its terminal state.
    ///
    /// # Errors
    /// `CredentialRejected` if any authenticated call is refused; the
    /// cycle aborts without advancing further states.
    pub async fn run_cycle(&self) -> Result<CycleOutcome, CycleError> {
        let update = self.poll_until_available().await?;
        let deployment_id = update.id;
        info!(device = %self.address, deployment = %deployment_id, "Update available");

        self.report(&deployment_id, DeploymentStatus::Installing)
            .await?;

        self.download_image(&deployment_id, &update.image.uri).await;
        self.report(&deployment_id, DeploymentStatus::Downloading)
            .await?;
        self.simulated_wait().await;

        self.report(&deployment_id, DeploymentStatus::Rebooting)
            .await?;
        self.simulated_wait().await;

        if let Some(message) = self.settings.fail_message.clone() {
            self.report(&deployment_id, DeploymentStatus::Failure)
                .await?;
            self.upload_failure_log(&deployment_id, &message).await;
            Ok(CycleOutcome::Failure)
        } else {
            self.report(&deployment_id, DeploymentStatus::Success)
                .await?;
            Ok(CycleOutcome::Success)
        }
    }

    /// Polls until the backend offers a deployment.
    ///
    /// Transient failures and empty polls both end in the same fixed
    /// delay and another attempt; only a rejected credential escapes.
    async fn poll_until_available(&self) -> Result<UpdateInfo, CycleError> {
        loop {
            let credential = self.credential()?;
            match self.api.poll_update(&credential).await {
                Ok(Some(update)) => return Ok(update),
                Ok(None) => {
                    debug!(device = %self.address, "No update available");
                }
                Err(err) if err.is_credential_invalid() => {
                    return Err(CycleError::CredentialRejected);
                }
                Err(err) => {
                    warn!(device = %self.address, "Update poll failed: {}", err);
                }
            }
            sleep(POLL_RETRY_DELAY).await;
        }
    }

    /// Reports one deployment phase.
    ///
    /// Non-auth failures are logged and the cycle continues; the
    /// simulated device has no better recourse than a real one skipping
    /// a progress report.
    async fn report(
        &self,
        deployment_id: &str,
        status: DeploymentStatus,
    ) -> Result<(), CycleError> {
        let credential = self.credential()?;
        match self
            .api
            .report_status(&credential, deployment_id, status)
            .await
        {
            Ok(()) => {
                debug!(device = %self.address, deployment = %deployment_id, "Reported status '{}'", status);
                Ok(())
            }
            Err(err) if err.is_credential_invalid() => Err(CycleError::CredentialRejected),
            Err(err) => {
                warn!(
                    device = %self.address,
                    deployment = %deployment_id,
                    "Status report '{}' failed: {}", status, err
                );
                Ok(())
            }
        }
    }

    /// Retrieves the image content; optionally persists it locally.
    ///
    /// Download failures are logged and never abort the cycle.
    async fn download_image(&self, deployment_id: &str, uri: &str) {
        match self.api.fetch_image(uri).await {
            Ok(bytes) => {
                if self.settings.store_images {
                    let stem = deployment_id.get(..8).unwrap_or(deployment_id);
                    let path = self.settings.state_dir.join(format!("{stem}.image"));
                    if let Err(err) = tokio::fs::write(&path, &bytes).await {
                        warn!(device = %self.address, "Failed to store image at {}: {}", path.display(), err);
                    }
                } else {
                    debug!(device = %self.address, "Downloaded image ({} bytes)", bytes.len());
                }
            }
            Err(err) => {
                warn!(device = %self.address, "Failed to download image from {}: {}", uri, err);
            }
        }
    }

    /// Uploads the single-entry failure log.
    ///
    /// Log upload failures are logged, non-fatal.
    async fn upload_failure_log(&self, deployment_id: &str, message: &str) {
        let Ok(credential) = self.credential() else {
            warn!(device = %self.address, "No credential for failure log upload");
            return;
        };
        let log = DeploymentLog::single(message);
        if let Err(err) = self.api.report_log(&credential, deployment_id, &log).await {
            warn!(
                device = %self.address,
                deployment = %deployment_id,
                "Failure log upload failed: {}", err
            );
        }
    }

    /// Sleeps a random duration in `[0, max_wait]`.
    async fn simulated_wait(&self) {
        let max_secs = self.settings.max_wait.as_secs();
        if max_secs == 0 {
            return;
        }
        let secs = rand::thread_rng().gen_range(0..=max_secs);
        sleep(Duration::from_secs(secs)).await;
    }

    fn credential(&self) -> Result<Credential, CycleError> {
        // An empty slot means the credential was discarded under us;
        // treat it like a rejection so the session reauthorizes
        self.credentials.current().ok_or(CycleError::CredentialRejected)
    }
}
