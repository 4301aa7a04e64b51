// ============================================
// File: crates/fleetsim-client/src/session.rs
// ============================================
//! # Device Session - per-device orchestration
//!
//! ## Creation Reason
//! One `DeviceSession` is a simulated device's full runtime: it owns the
//! identity keypair, the credential slot, and the device's two concurrent
//! activities (inventory reporting and update cycles).
//!
//! ## Session State Machine
//! ```text
//! unauthenticated ──► authenticating ──► active ──► done
//!                          ▲               │
//!                          └── credential ─┘
//!                              rejected
//! ```
//! - `authenticating`: the authorize call retries every 5 seconds,
//!   indefinitely - an unadmitted device waits for operator-side
//!   admission, which may take arbitrarily long
//! - `active`: the inventory reporter runs concurrently while update
//!   cycles execute strictly one after another
//! - `done` is reached only with a nonzero update limit
//!
//! ## ⚠️ Important Note for Next Developer
//! - The credential slot has one writer (this session) and two readers
//!   (update worker, inventory reporter); keep it that way
//! - The previous reporter MUST be stopped before reauthorization
//!   installs a fresh credential and starts a new reporter
//! - The update counter survives reauthorization; it is never reset
//!
//! ## Last Modified
//! v0.1.0 - Initial session implementation

use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use fleetsim_api::models::{AuthRequest, SignedAuthRequest};
use fleetsim_api::{Credential, DeviceApi};
use fleetsim_common::DeviceAddress;
use fleetsim_core::DeviceKeyPair;

use crate::config::{DeviceConfig, SessionSettings};
use crate::error::{ClientError, Result};
use crate::inventory::{InventoryReporter, ReporterHandle};
use crate::update::{CycleError, UpdateWorker};

// ============================================
// Constants
// ============================================

/// Delay between authorization attempts.
///
/// Fixed by design: no backoff growth and no attempt cap, since device
/// admission is operator-paced.
pub const AUTH_RETRY_DELAY: Duration = Duration::from_secs(5);

// ============================================
// CredentialSlot
// ============================================

/// Guarded slot holding a device's current credential.
///
/// Written only by the session's auth handshake, read by the update
/// worker and the inventory reporter; the whole credential is swapped
/// atomically on reauthorization.
#[derive(Clone, Default)]
pub struct CredentialSlot {
    inner: Arc<RwLock<Option<Credential>>>,
}

impl CredentialSlot {
    /// Creates an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a freshly accepted credential.
    pub fn install(&self, credential: Credential) {
        *self.inner.write().expect("credential slot poisoned") = Some(credential);
    }

    /// Discards the credential after the backend rejected it.
    pub fn invalidate(&self) {
        *self.inner.write().expect("credential slot poisoned") = None;
    }

    /// Returns a copy of the current credential, if any.
    #[must_use]
    pub fn current(&self) -> Option<Credential> {
        self.inner.read().expect("credential slot poisoned").clone()
    }
}

// ============================================
// SessionReport
// ============================================

/// Final report of a device session that ran to completion.
#[derive(Debug, Clone)]
pub struct SessionReport {
    /// The device's synthetic address.
    pub address: DeviceAddress,
    /// Terminal update cycles performed (success and failure both count).
    pub updates_completed: u32,
}

// ============================================
// DeviceSession
// ============================================

/// One simulated device's full runtime.
pub struct DeviceSession {
    device: DeviceConfig,
    api: Arc<dyn DeviceApi>,
    settings: Arc<SessionSettings>,
    credentials: CredentialSlot,
    reporter: Option<ReporterHandle>,
}

impl DeviceSession {
    /// Creates an unauthenticated session for one device.
    #[must_use]
    pub fn new(api: Arc<dyn DeviceApi>, settings: Arc<SessionSettings>, device: DeviceConfig) -> Self {
        Self {
            device,
            api,
            settings,
            credentials: CredentialSlot::new(),
            reporter: None,
        }
    }

    /// The device's synthetic address.
    #[must_use]
    pub fn address(&self) -> DeviceAddress {
        self.device.address
    }

    /// Runs the session to completion.
    ///
    /// With a nonzero update limit, returns after that many terminal
    /// update cycles; with a zero limit, loops until cancelled.
    ///
    /// # Errors
    /// Returns an error only for fatal per-device conditions (unusable
    /// key material); the caller must not let it affect other sessions.
    pub async fn run(&mut self) -> Result<SessionReport> {
        // One keypair per device for its entire lifetime
        let identity = DeviceKeyPair::load_or_generate(&self.device.key_path)?;

        self.authenticate(&identity).await?;

        let worker = UpdateWorker::new(
            Arc::clone(&self.api),
            self.device.address,
            self.credentials.clone(),
            Arc::clone(&self.settings),
        );

        let limit = self.settings.update_limit;
        let mut completed: u32 = 0;

        while limit == 0 || completed < limit {
            match worker.run_cycle().await {
                Ok(outcome) => {
                    completed += 1;
                    info!(
                        device = %self.device.address,
                        cycle = completed,
                        "Update cycle finished: {}", outcome
                    );
                }
                Err(CycleError::CredentialRejected) => {
                    warn!(device = %self.device.address, "Credential rejected, reauthorizing");
                    self.stop_reporter().await;
                    self.credentials.invalidate();
                    self.authenticate(&identity).await?;
                }
            }
        }

        self.stop_reporter().await;
        Ok(SessionReport {
            address: self.device.address,
            updates_completed: completed,
        })
    }

    /// Cleans up after external cancellation of [`run`](Self::run).
    ///
    /// Waits for the inventory reporter to stop so no submission can
    /// outlive the session.
    pub async fn shutdown(&mut self) {
        self.stop_reporter().await;
        debug!(device = %self.device.address, "Device session shut down");
    }

    /// Authorizes the device and starts a fresh inventory reporter.
    async fn authenticate(&mut self, identity: &DeviceKeyPair) -> Result<()> {
        debug_assert!(
            self.reporter.is_none(),
            "previous reporter must be stopped before reauthorizing"
        );

        let credential = self.authorize_until_accepted(identity).await?;
        if let Err(err) = credential.save(&self.device.credential_path) {
            // Persistence only matters for resuming authorization later;
            // the in-memory credential keeps this run going
            warn!(device = %self.device.address, "Failed to persist credential: {}", err);
        }
        self.credentials.install(credential);

        self.reporter = Some(InventoryReporter::start(
            Arc::clone(&self.api),
            self.device.address,
            self.credentials.clone(),
            Arc::clone(&self.settings),
        ));
        Ok(())
    }

    /// The authorization handshake: retries every 5 seconds until the
    /// backend accepts, indefinitely.
    ///
    /// # Errors
    /// Only request-construction failures escape; every backend response
    /// short of success is retried.
    async fn authorize_until_accepted(&self, identity: &DeviceKeyPair) -> Result<Credential> {
        let request = AuthRequest::new(
            &self.device.address,
            identity.public_key_pem(),
            self.settings.seq_no,
            &self.settings.tenant_token,
        );
        let body = request.canonical_body().map_err(ClientError::Api)?;
        let signature = identity.sign(body.as_bytes());
        let signed = SignedAuthRequest { body, signature };

        let mut attempt: u32 = 1;
        loop {
            match self.api.authorize(&signed).await {
                Ok(credential) => {
                    info!(device = %self.device.address, attempt, "Authorization accepted");
                    return Ok(credential);
                }
                Err(err) => {
                    info!(
                        device = %self.device.address,
                        attempt,
                        "Device not authorized yet: {}", err
                    );
                    attempt = attempt.saturating_add(1);
                    sleep(AUTH_RETRY_DELAY).await;
                }
            }
        }
    }

    async fn stop_reporter(&mut self) {
        if let Some(reporter) = self.reporter.take() {
            reporter.stop().await;
        }
    }
}

impl std::fmt::Debug for DeviceSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceSession")
            .field("address", &self.device.address)
            .field("reporter_running", &self.reporter.is_some())
            .finish()
    }
}

// ============================================
// Tests
// ============================================
