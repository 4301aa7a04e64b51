// ============================================
// File: crates/fleetsim-client/src/inventory.rs
// ============================================
//! # Inventory Reporter
//!
//! ## Creation Reason
//! Each authorized device pushes its attribute snapshot to the backend on
//! a fixed period. The reporter is an independently cancellable task
//! owned by exactly one device session.
//!
//! ## Main Components
//! - `InventoryReporter`: the periodic submission loop
//! - `ReporterHandle`: stop handle whose `stop()` is a synchronization
//!   barrier - no further submissions are observable after it returns
//!
//! ## ⚠️ Important Note for Next Developer
//! - The first submission happens only after one full period has elapsed;
//!   there is no immediate submission at start
//! - Submission failures are logged and never stop the loop; only the
//!   owning session ends it via `stop()`
//! - At most one reporter per session: the session must stop the previous
//!   instance before reauthorization starts a fresh one
//!
//! ## Last Modified
//! v0.1.0 - Initial reporter implementation

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::{debug, info, warn};

use fleetsim_api::DeviceApi;
use fleetsim_common::DeviceAddress;

use crate::config::SessionSettings;
use crate::session::CredentialSlot;

// ============================================
// ReporterHandle
// ============================================

/// Stop handle for a running inventory reporter.
pub struct ReporterHandle {
    shutdown: broadcast::Sender<()>,
    task: JoinHandle<()>,
}

impl ReporterHandle {
    /// Signals cancellation and waits for the loop to finish.
    ///
    /// Blocks until any in-flight submission completes; once this returns,
    /// the caller can rely on no further submissions occurring.
    pub async fn stop(self) {
        let _ = self.shutdown.send(());
        if let Err(err) = self.task.await {
            warn!("Inventory reporter task failed: {}", err);
        }
    }
}

// ============================================
// InventoryReporter
// ============================================

/// Background task submitting one device's inventory attributes.
pub struct InventoryReporter {
    api: Arc<dyn DeviceApi>,
    address: DeviceAddress,
    credentials: CredentialSlot,
    settings: Arc<SessionSettings>,
}

impl InventoryReporter {
    /// Spawns the reporter loop and returns its stop handle.
    #[must_use]
    pub fn start(
        api: Arc<dyn DeviceApi>,
        address: DeviceAddress,
        credentials: CredentialSlot,
        settings: Arc<SessionSettings>,
    ) -> ReporterHandle {
        let (shutdown, shutdown_rx) = broadcast::channel(1);
        let reporter = Self {
            api,
            address,
            credentials,
            settings,
        };
        let task = tokio::spawn(reporter.run(shutdown_rx));
        ReporterHandle { shutdown, task }
    }

    /// Runs the submission loop until the stop signal arrives.
    async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let period = self.settings.inventory_interval;
        info!(
            device = %self.address,
            "Inventory reporter started ({}s)",
            period.as_secs()
        );

        // First tick after one full period; no immediate submission
        let mut ticker = interval_at(Instant::now() + period, period);

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    debug!(device = %self.address, "Inventory reporter stopping");
                    break;
                }
                _ = ticker.tick() => {
                    self.submit().await;
                }
            }
        }
    }

    async fn submit(&self) {
        let Some(credential) = self.credentials.current() else {
            debug!(device = %self.address, "No credential, skipping inventory submission");
            return;
        };

        match self
            .api
            .submit_inventory(&credential, &self.settings.attributes)
            .await
        {
            Ok(()) => debug!(device = %self.address, "Inventory submitted"),
            Err(err) => warn!(device = %self.address, "Inventory submission failed: {}", err),
        }
    }
}
