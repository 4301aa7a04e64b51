// ============================================
// File: crates/fleetsim-client/src/supervisor.rs
// ============================================
//! # Fleet Supervisor
//!
//! ## Creation Reason
//! Constructs N device sessions with distinct synthetic identities and
//! runs them concurrently; devices are fully independent and a failure
//! in one never affects another.
//!
//! ## Fleet Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     FleetSupervisor                          │
//! │                                                              │
//! │   shutdown broadcast ──┬──────────┬──────────┐               │
//! │                        ▼          ▼          ▼               │
//! │                 ┌──────────┐ ┌──────────┐ ┌──────────┐      │
//! │                 │ Session 1│ │ Session 2│ │ Session N│      │
//! │                 │  task    │ │  task    │ │  task    │      │
//! │                 │  + rep.  │ │  + rep.  │ │  + rep.  │      │
//! │                 └──────────┘ └──────────┘ └──────────┘      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//! Up to 2N live tasks for N devices: one per session plus one per
//! active inventory reporter.
//!
//! ## ⚠️ Important Note for Next Developer
//! - `spawn` returns once all sessions are STARTED, not finished
//! - Sessions share only the API client and read-only settings; no
//!   cross-device mutable state exists
//!
//! ## Last Modified
//! v0.1.0 - Initial supervisor implementation

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use fleetsim_api::DeviceApi;
use fleetsim_common::DeviceAddress;

use crate::config::{DeviceConfig, SessionSettings};
use crate::error::{ClientError, Result};
use crate::session::{DeviceSession, SessionReport};

// ============================================
// Fleet
// ============================================

/// Handles of the concurrently running device sessions.
pub struct Fleet {
    sessions: Vec<(DeviceAddress, JoinHandle<Option<SessionReport>>)>,
}

impl Fleet {
    /// Number of sessions started.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if no sessions were started.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Waits for every session task and collects completion reports.
    ///
    /// Sessions that were cancelled or failed fatally yield no report;
    /// their outcome has already been logged by the task itself.
    pub async fn join(&mut self) -> Vec<SessionReport> {
        let mut reports = Vec::new();
        while let Some((address, handle)) = self.sessions.pop() {
            match handle.await {
                Ok(Some(report)) => reports.push(report),
                Ok(None) => {}
                Err(err) => error!(device = %address, "Session task panicked: {}", err),
            }
        }
        reports
    }
}

// ============================================
// FleetSupervisor
// ============================================

/// Spawns and manages N concurrent device sessions.
pub struct FleetSupervisor {
    api: Arc<dyn DeviceApi>,
    settings: Arc<SessionSettings>,
    devices: usize,
    shutdown_tx: broadcast::Sender<()>,
}

impl FleetSupervisor {
    /// Creates a supervisor for `devices` sessions.
    #[must_use]
    pub fn new(api: Arc<dyn DeviceApi>, settings: Arc<SessionSettings>, devices: usize) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            api,
            settings,
            devices,
            shutdown_tx,
        }
    }

    /// Starts every device session concurrently.
    ///
    /// Each session gets an isolated configuration: a fresh synthetic
    /// address and distinct key/credential file paths. Returns once all
    /// sessions have been started.
    #[must_use]
    pub fn spawn(&self) -> Fleet {
        let mut sessions = Vec::with_capacity(self.devices);

        for _ in 0..self.devices {
            let device = DeviceConfig::derive(&self.settings.state_dir);
            let address = device.address;
            let handle = self.spawn_session(device);
            sessions.push((address, handle));
        }

        Fleet { sessions }
    }

    /// Spawns one session task wired to the shutdown channel.
    fn spawn_session(&self, device: DeviceConfig) -> JoinHandle<Option<SessionReport>> {
        let api = Arc::clone(&self.api);
        let settings = Arc::clone(&self.settings);
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let address = device.address;

        tokio::spawn(async move {
            info!(device = %address, "Starting device session");
            let mut session = DeviceSession::new(api, settings, device);

            // Cancellation can land on any blocking point inside run();
            // the select drops the run future before cleanup starts
            let outcome = {
                let run = session.run();
                tokio::pin!(run);
                tokio::select! {
                    _ = shutdown_rx.recv() => None,
                    result = &mut run => Some(result),
                }
            };

            match outcome {
                Some(Ok(report)) => {
                    info!(
                        device = %address,
                        updates = report.updates_completed,
                        "Device session finished"
                    );
                    Some(report)
                }
                Some(Err(err)) => {
                    // Fatal for this device only; the fleet keeps going
                    error!(device = %address, "Device session failed: {}", err);
                    None
                }
                None => {
                    debug!(device = %address, "Device session cancelled");
                    session.shutdown().await;
                    None
                }
            }
        })
    }

    /// Triggers fleet-wide shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Runs the fleet until every session completes or Ctrl-C arrives.
    ///
    /// # Errors
    /// Returns an error if the state directory cannot be created; this is
    /// a fail-fast condition checked before any session starts.
    pub async fn run(self) -> Result<()> {
        tokio::fs::create_dir_all(&self.settings.state_dir)
            .await
            .map_err(|e| {
                ClientError::io(
                    format!("create state dir '{}'", self.settings.state_dir.display()),
                    e,
                )
            })?;

        let mut fleet = self.spawn();
        let total = fleet.len();
        info!("Fleet started: {} devices", total);

        let mut reports = Vec::new();
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal");
                let _ = self.shutdown_tx.send(());
            }
            collected = fleet.join() => {
                reports = collected;
            }
        }

        // Drain sessions still winding down after a shutdown signal
        reports.extend(fleet.join().await);

        info!(
            "Fleet finished: {}/{} sessions ran to completion",
            reports.len(),
            total
        );
        Ok(())
    }
}
