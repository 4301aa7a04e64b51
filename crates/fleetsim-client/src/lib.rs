// ============================================
// File: crates/fleetsim-client/src/lib.rs
// ============================================
//! # Fleetsim Client - Device Fleet Simulator Library
//!
//! ## Creation Reason
//! Coordinates many concurrently running, independently failing device
//! state machines against a flaky network: each simulated device
//! authorizes, reports inventory, and loops through firmware-update
//! cycles with explicit status callbacks.
//!
//! ## Main Functionality
//!
//! ### Modules
//! - [`config`]: simulator configuration and per-device derivation
//! - [`session`]: per-device orchestration state machine
//! - [`inventory`]: cancellable periodic inventory reporter
//! - [`update`]: update cycle state machine
//! - [`supervisor`]: concurrent fleet management
//! - [`error`]: simulator error types
//!
//! ## Architecture Overview
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      FleetSupervisor                         │
//! │                            │ spawns N                        │
//! │                            ▼                                 │
//! │  ┌────────────────────────────────────────────────────────┐ │
//! │  │                    DeviceSession                        │ │
//! │  │                                                         │ │
//! │  │  DeviceKeyPair ──► auth handshake ──► CredentialSlot    │ │
//! │  │                        (retry 5s,        │     │        │ │
//! │  │                         forever)         ▼     ▼        │ │
//! │  │                              ┌──────────────┐ ┌───────┐ │ │
//! │  │                              │ UpdateWorker │ │Invent.│ │ │
//! │  │                              │ (sequential  │ │Report.│ │ │
//! │  │                              │  cycles)     │ │(task) │ │ │
//! │  │                              └──────────────┘ └───────┘ │ │
//! │  └────────────────────────────────────────────────────────┘ │
//! │                            │                                 │
//! └────────────────────────────┼─────────────────────────────────┘
//!                              ▼
//!                    DeviceApi (HTTP backend)
//! ```
//!
//! ## Data Flow
//! ```text
//! authorize ──► inventory (periodic) ∥ poll ──► installing ──► downloading
//!    ▲                                              ──► rebooting ──► done
//!    └───────────── credential rejected ◄───────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Devices are fully independent: no shared mutable state beyond the
//!   read-only settings and the connection-pooling API client
//! - Update cycles within one session are strictly sequential
//!
//! ## Last Modified
//! v0.1.0 - Initial simulator library

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod inventory;
pub mod session;
pub mod supervisor;
pub mod update;

// Re-export primary types
pub use config::{DeviceConfig, SessionSettings, SimulatorConfig};
pub use error::{ClientError, Result};
pub use session::{CredentialSlot, DeviceSession, SessionReport};
pub use supervisor::{Fleet, FleetSupervisor};
pub use update::{CycleError, CycleOutcome, UpdateWorker};
