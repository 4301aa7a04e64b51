// ============================================
// File: crates/fleetsim-client/src/config.rs
// ============================================
//! # Simulator Configuration
//!
//! ## Creation Reason
//! Provides configuration management for the fleet simulator,
//! supporting TOML files with defaults for every field.
//!
//! ## Configuration Sections
//! - `backend`: service URL, tenant token, request timeout
//! - `fleet`: device count, update limit, simulated wait, failure injection
//! - `inventory`: attribute set and report interval
//! - `logging`: log level
//!
//! ## Example Configuration
//! ```toml
//! [backend]
//! server_url = "http://localhost:8080/api/devices/v1"
//! tenant_token = "dummy"
//!
//! [fleet]
//! devices = 50
//! updates = 0            # 0 = loop forever
//! max_wait_secs = 30
//! fail_message = "disk full"
//!
//! [inventory]
//! attributes = ["device_type:fake-device", "image_type:fake-image"]
//! interval_secs = 60
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - `validate()` must run before any session starts; a malformed
//!   inventory attribute spec is a fail-fast error, never a per-device one
//! - Every device derives isolated key/credential paths from `state_dir`
//!
//! ## Last Modified
//! v0.1.0 - Initial configuration implementation

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use fleetsim_api::models::InventoryAttribute;
use fleetsim_common::DeviceAddress;

use crate::error::{ClientError, Result};

// ============================================
// SimulatorConfig
// ============================================

/// Main simulator configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Backend connection settings.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Fleet composition and update behavior.
    #[serde(default)]
    pub fleet: FleetConfig,

    /// Inventory reporting settings.
    #[serde(default)]
    pub inventory: InventoryConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulatorConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    /// Returns error if the file cannot be read, parsed, or validated.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        info!("Loading configuration from: {}", path_str);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ClientError::config_load(&path_str, e.to_string()))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ClientError::config_load(&path_str, e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Parses configuration from a TOML string (useful for testing).
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ClientError::config_load("<string>", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns `ConfigInvalid` describing the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.backend.server_url.is_empty() {
            return Err(ClientError::config_invalid(
                "backend.server_url",
                "cannot be empty",
            ));
        }
        if self.backend.request_timeout_secs == 0 {
            return Err(ClientError::config_invalid(
                "backend.request_timeout_secs",
                "must be > 0",
            ));
        }
        if self.fleet.devices == 0 {
            return Err(ClientError::config_invalid("fleet.devices", "must be > 0"));
        }
        if self.inventory.interval_secs == 0 {
            return Err(ClientError::config_invalid(
                "inventory.interval_secs",
                "must be > 0",
            ));
        }
        // Malformed attribute specs must fail before any session starts
        for spec in &self.inventory.attributes {
            InventoryAttribute::parse(spec)
                .map_err(|e| ClientError::config_invalid("inventory.attributes", e.to_string()))?;
        }
        Ok(())
    }

    /// Builds the read-only per-session settings shared by every device.
    ///
    /// # Errors
    /// Returns `ConfigInvalid` if the attribute specs do not parse.
    pub fn session_settings(&self) -> Result<SessionSettings> {
        let attributes = self
            .inventory
            .attributes
            .iter()
            .map(|spec| {
                InventoryAttribute::parse(spec).map_err(|e| {
                    ClientError::config_invalid("inventory.attributes", e.to_string())
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(SessionSettings {
            tenant_token: self.backend.tenant_token.clone(),
            seq_no: self.backend.seq_no,
            attributes,
            inventory_interval: Duration::from_secs(self.inventory.interval_secs),
            max_wait: Duration::from_secs(self.fleet.max_wait_secs),
            fail_message: self.fleet.fail_message.clone(),
            store_images: self.fleet.store_images,
            state_dir: self.fleet.state_dir.clone(),
            update_limit: self.fleet.updates,
        })
    }
}

// ============================================
// Sections
// ============================================

/// Backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the device-facing API.
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Tenant token sent in the authorization request.
    #[serde(default = "default_tenant_token")]
    pub tenant_token: String,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Sequence number for authorization requests.
    #[serde(default = "default_seq_no")]
    pub seq_no: u32,
}

/// Fleet composition and update behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetConfig {
    /// Number of devices to simulate.
    #[serde(default = "default_devices")]
    pub devices: usize,

    /// Updates each device performs before exiting (0 = unlimited).
    #[serde(default = "default_updates")]
    pub updates: u32,

    /// Maximum simulated wait between update phases, in seconds.
    #[serde(default = "default_max_wait")]
    pub max_wait_secs: u64,

    /// When set, every update cycle ends in failure with this message.
    #[serde(default)]
    pub fail_message: Option<String>,

    /// Persist downloaded images under the state directory.
    #[serde(default)]
    pub store_images: bool,

    /// Directory holding per-device key and credential files.
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
}

/// Inventory reporting settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryConfig {
    /// Attribute specs in `name:value` form.
    #[serde(default = "default_attributes")]
    pub attributes: Vec<String>,

    /// Reporting period in seconds.
    #[serde(default = "default_inventory_interval")]
    pub interval_secs: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g. `info`, `fleetsim_client=debug`).
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_server_url() -> String {
    "http://localhost:8080/api/devices/v1".to_string()
}

fn default_tenant_token() -> String {
    "dummy".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

fn default_seq_no() -> u32 {
    1
}

fn default_devices() -> usize {
    1
}

fn default_updates() -> u32 {
    1
}

fn default_max_wait() -> u64 {
    30
}

fn default_state_dir() -> PathBuf {
    PathBuf::from("fleet-state")
}

fn default_attributes() -> Vec<String> {
    vec![
        "device_type:fake-device".to_string(),
        "image_type:fake-image".to_string(),
    ]
}

fn default_inventory_interval() -> u64 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            tenant_token: default_tenant_token(),
            request_timeout_secs: default_request_timeout(),
            seq_no: default_seq_no(),
        }
    }
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            devices: default_devices(),
            updates: default_updates(),
            max_wait_secs: default_max_wait(),
            fail_message: None,
            store_images: false,
            state_dir: default_state_dir(),
        }
    }
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            attributes: default_attributes(),
            interval_secs: default_inventory_interval(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ============================================
// SessionSettings
// ============================================

/// Read-only knobs shared by every device session.
///
/// Derived once from [`SimulatorConfig`]; sessions hold it behind an
/// `Arc` and never mutate it, so devices share no mutable state.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Tenant token for authorization requests.
    pub tenant_token: String,
    /// Authorization request sequence number.
    pub seq_no: u32,
    /// Parsed inventory attribute set.
    pub attributes: Vec<InventoryAttribute>,
    /// Inventory reporting period.
    pub inventory_interval: Duration,
    /// Maximum simulated wait between update phases.
    pub max_wait: Duration,
    /// Forced failure message, if configured.
    pub fail_message: Option<String>,
    /// Persist downloaded images.
    pub store_images: bool,
    /// Directory for per-device state files.
    pub state_dir: PathBuf,
    /// Update cycles per device before exiting (0 = unlimited).
    pub update_limit: u32,
}

// ============================================
// DeviceConfig
// ============================================

/// Isolated per-device configuration derived at spawn time.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Synthetic hardware identity of this device.
    pub address: DeviceAddress,
    /// Private key file path, unique to this device.
    pub key_path: PathBuf,
    /// Credential file path, unique to this device.
    pub credential_path: PathBuf,
}

impl DeviceConfig {
    /// Derives a fresh device configuration under the given state dir.
    ///
    /// The random address makes the key and credential paths distinct,
    /// so devices never collide on storage.
    #[must_use]
    pub fn derive(state_dir: &Path) -> Self {
        let address = DeviceAddress::generate();
        let stem = address.file_stem();
        Self {
            address,
            key_path: state_dir.join(format!("{stem}.key")),
            credential_path: state_dir.join(format!("{stem}.token")),
        }
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SimulatorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.fleet.devices, 1);
        assert_eq!(config.fleet.updates, 1);
        assert_eq!(config.inventory.interval_secs, 60);
    }

    #[test]
    fn test_from_toml() {
        let config = SimulatorConfig::from_toml(
            r#"
            [fleet]
            devices = 5
            updates = 0
            fail_message = "disk full"

            [inventory]
            attributes = ["serial:1234"]
            "#,
        )
        .unwrap();
        assert_eq!(config.fleet.devices, 5);
        assert_eq!(config.fleet.updates, 0);
        assert_eq!(config.fleet.fail_message.as_deref(), Some("disk full"));
        assert_eq!(config.inventory.attributes, vec!["serial:1234"]);
    }

    #[test]
    fn test_validate_rejects_zero_devices() {
        let mut config = SimulatorConfig::default();
        config.fleet.devices = 0;
        assert!(matches!(
            config.validate(),
            Err(ClientError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_malformed_attribute() {
        let mut config = SimulatorConfig::default();
        config.inventory.attributes.push("no-separator".to_string());
        let err = config.validate().unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_session_settings_parses_attributes() {
        let settings = SimulatorConfig::default().session_settings().unwrap();
        assert_eq!(settings.attributes.len(), 2);
        assert_eq!(settings.attributes[0].name, "device_type");
        assert_eq!(settings.attributes[0].value, "fake-device");
    }

    #[test]
    fn test_device_config_paths_are_distinct() {
        let dir = PathBuf::from("/tmp/fleet");
        let a = DeviceConfig::derive(&dir);
        let b = DeviceConfig::derive(&dir);
        assert_ne!(a.key_path, b.key_path);
        assert_ne!(a.credential_path, b.credential_path);
        assert_ne!(a.key_path, a.credential_path);
    }
}
