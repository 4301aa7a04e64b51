//! ============================================
//! File: crates/fleetsim-api/src/models.rs
//! ============================================
//! Purpose: Wire bodies and persisted artifacts of the device protocol
//!
//! Main Data Structures:
//!   - AuthRequest/SignedAuthRequest: authorization handshake payload
//!   - Credential: opaque bearer token with file persistence
//!   - InventoryAttribute: one name/value inventory pair
//!   - UpdateInfo: pending-deployment poll response
//!   - DeploymentStatus: the strictly ordered update phases
//!   - DeploymentLog: failure log payload with its fixed timestamp marker
//!
//! ⚠️ Important Note for Next Developer:
//!   - AuthRequest field order IS the canonical signing body; the backend
//!     verifies the signature against the exact serialized bytes, so do
//!     not reorder fields or serialize through an intermediate map
//!
//! Last Modified: v0.1.0 - Initial protocol models
//! ============================================

use std::path::Path;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};

use fleetsim_common::error::CommonError;
use fleetsim_common::types::DeviceAddress;

use crate::error::ApiError;

// ============================================
// Authorization
// ============================================

/// Authorization request body.
///
/// CRITICAL: serialized field order is the canonical signing body:
/// 1. id_data
/// 2. pubkey
/// 3. seq_no
/// 4. tenant_token
#[derive(Debug, Clone, Serialize)]
pub struct AuthRequest {
    /// JSON-encoded identity claim, e.g. `{"mac":"de:ad:be:ef:00:01"}`
    pub id_data: String,
    /// Device public key in transmittable text form
    pub pubkey: String,
    /// Request sequence number
    pub seq_no: u32,
    /// Tenant token identifying the account the device belongs to
    pub tenant_token: String,
}

impl AuthRequest {
    /// Builds an authorization request for one device.
    #[must_use]
    pub fn new(
        address: &DeviceAddress,
        pubkey: String,
        seq_no: u32,
        tenant_token: impl Into<String>,
    ) -> Self {
        let id_data = serde_json::json!({ "mac": address }).to_string();
        Self {
            id_data,
            pubkey,
            seq_no,
            tenant_token: tenant_token.into(),
        }
    }

    /// Serializes the canonical body that gets signed and transmitted.
    ///
    /// # Errors
    /// Returns `Decode` if serialization fails (practically impossible for
    /// this all-string body, but not silently ignored).
    pub fn canonical_body(&self) -> Result<String, ApiError> {
        serde_json::to_string(self)
            .map_err(|e| ApiError::decode("authorization request body", e.to_string()))
    }
}

/// An authorization request body together with its detached signature.
///
/// `body` holds the exact bytes that were hashed and signed; the HTTP
/// layer must transmit them verbatim.
#[derive(Debug, Clone)]
pub struct SignedAuthRequest {
    /// Canonical serialized request body
    pub body: String,
    /// Base64 signature over the body, sent as a request header
    pub signature: String,
}

// ============================================
// Credential
// ============================================

/// Opaque bearer credential proving the device is authorized.
///
/// The client never inspects validity or expiry; it learns the credential
/// is invalid only from a rejected request. [`Credential::claims`] exists
/// purely for operator-side inspection of the persisted artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wraps a raw bearer token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Loads a persisted credential from a file.
    ///
    /// # Errors
    /// Returns the underlying I/O error; an absent file simply means the
    /// device has never been authorized.
    pub fn load(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self(content.trim().to_string()))
    }

    /// Persists the credential to a file.
    ///
    /// # Errors
    /// Returns the underlying I/O error.
    pub fn save(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, &self.0)
    }

    /// Decodes the JWT-shaped segments of the token for inspection.
    ///
    /// # Errors
    /// Returns `Decoding` if the token does not have three dot-separated
    /// segments or the first two are not base64 JSON.
    pub fn claims(&self) -> Result<DecodedCredential, CommonError> {
        let segments: Vec<&str> = self.0.split('.').collect();
        if segments.len() != 3 {
            return Err(CommonError::decoding(
                "credential",
                format!("expected 3 dot-separated segments, got {}", segments.len()),
            ));
        }

        let decode_json = |name: &str, segment: &str| -> Result<serde_json::Value, CommonError> {
            let raw = BASE64
                .decode(repad(segment))
                .map_err(|e| CommonError::decoding(name, e.to_string()))?;
            serde_json::from_slice(&raw).map_err(|e| CommonError::decoding(name, e.to_string()))
        };

        Ok(DecodedCredential {
            header: decode_json("credential header", segments[0])?,
            claims: decode_json("credential claims", segments[1])?,
            signature: segments[2].to_string(),
        })
    }
}

/// Decoded view of a JWT-shaped credential, for the `token` CLI command.
#[derive(Debug, Clone)]
pub struct DecodedCredential {
    /// Token type segment
    pub header: serde_json::Value,
    /// Claims segment
    pub claims: serde_json::Value,
    /// Signature segment, left opaque
    pub signature: String,
}

/// Restores stripped base64 padding on a JWT segment.
fn repad(segment: &str) -> String {
    match segment.len() % 4 {
        0 => segment.to_string(),
        rem => format!("{segment}{}", "=".repeat(4 - rem)),
    }
}

// ============================================
// Inventory
// ============================================

/// One inventory attribute submitted by a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryAttribute {
    /// Attribute name, e.g. `device_type`
    pub name: String,
    /// Attribute value, e.g. `fake-device`
    pub value: String,
}

impl InventoryAttribute {
    /// Parses a `name:value` attribute spec.
    ///
    /// # Errors
    /// Returns `InvalidInput` if the separator is missing or either side
    /// is empty; configuration validation rejects such specs before any
    /// device session starts.
    pub fn parse(spec: &str) -> Result<Self, CommonError> {
        let (name, value) = spec.split_once(':').ok_or_else(|| {
            CommonError::invalid_input("inventory attribute", format!("missing ':' in '{spec}'"))
        })?;
        let name = name.trim();
        let value = value.trim();
        if name.is_empty() || value.is_empty() {
            return Err(CommonError::invalid_input(
                "inventory attribute",
                format!("empty name or value in '{spec}'"),
            ));
        }
        Ok(Self {
            name: name.to_string(),
            value: value.to_string(),
        })
    }
}

// ============================================
// Updates
// ============================================

/// A pending deployment returned by the update poll.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateInfo {
    /// Deployment identifier, used in all status/log reports for the cycle
    pub id: String,
    /// Firmware image to retrieve
    pub image: UpdateImage,
}

/// Image metadata attached to a pending deployment.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateImage {
    /// Download URI of the image content
    pub uri: String,
}

/// Deployment phases, in strict forward order.
///
/// A cycle reports these in sequence and never skips or repeats a phase;
/// `Success` and `Failure` are the two terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentStatus {
    /// Deployment accepted, installation starting
    Installing,
    /// Image retrieved, download phase reported
    Downloading,
    /// Device rebooting into the new image
    Rebooting,
    /// Terminal: update applied
    Success,
    /// Terminal: update failed
    Failure,
}

impl DeploymentStatus {
    /// Returns the lowercase wire name of the phase.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Installing => "installing",
            Self::Downloading => "downloading",
            Self::Rebooting => "rebooting",
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

impl std::fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of a deployment status report.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    /// The phase being reported
    pub status: DeploymentStatus,
}

// ============================================
// Deployment Log
// ============================================

/// Fixed timestamp marker carried by simulated failure log entries.
pub const LOG_TIMESTAMP_MARKER: &str = "2012-11-01T22:08:41+00:00";

/// Deployment log payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentLog {
    /// Log messages, oldest first
    pub messages: Vec<LogMessage>,
}

impl DeploymentLog {
    /// Builds the single-entry log reported with a forced failure.
    #[must_use]
    pub fn single(message: impl Into<String>) -> Self {
        Self {
            messages: vec![LogMessage {
                level: "debug".to_string(),
                message: message.into(),
                timestamp: LOG_TIMESTAMP_MARKER.to_string(),
            }],
        }
    }
}

/// One deployment log message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogMessage {
    /// Log level name
    pub level: String,
    /// Message text
    pub message: String,
    /// Timestamp in RFC 3339 form
    pub timestamp: String,
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_request_field_order() {
        let address = DeviceAddress::from_octets([0xde, 0xad, 0xbe, 0xef, 0x00, 0x01]);
        let request = AuthRequest::new(&address, "PUBKEY".to_string(), 1, "dummy");
        let body = request.canonical_body().unwrap();

        // The backend verifies the signature over these exact bytes, so
        // field order must match the declaration order
        let id_data = body.find("id_data").unwrap();
        let pubkey = body.find("pubkey").unwrap();
        let seq_no = body.find("seq_no").unwrap();
        let tenant = body.find("tenant_token").unwrap();
        assert!(id_data < pubkey && pubkey < seq_no && seq_no < tenant);
        assert!(body.contains("de:ad:be:ef:00:01"));
    }

    #[test]
    fn test_attribute_parse() {
        let attr = InventoryAttribute::parse("device_type: fake-device").unwrap();
        assert_eq!(attr.name, "device_type");
        assert_eq!(attr.value, "fake-device");
    }

    #[test]
    fn test_attribute_parse_rejects_malformed() {
        assert!(InventoryAttribute::parse("no-separator").is_err());
        assert!(InventoryAttribute::parse(":empty-name").is_err());
        assert!(InventoryAttribute::parse("empty-value:").is_err());
    }

    #[test]
    fn test_status_wire_names() {
        let json = serde_json::to_string(&StatusReport {
            status: DeploymentStatus::Installing,
        })
        .unwrap();
        assert_eq!(json, r#"{"status":"installing"}"#);
        assert_eq!(DeploymentStatus::Success.to_string(), "success");
    }

    #[test]
    fn test_repad() {
        assert_eq!(repad("abcd"), "abcd");
        assert_eq!(repad("abcde"), "abcde===");
        assert_eq!(repad("abcdef"), "abcdef==");
        assert_eq!(repad("abcdefg"), "abcdefg=");
    }

    #[test]
    fn test_credential_claims_decoding() {
        use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

        let header = BASE64.encode(r#"{"typ":"JWT"}"#);
        let claims = BASE64.encode(r#"{"sub":"device-1"}"#);
        let token = format!("{}.{}.sig", header.trim_end_matches('='), claims);

        let decoded = Credential::new(token).claims().unwrap();
        assert_eq!(decoded.header["typ"], "JWT");
        assert_eq!(decoded.claims["sub"], "device-1");
        assert_eq!(decoded.signature, "sig");
    }

    #[test]
    fn test_credential_claims_rejects_wrong_shape() {
        assert!(Credential::new("only-one-segment").claims().is_err());
        assert!(Credential::new("a.b").claims().is_err());
    }

    #[test]
    fn test_credential_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("device.token");

        Credential::new("bearer-token").save(&path).unwrap();
        // load trims trailing whitespace left by hand-edited files
        std::fs::write(&path, "bearer-token\n").unwrap();
        let loaded = Credential::load(&path).unwrap();
        assert_eq!(loaded.as_str(), "bearer-token");
    }

    #[test]
    fn test_failure_log_shape() {
        let log = DeploymentLog::single("disk full");
        assert_eq!(log.messages.len(), 1);
        assert_eq!(log.messages[0].message, "disk full");
        assert_eq!(log.messages[0].level, "debug");
        assert_eq!(log.messages[0].timestamp, LOG_TIMESTAMP_MARKER);
    }
}
