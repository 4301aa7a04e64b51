// ============================================
// File: crates/fleetsim-common/src/types.rs
// ============================================
//! # Core Type Definitions
//!
//! ## Creation Reason
//! Centralizes the identity type every simulated device carries, ensuring
//! one consistent representation across the workspace.
//!
//! ## Main Functionality
//! - `DeviceAddress`: synthetic MAC-like hardware identity (6 bytes)
//! - Type conversions and serialization implementations
//!
//! ## Main Logical Flow
//! 1. An address is generated randomly when a device is spawned
//! 2. It becomes the device's protocol identity claim
//! 3. It labels every log line and derives per-device file names
//!
//! ## ⚠️ Important Note for Next Developer
//! - One address per device for its entire process lifetime
//! - The address is synthetic: it stands in for a hardware MAC and
//!   carries no cryptographic weight
//!
//! ## Last Modified
//! v0.1.0 - Initial type definitions

use std::fmt;
use std::str::FromStr;

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::CommonError;

// ============================================
// Constants
// ============================================

/// Size of a device address in bytes.
pub const DEVICE_ADDRESS_SIZE: usize = 6;

// ============================================
// DeviceAddress
// ============================================

/// Synthetic MAC-like hardware identity of one simulated device.
///
/// # Purpose
/// Stands in for a real hardware address in the identity claim sent to
/// the backend, and correlates all log output of one device.
///
/// # Example
/// ```
/// use fleetsim_common::types::DeviceAddress;
///
/// let addr = DeviceAddress::generate();
/// let text = addr.to_string();            // "de:ad:be:ef:00:01" shape
/// let parsed: DeviceAddress = text.parse().unwrap();
/// assert_eq!(addr, parsed);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceAddress([u8; DEVICE_ADDRESS_SIZE]);

impl DeviceAddress {
    /// Creates an address from raw octets.
    #[must_use]
    pub const fn from_octets(octets: [u8; DEVICE_ADDRESS_SIZE]) -> Self {
        Self(octets)
    }

    /// Generates a new random address.
    ///
    /// Each spawned device calls this exactly once; the address is never
    /// regenerated for the lifetime of the process.
    #[must_use]
    pub fn generate() -> Self {
        let mut octets = [0u8; DEVICE_ADDRESS_SIZE];
        rand::thread_rng().fill_bytes(&mut octets);
        Self(octets)
    }

    /// Returns the raw octets.
    #[must_use]
    pub const fn octets(&self) -> [u8; DEVICE_ADDRESS_SIZE] {
        self.0
    }

    /// Returns a colon-free lowercase form suitable for file names.
    ///
    /// Used to derive the per-device key and credential paths, which must
    /// never collide between devices.
    #[must_use]
    pub fn file_stem(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

impl fmt::Debug for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceAddress({self})")
    }
}

impl FromStr for DeviceAddress {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != DEVICE_ADDRESS_SIZE {
            return Err(CommonError::invalid_input(
                "device_address",
                format!("expected 6 colon-separated octets, got {}", parts.len()),
            ));
        }

        let mut octets = [0u8; DEVICE_ADDRESS_SIZE];
        for (slot, part) in octets.iter_mut().zip(parts) {
            *slot = u8::from_str_radix(part, 16).map_err(|_| {
                CommonError::invalid_input("device_address", format!("invalid octet '{part}'"))
            })?;
        }
        Ok(Self(octets))
    }
}

impl Serialize for DeviceAddress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for DeviceAddress {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_generation_distinct() {
        let a = DeviceAddress::generate();
        let b = DeviceAddress::generate();
        // Two random addresses should be different
        assert_ne!(a, b);
    }

    #[test]
    fn test_address_display_shape() {
        let addr = DeviceAddress::from_octets([0xde, 0xad, 0xbe, 0xef, 0x00, 0x01]);
        assert_eq!(addr.to_string(), "de:ad:be:ef:00:01");
    }

    #[test]
    fn test_address_string_roundtrip() {
        let original = DeviceAddress::generate();
        let parsed: DeviceAddress = original.to_string().parse().unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn test_address_rejects_malformed() {
        assert!("de:ad:be:ef:00".parse::<DeviceAddress>().is_err());
        assert!("de:ad:be:ef:00:zz".parse::<DeviceAddress>().is_err());
        assert!("".parse::<DeviceAddress>().is_err());
    }

    #[test]
    fn test_file_stem_has_no_separators() {
        let addr = DeviceAddress::from_octets([0xde, 0xad, 0xbe, 0xef, 0x00, 0x01]);
        assert_eq!(addr.file_stem(), "deadbeef0001");
    }

    #[test]
    fn test_address_json_roundtrip() {
        let original = DeviceAddress::generate();
        let json = serde_json::to_string(&original).unwrap();
        let restored: DeviceAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(original, restored);
    }
}
