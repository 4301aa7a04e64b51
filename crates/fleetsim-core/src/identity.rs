// ============================================
// File: crates/fleetsim-core/src/identity.rs
// ============================================
//! # Device Identity Keys
//!
//! ## Creation Reason
//! Every simulated device owns one long-term Ed25519 keypair that proves
//! its identity to the backend during the authorization handshake.
//!
//! ## Main Functionality
//! - `DeviceKeyPair`: generation, file persistence, digest signing
//! - Key file format: small JSON document with base64 key material
//!
//! ## Signature Scheme
//! ```text
//! signature = base64( Ed25519_Sign( SHA256(request_body) ) )
//! ```
//! The backend receives the signature in a request header next to the
//! exact body bytes that were hashed.
//!
//! ## ⚠️ Important Note for Next Developer
//! - `load_or_generate` must never replace an existing readable key file;
//!   a device keeps one keypair for its entire process lifetime
//! - Key files get 0600 permissions on Unix
//!
//! ## Last Modified
//! v0.1.0 - Initial key handling

use std::fmt;
use std::path::Path;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use ed25519_dalek::{Signer, SigningKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use crate::error::{CoreError, Result};

// ============================================
// Constants
// ============================================

/// Size of an Ed25519 private key seed in bytes.
pub const SEED_SIZE: usize = 32;

/// Key file format version written by this crate.
const KEY_FILE_VERSION: &str = "1.0";

// ============================================
// DeviceKeyPair
// ============================================

/// Long-term Ed25519 identity keypair of one simulated device.
///
/// # Security
/// - Generated with the OS random number generator
/// - Private key material is zeroed when intermediate buffers are dropped
/// - Never serialize the private key outside [`DeviceKeyPair::save`]
///
/// # Example
/// ```
/// use fleetsim_core::identity::DeviceKeyPair;
///
/// let keypair = DeviceKeyPair::generate();
/// let signature = keypair.sign(b"request body");
/// assert!(!signature.is_empty());
/// ```
pub struct DeviceKeyPair {
    /// Ed25519 signing key (private)
    signing_key: SigningKey,
}

impl DeviceKeyPair {
    /// Generates a new random device keypair.
    #[must_use]
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self { signing_key }
    }

    /// Reconstructs a keypair from a raw 32-byte private key seed.
    ///
    /// # Errors
    /// Returns `KeyGeneration` if the seed length is wrong.
    pub fn from_seed(seed: &[u8]) -> Result<Self> {
        if seed.len() != SEED_SIZE {
            return Err(CoreError::key_generation(format!(
                "invalid Ed25519 seed size: expected {SEED_SIZE}, got {}",
                seed.len()
            )));
        }
        let mut bytes = [0u8; SEED_SIZE];
        bytes.copy_from_slice(seed);
        let signing_key = SigningKey::from_bytes(&bytes);
        bytes.zeroize();
        Ok(Self { signing_key })
    }

    /// Loads a keypair from its JSON key file.
    ///
    /// # Errors
    /// Returns `KeyStorage` if the file is missing, unreadable, or does not
    /// contain a valid key. This is fatal for the owning device session.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| CoreError::key_storage(path.display().to_string(), e.to_string()))?;

        let key_file: KeyFile = serde_json::from_str(&content)
            .map_err(|e| CoreError::key_storage(path.display().to_string(), e.to_string()))?;

        let mut seed = BASE64
            .decode(&key_file.private_key)
            .map_err(|e| CoreError::key_storage(path.display().to_string(), e.to_string()))?;
        let keypair = Self::from_seed(&seed);
        seed.zeroize();
        keypair
    }

    /// Saves the keypair to a JSON key file with restrictive permissions.
    ///
    /// # Errors
    /// Returns `KeyStorage` on any filesystem failure.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let storage_err =
            |e: std::io::Error| CoreError::key_storage(path.display().to_string(), e.to_string());

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(storage_err)?;
            }
        }

        let key_file = KeyFile {
            version: KEY_FILE_VERSION.to_string(),
            key_type: "ed25519".to_string(),
            public_key: BASE64.encode(self.public_key_bytes()),
            private_key: BASE64.encode(self.signing_key.to_bytes()),
        };

        let content = serde_json::to_string_pretty(&key_file)
            .map_err(|e| CoreError::key_storage(path.display().to_string(), e.to_string()))?;
        std::fs::write(path, content).map_err(storage_err)?;

        // Key material on disk must not be world-readable
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(path).map_err(storage_err)?.permissions();
            perms.set_mode(0o600);
            std::fs::set_permissions(path, perms).map_err(storage_err)?;
        }

        Ok(())
    }

    /// Loads the keypair from `path`, generating and persisting a fresh one
    /// if no key file exists yet.
    ///
    /// An existing file is never overwritten: one keypair per device for
    /// its entire process lifetime.
    ///
    /// # Errors
    /// Returns `KeyStorage` if an existing file cannot be read or a fresh
    /// key cannot be written.
    pub fn load_or_generate(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::load(path);
        }
        let keypair = Self::generate();
        keypair.save(path)?;
        Ok(keypair)
    }

    /// Signs a request payload.
    ///
    /// Hashes the payload with SHA-256, signs the digest, and returns the
    /// signature in base64 text form, ready for a request header.
    #[must_use]
    pub fn sign(&self, payload: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(payload);
        let digest = hasher.finalize();

        let signature = self.signing_key.sign(&digest);
        BASE64.encode(signature.to_bytes())
    }

    /// Returns the raw public key bytes.
    #[must_use]
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Returns the public half in a transmittable PEM-style text encoding,
    /// as carried in the authorization request body.
    #[must_use]
    pub fn public_key_pem(&self) -> String {
        format!(
            "-----BEGIN PUBLIC KEY-----\n{}\n-----END PUBLIC KEY-----",
            BASE64.encode(self.public_key_bytes())
        )
    }
}

impl fmt::Debug for DeviceKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print private key material
        let public = self.public_key_bytes();
        f.debug_struct("DeviceKeyPair")
            .field(
                "public_key",
                &format_args!(
                    "{:02x}{:02x}{:02x}{:02x}...",
                    public[0], public[1], public[2], public[3]
                ),
            )
            .finish_non_exhaustive()
    }
}

// ============================================
// KeyFile
// ============================================

/// On-disk key file format (internal).
#[derive(Serialize, Deserialize)]
struct KeyFile {
    version: String,
    key_type: String,
    public_key: String,
    private_key: String,
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypair_generation() {
        let a = DeviceKeyPair::generate();
        let b = DeviceKeyPair::generate();
        assert_ne!(a.public_key_bytes(), b.public_key_bytes());
    }

    #[test]
    fn test_seed_roundtrip() {
        let keypair = DeviceKeyPair::generate();
        let seed = keypair.signing_key.to_bytes();
        let restored = DeviceKeyPair::from_seed(&seed).unwrap();
        assert_eq!(keypair.public_key_bytes(), restored.public_key_bytes());
    }

    #[test]
    fn test_seed_wrong_length_rejected() {
        assert!(DeviceKeyPair::from_seed(&[0u8; 16]).is_err());
        assert!(DeviceKeyPair::from_seed(&[0u8; 64]).is_err());
    }

    #[test]
    fn test_signature_is_deterministic() {
        // Ed25519 signatures are deterministic per key and message
        let keypair = DeviceKeyPair::generate();
        assert_eq!(keypair.sign(b"body"), keypair.sign(b"body"));
        assert_ne!(keypair.sign(b"body"), keypair.sign(b"other"));
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("device.key");

        let original = DeviceKeyPair::generate();
        original.save(&path).unwrap();

        let restored = DeviceKeyPair::load(&path).unwrap();
        assert_eq!(original.public_key_bytes(), restored.public_key_bytes());
    }

    #[test]
    fn test_load_or_generate_keeps_existing_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("device.key");

        let first = DeviceKeyPair::load_or_generate(&path).unwrap();
        let second = DeviceKeyPair::load_or_generate(&path).unwrap();
        assert_eq!(first.public_key_bytes(), second.public_key_bytes());
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.key");
        assert!(matches!(
            DeviceKeyPair::load(&path),
            Err(CoreError::KeyStorage { .. })
        ));
    }

    #[test]
    fn test_load_corrupt_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.key");
        std::fs::write(&path, "not a key file").unwrap();
        assert!(matches!(
            DeviceKeyPair::load(&path),
            Err(CoreError::KeyStorage { .. })
        ));
    }

    #[test]
    fn test_public_key_pem_markers() {
        let keypair = DeviceKeyPair::generate();
        let pem = keypair.public_key_pem();
        assert!(pem.starts_with("-----BEGIN PUBLIC KEY-----"));
        assert!(pem.ends_with("-----END PUBLIC KEY-----"));
    }
}
