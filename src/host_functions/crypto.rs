//! Key-pair host functions.
//!
//! Exposes an Ed25519 key pair to scripts as `CK.Crypto`. The constructor
//! flag selects fresh generation (`true`) or loading the configured key
//! store (`false`). Both accessors return lowercase hex.

use super::{HostError, HostResult};
use crate::capability::NativeClass;
use ed25519_dalek::{SigningKey, SECRET_KEY_LENGTH};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};

/// Namespace symbol the class is registered under
pub const NAMESPACE: &str = "CK";

/// Class name inside the namespace
pub const CLASS_NAME: &str = "Crypto";

/// An Ed25519 key pair
pub struct KeyPair {
    signing: SigningKey,
}

impl KeyPair {
    /// Generate a fresh key pair
    pub fn generate() -> Self {
        let secret: [u8; SECRET_KEY_LENGTH] = rand::random();
        Self {
            signing: SigningKey::from_bytes(&secret),
        }
    }

    /// Load a key pair from a hex-encoded secret key file
    pub fn load(path: &Path) -> HostResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        let bytes = hex::decode(raw.trim())
            .map_err(|e| HostError::KeyMaterial(format!("{}: {}", path.display(), e)))?;

        let secret: [u8; SECRET_KEY_LENGTH] = bytes.as_slice().try_into().map_err(|_| {
            HostError::KeyMaterial(format!(
                "{}: expected {} bytes, found {}",
                path.display(),
                SECRET_KEY_LENGTH,
                bytes.len()
            ))
        })?;

        Ok(Self {
            signing: SigningKey::from_bytes(&secret),
        })
    }

    /// Construct from the script's flag: generate, or load the key store
    pub fn from_flag(generate: bool, key_path: Option<&Path>) -> HostResult<Self> {
        if generate {
            return Ok(Self::generate());
        }

        match key_path {
            Some(path) => Self::load(path),
            None => Err(HostError::NoKeyStore),
        }
    }

    /// Write the secret key as hex so `load` can read it back
    pub fn save(&self, path: &Path) -> HostResult<()> {
        std::fs::write(path, self.private_key())?;
        Ok(())
    }

    /// Hex-encoded public (verifying) key
    pub fn public_key(&self) -> String {
        hex::encode(self.signing.verifying_key().to_bytes())
    }

    /// Hex-encoded secret key
    pub fn private_key(&self) -> String {
        hex::encode(self.signing.to_bytes())
    }

    /// Short SHA-256 fingerprint of the public key
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.signing.verifying_key().to_bytes());
        hex::encode(&digest[..8])
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("fingerprint", &self.fingerprint())
            .finish_non_exhaustive()
    }
}

fn get_public_key(pair: &KeyPair) -> HostResult<String> {
    Ok(pair.public_key())
}

fn get_private_key(pair: &KeyPair) -> HostResult<String> {
    Ok(pair.private_key())
}

/// The `CK.Crypto` class table
pub fn crypto_class(key_path: Option<PathBuf>) -> NativeClass<KeyPair> {
    NativeClass::new(NAMESPACE, CLASS_NAME, move |generate| {
        let pair = KeyPair::from_flag(generate, key_path.as_deref())?;
        tracing::debug!(
            generate = generate,
            fingerprint = %pair.fingerprint(),
            "Constructed native key pair"
        );
        Ok(pair)
    })
    .with_method("getPublicKey", get_public_key)
    .with_method("getPrivateKey", get_private_key)
}
