//! # Key Derivation Functions
//!
//! This module turns unlock-factor secrets (passwords, passkey material)
//! into AES-256 encryption keys.
//!
//! ## Key Derivation Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    KEY DERIVATION HIERARCHY                             │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────────────┐     ┌─────────────────────────────────┐   │
//! │  │   PASSWORD (UTF-8)      │     │   PASSKEY ASSERTION             │   │
//! │  │                         │     │                                 │   │
//! │  │  User-chosen secret,    │     │  Input key material from the    │   │
//! │  │  any length (policy is  │     │  authenticator, bound to one    │   │
//! │  │  enforced by the UI)    │     │  credential ID                  │   │
//! │  └────────────┬────────────┘     └───────────────┬─────────────────┘   │
//! │               │                                  │                     │
//! │               │                                  ▼                     │
//! │               │                  ┌─────────────────────────────────┐   │
//! │               │                  │  HKDF-SHA256(                   │   │
//! │               │                  │    ikm  = assertion material,   │   │
//! │               │                  │    salt = credential_id,        │   │
//! │               │                  │    info = "aegis-passkey-       │   │
//! │               │                  │            factor-v1"           │   │
//! │               │                  │  )  → 32-byte factor secret     │   │
//! │               │                  └───────────────┬─────────────────┘   │
//! │               │                                  │                     │
//! │               └──────────────┬───────────────────┘                     │
//! │                              ▼                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  SLOW PASSWORD HASH                             │   │
//! │  │                                                                 │   │
//! │  │  PBKDF2-HMAC-SHA512(                                           │   │
//! │  │    password = factor secret,                                   │   │
//! │  │    salt = per-blob random 64 bytes,                            │   │
//! │  │    iterations = 2,500,000,                                     │   │
//! │  │    output_length = 32 bytes                                    │   │
//! │  │  )                                                             │   │
//! │  │                                                                 │   │
//! │  │  → 256-bit AES key (512-bit intermediate hash, truncated)      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Security Considerations
//!
//! | Aspect | Design Choice | Rationale |
//! |--------|---------------|-----------|
//! | Slow hash | PBKDF2-HMAC-SHA512, 2.5M iterations | Offline guessing cost |
//! | Salt | 64 random bytes per encryption | No cross-blob rainbow tables |
//! | Passkey expansion | HKDF salted by credential ID | Per-credential separation |
//! | Version string | "-v1" suffix | Allows future algorithm upgrades |
//!
//! Derivation is deterministic for a given (secret, salt, iterations) and
//! never logs or stores any of its inputs or outputs. An empty secret is
//! derived like any other; rejecting weak passwords is a UI concern.

use hkdf::Hkdf;
use hmac::Hmac;
use sha2::{Sha256, Sha512};

use crate::crypto::cipher::{EncryptionKey, KEY_SIZE};
use crate::error::{Error, Result};

/// Domain separation strings for HKDF
///
/// These ensure that keys derived for different purposes are cryptographically
/// independent, even when derived from the same input material.
pub mod domain {
    /// Domain for expanding passkey assertion material into a factor secret
    pub const PASSKEY_FACTOR: &[u8] = b"aegis-passkey-factor-v1";
}

/// Size of the per-blob random salt in bytes
pub const SALT_SIZE: usize = 64;

/// Production PBKDF2 iteration count
///
/// High enough that a single derivation takes a perceptible fraction of a
/// second on commodity hardware. Unlock flows derive at most a handful of
/// keys, so the latency lands on the attacker, not the user.
pub const PBKDF2_ITERATIONS: u32 = 2_500_000;

/// Tunable derivation parameters
///
/// The iteration count is fixed in production but injectable so tests can
/// use a cheap profile.
#[derive(Clone, Copy, Debug)]
pub struct KdfParams {
    /// PBKDF2 iteration count
    pub iterations: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            iterations: PBKDF2_ITERATIONS,
        }
    }
}

/// Generate a fresh random salt
pub fn generate_salt() -> [u8; SALT_SIZE] {
    use rand::RngCore;

    let mut salt = [0u8; SALT_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut salt);
    salt
}

/// Derive an AES-256 encryption key from an unlock-factor secret
///
/// ## Process
///
/// ```text
/// Secret bytes + 64-byte salt
///       │
///       └──► PBKDF2-HMAC-SHA512 (params.iterations) → 32-byte key
/// ```
///
/// Deterministic: the same (secret, salt, iterations) always yields the
/// same key. Every encryption uses a fresh salt, so derived keys are
/// never shared across blobs.
pub fn derive_key(secret: &[u8], salt: &[u8; SALT_SIZE], params: &KdfParams) -> Result<EncryptionKey> {
    let mut key = [0u8; KEY_SIZE];
    pbkdf2::pbkdf2::<Hmac<Sha512>>(secret, salt, params.iterations, &mut key)
        .map_err(|_| Error::KeyDerivationFailed("PBKDF2 derivation failed".into()))?;

    Ok(EncryptionKey::from_bytes(key))
}

/// Expand passkey assertion material into a 32-byte factor secret
///
/// The credential ID is used as the HKDF salt so that two credentials
/// asserting identical input material still produce independent secrets.
/// The result feeds [`derive_key`] exactly as a password would.
pub fn expand_passkey_material(credential_id: &str, ikm: &[u8]) -> Result<[u8; 32]> {
    let hkdf = Hkdf::<Sha256>::new(Some(credential_id.as_bytes()), ikm);

    let mut secret = [0u8; 32];
    hkdf.expand(domain::PASSKEY_FACTOR, &mut secret)
        .map_err(|_| Error::KeyDerivationFailed("Failed to expand passkey material".into()))?;

    Ok(secret)
}

// ============================================================================
// TESTS
// ============================================================================
