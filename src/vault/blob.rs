//! # Encrypted Blob Format
//!
//! The on-disk shape of every encrypted vault value.
//!
//! ## Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      ENCRYPTED BLOB LAYOUT                              │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │   ┌──────────┬────────────────┬────────────────────────────────┐       │
//! │   │ IV       │ Salt           │ Ciphertext + Auth Tag          │       │
//! │   │ 16 bytes │ 64 bytes       │ variable (≥ 16 bytes)          │       │
//! │   └──────────┴────────────────┴────────────────────────────────┘       │
//! │                                                                         │
//! │   Persisted as one lowercase hex string:                               │
//! │   hex(iv) ‖ hex(salt) ‖ hex(ciphertext)                                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Parsing validates structure BEFORE any key derivation or decryption is
//! attempted: bad hex or a value too short to contain an IV and salt is
//! `MalformedData`, never a silent truncation and never a crypto error.

use crate::crypto::{NONCE_SIZE, SALT_SIZE};
use crate::error::{Error, Result};

/// An encrypted value in the vault's storage format
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncryptedBlob {
    /// AES-GCM nonce (stored first)
    pub iv: [u8; NONCE_SIZE],
    /// PBKDF2 salt used to derive this blob's key
    pub salt: [u8; SALT_SIZE],
    /// Ciphertext with the authentication tag appended
    pub ciphertext: Vec<u8>,
}

impl EncryptedBlob {
    /// Minimum decoded length: IV + salt (the tag check catches an absent
    /// or truncated ciphertext)
    pub const MIN_LEN: usize = NONCE_SIZE + SALT_SIZE;

    /// Assemble a blob from its parts
    pub fn new(iv: [u8; NONCE_SIZE], salt: [u8; SALT_SIZE], ciphertext: Vec<u8>) -> Self {
        Self {
            iv,
            salt,
            ciphertext,
        }
    }

    /// Serialize to the stored hex representation
    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity((Self::MIN_LEN + self.ciphertext.len()) * 2);
        out.push_str(&hex::encode(self.iv));
        out.push_str(&hex::encode(self.salt));
        out.push_str(&hex::encode(&self.ciphertext));
        out
    }

    /// Parse a stored hex string back into a blob
    ///
    /// ## Errors
    ///
    /// `MalformedData` when the value is not valid hex or is too short to
    /// contain the IV and salt.
    pub fn from_hex(stored: &str) -> Result<Self> {
        let bytes = hex::decode(stored)
            .map_err(|_| Error::MalformedData("Stored value is not valid hex".into()))?;

        if bytes.len() < Self::MIN_LEN {
            return Err(Error::MalformedData(format!(
                "Stored value too short: {} bytes, need at least {}",
                bytes.len(),
                Self::MIN_LEN
            )));
        }

        let mut iv = [0u8; NONCE_SIZE];
        iv.copy_from_slice(&bytes[..NONCE_SIZE]);

        let mut salt = [0u8; SALT_SIZE];
        salt.copy_from_slice(&bytes[NONCE_SIZE..Self::MIN_LEN]);

        Ok(Self {
            iv,
            salt,
            ciphertext: bytes[Self::MIN_LEN..].to_vec(),
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
