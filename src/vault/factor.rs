//! # Unlock Factors
//!
//! A vault is encrypted under exactly one unlock factor at a time: the
//! user's password, or a wrapping secret derived from a passkey assertion
//! (see [`crate::vault::passkey`]). Both reduce to secret bytes that feed
//! the same PBKDF2 pipeline, so the rest of the vault never branches on
//! which factor is active.

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// The secret side of an unlock factor
///
/// Zeroized when dropped. `Debug` is implemented by hand so secrets can
/// never leak through logging.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub enum UnlockFactor {
    /// User-chosen password
    Password(String),

    /// Passkey-derived wrapping secret
    Passkey {
        /// Credential ID reported by the authenticator
        credential_id: String,
        /// 32-byte secret expanded from the assertion material
        secret: [u8; 32],
    },
}

impl UnlockFactor {
    /// Create a password factor
    pub fn password(password: impl Into<String>) -> Self {
        Self::Password(password.into())
    }

    /// The secret bytes this factor contributes to key derivation
    pub(crate) fn secret_bytes(&self) -> &[u8] {
        match self {
            Self::Password(password) => password.as_bytes(),
            Self::Passkey { secret, .. } => secret,
        }
    }

    /// Which method this factor represents
    pub fn method(&self) -> FactorMethod {
        match self {
            Self::Password(_) => FactorMethod::Password,
            Self::Passkey { .. } => FactorMethod::Passkey,
        }
    }

    /// The credential ID for passkey factors, `None` for passwords
    pub fn encryption_id(&self) -> Option<&str> {
        match self {
            Self::Password(_) => None,
            Self::Passkey { credential_id, .. } => Some(credential_id),
        }
    }
}

impl std::fmt::Debug for UnlockFactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Password(_) => f.write_str("UnlockFactor::Password(<redacted>)"),
            Self::Passkey { credential_id, .. } => f
                .debug_struct("UnlockFactor::Passkey")
                .field("credential_id", credential_id)
                .field("secret", &"<redacted>")
                .finish(),
        }
    }
}

/// Which kind of factor currently encrypts the vault
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorMethod {
    /// Password-based encryption
    Password,
    /// Passkey-based encryption
    Passkey,
}

/// Persisted record of the active unlock factor
///
/// Stored as JSON under [`crate::vault::store::keys::FACTOR`], written in
/// the same batch as the records it describes so it can never disagree
/// with them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorDescriptor {
    /// Active encryption method
    pub method: FactorMethod,
    /// Credential ID for passkeys, `None` for passwords
    pub encryption_id: Option<String>,
}

impl FactorDescriptor {
    /// Describe the given factor
    pub fn for_factor(factor: &UnlockFactor) -> Self {
        Self {
            method: factor.method(),
            encryption_id: factor.encryption_id().map(str::to_string),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
