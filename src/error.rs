//! # Error Handling
//!
//! This module provides the error types for Aegis Core.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           ERROR HIERARCHY                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Error (top-level)                                                      │
//! │  │                                                                      │
//! │  ├── Vault Errors                                                       │
//! │  │   ├── InvalidPassword       - Unlock factor failed verification     │
//! │  │   └── MalformedData         - Stored blob fails structural checks   │
//! │  │                                                                      │
//! │  ├── Crypto Errors                                                      │
//! │  │   ├── EncryptionFailed      - Encryption operation failed           │
//! │  │   ├── DecryptionFailed      - Authentication/decryption failed      │
//! │  │   ├── KeyDerivationFailed   - Failed to derive keys                 │
//! │  │   ├── SigningFailed         - Signing operation failed              │
//! │  │   └── InvalidKey            - Invalid key format/length             │
//! │  │                                                                      │
//! │  ├── Storage Errors                                                     │
//! │  │   ├── StorageReadError      - Failed to read from storage           │
//! │  │   └── StorageWriteError     - Failed to write to storage            │
//! │  │                                                                      │
//! │  ├── Protocol Errors                                                    │
//! │  │   ├── Timeout               - No matching response before deadline  │
//! │  │   ├── ProtocolDecodeError   - Relay message could not be decoded    │
//! │  │   ├── UnknownMethod         - Request reference not recognized      │
//! │  │   ├── UnknownAccount        - Signer has no vault record            │
//! │  │   ├── RelayClosed           - Relay channel shut down               │
//! │  │   └── RequestRejected       - Remote answered with an error         │
//! │  │                                                                      │
//! │  └── Internal Errors                                                    │
//! │      └── SerializationError    - serde failure                         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Errors crossing the wire are flattened to `{ code, message }` in response
//! envelopes, so every variant carries a stable numeric code.

use thiserror::Error;

/// Result type alias for Aegis Core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Aegis Core
///
/// All errors are categorized by module/domain to make error handling
/// clearer and to provide meaningful error messages to users.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Vault Errors (100-199)
    // ========================================================================

    /// The supplied unlock factor failed verification against the password tag
    #[error("Invalid password or unlock factor.")]
    InvalidPassword,

    /// Stored data fails structural validation (before any crypto is attempted)
    #[error("Malformed stored data: {0}")]
    MalformedData(String),

    // ========================================================================
    // Crypto Errors (200-299)
    // ========================================================================

    /// Encryption failed
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Decryption or authentication failed
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    /// Key derivation failed
    #[error("Failed to derive keys: {0}")]
    KeyDerivationFailed(String),

    /// Signing failed
    #[error("Signing failed: {0}")]
    SigningFailed(String),

    /// Invalid key format or length
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    // ========================================================================
    // Storage Errors (300-399)
    // ========================================================================

    /// Failed to read from storage
    #[error("Failed to read from storage: {0}")]
    StorageReadError(String),

    /// Failed to write to storage
    #[error("Failed to write to storage: {0}")]
    StorageWriteError(String),

    // ========================================================================
    // Protocol Errors (400-499)
    // ========================================================================

    /// No matching response arrived before the deadline
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// A message on the response channel could not be decoded
    #[error("Failed to decode relay message: {0}")]
    ProtocolDecodeError(String),

    /// Request reference does not name a supported method
    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    /// The requested signer has no record in the vault
    #[error("Unknown account: {0}")]
    UnknownAccount(String),

    /// The relay channel has shut down with requests still pending
    #[error("Relay channel closed.")]
    RelayClosed,

    /// The remote side answered the request with an error
    #[error("Request rejected by remote (code {code}): {message}")]
    RequestRejected {
        /// Stable numeric code reported by the remote side
        code: i32,
        /// Human-readable message reported by the remote side
        message: String,
    },

    // ========================================================================
    // Internal Errors (900-999)
    // ========================================================================

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl Error {
    /// Get the stable numeric error code
    ///
    /// Error codes are organized by category:
    /// - 100-199: Vault
    /// - 200-299: Crypto
    /// - 300-399: Storage
    /// - 400-499: Protocol
    /// - 900-999: Internal
    pub fn code(&self) -> i32 {
        match self {
            // Vault (100-199)
            Error::InvalidPassword => 100,
            Error::MalformedData(_) => 101,

            // Crypto (200-299)
            Error::EncryptionFailed(_) => 200,
            Error::DecryptionFailed(_) => 201,
            Error::KeyDerivationFailed(_) => 202,
            Error::SigningFailed(_) => 203,
            Error::InvalidKey(_) => 204,

            // Storage (300-399)
            Error::StorageReadError(_) => 300,
            Error::StorageWriteError(_) => 301,

            // Protocol (400-499)
            Error::Timeout(_) => 400,
            Error::ProtocolDecodeError(_) => 401,
            Error::UnknownMethod(_) => 402,
            Error::UnknownAccount(_) => 403,
            Error::RelayClosed => 404,
            Error::RequestRejected { .. } => 405,

            // Internal (900-999)
            Error::SerializationError(_) => 900,
        }
    }

    /// Check if this error is recoverable
    ///
    /// Recoverable errors can potentially be resolved by retrying
    /// or by user action (re-entering a password, re-approving a request).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::InvalidPassword | Error::Timeout(_) | Error::RequestRejected { .. }
        )
    }
}

// ============================================================================
// ERROR CONVERSIONS
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}

// ============================================================================
// TESTS
// ============================================================================
