//! # Aegis Core
//!
//! The core library of the Aegis browser-extension wallet: an encrypted
//! private key vault and the cross-context protocol that lets web pages
//! request signatures from it.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         AEGIS CORE MODULES                              │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌──────────────────────────┐       ┌──────────────────────────────┐   │
//! │  │         Vault            │       │         Protocol             │   │
//! │  │                          │       │                              │   │
//! │  │ - PrivateKeyVault        │◄──────│ - RequestCorrelator          │   │
//! │  │ - UnlockFactor           │       │ - SigningGateway             │   │
//! │  │ - PasskeyUnlockAdapter   │       │ - MessageBus (relay)         │   │
//! │  │ - VaultStore             │       │ - Request/Response envelopes │   │
//! │  └───────────┬──────────────┘       └──────────────────────────────┘   │
//! │              │                                                          │
//! │  ┌───────────▼──────────────┐                                          │
//! │  │         Crypto           │                                          │
//! │  │                          │                                          │
//! │  │ - PBKDF2-HMAC-SHA512     │                                          │
//! │  │ - AES-256-GCM (16B IV)   │                                          │
//! │  │ - HKDF passkey expansion │                                          │
//! │  └──────────────────────────┘                                          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Hierarchy
//!
//! - [`error`] - Error types for the entire library
//! - [`crypto`] - Cryptographic primitives (derivation, encryption)
//! - [`vault`] - Factor-locked private key storage
//! - [`protocol`] - Cross-context request/response plumbing
//!
//! ## Security Model
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          SECURITY LAYERS                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Layer 1: Key Encryption at Rest (PBKDF2 + AES-256-GCM)                 │
//! │  ──────────────────────────────────────────────────────                 │
//! │  Private keys only ever touch storage inside authenticated              │
//! │  ciphertext, keyed by a slow hash of the active unlock factor           │
//! │  over a fresh per-blob salt.                                            │
//! │                                                                         │
//! │  Layer 2: Factor Verification (password tag)                            │
//! │  ───────────────────────────────────────────                            │
//! │  One encrypted tag whose authenticated decryption is the only           │
//! │  way any code path learns whether a factor is correct.                  │
//! │                                                                         │
//! │  Layer 3: Boundary Validation (closed envelope types)                   │
//! │  ────────────────────────────────────────────────────                   │
//! │  The relay between contexts is untrusted text; every message            │
//! │  must parse into a closed tagged union before it means anything,        │
//! │  and responses must match a pending request by ID and channel.          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Services are constructed explicitly and composed by the host; the crate
//! holds no global state.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod crypto;
pub mod error;
pub mod protocol;
pub mod vault;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use error::{Error, Result};
pub use protocol::{
    MessageBus, PendingResponse, RequestCorrelator, RequestEnvelope, RequestPayload,
    ResponseEnvelope, ResponsePayload, SigningGateway,
};
pub use vault::{
    FactorDescriptor, FactorMethod, MemoryVaultStore, PasskeyUnlockAdapter, PrivateKeyVault,
    UnlockFactor, VaultStore,
};

/// Library version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
