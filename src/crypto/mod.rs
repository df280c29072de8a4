//! # Cryptography Module
//!
//! This module provides all cryptographic primitives used by Aegis Core.
//!
//! ## Security Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    CRYPTOGRAPHIC ARCHITECTURE                           │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    KEY HIERARCHY                                │   │
//! │  ├─────────────────────────────────────────────────────────────────┤   │
//! │  │                                                                 │   │
//! │  │  Unlock Factor (password or passkey assertion material)        │   │
//! │  │                          │                                      │   │
//! │  │                          ▼                                      │   │
//! │  │  ┌─────────────────────────────────────────────────────────┐   │   │
//! │  │  │            Encryption Key (256 bits)                     │   │   │
//! │  │  │   Derived via PBKDF2-HMAC-SHA512 (2.5M rounds) over a   │   │   │
//! │  │  │   fresh 64-byte salt stored alongside each blob         │   │   │
//! │  │  └─────────────────────────────────────────────────────────┘   │   │
//! │  │                          │                                      │   │
//! │  │                          ▼                                      │   │
//! │  │  AES-256-GCM over private key material (Ed25519 seeds)         │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 SIGNATURE SCHEME                                │   │
//! │  ├─────────────────────────────────────────────────────────────────┤   │
//! │  │                                                                 │   │
//! │  │  Digital Signatures (Ed25519)                                  │   │
//! │  │  • Signature size: 64 bytes                                    │   │
//! │  │  • Public key size: 32 bytes                                   │   │
//! │  │  • Deterministic (same message = same signature)               │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Algorithm Choices & Rationale
//!
//! | Algorithm | Purpose | Why Chosen |
//! |-----------|---------|------------|
//! | PBKDF2-HMAC-SHA512 | Password hashing | Slow by design, standard |
//! | HKDF-SHA256 | Passkey expansion | Industry standard, well-analyzed |
//! | AES-256-GCM | Encryption | Hardware acceleration, AEAD |
//! | Ed25519 | Signing | Fast, small keys, widely audited |
//!
//! ## Security Considerations
//!
//! 1. **Key Zeroization**: All secret keys are zeroized when dropped
//! 2. **Secure Random**: Using `rand::rngs::OsRng` for salts and nonces
//! 3. **No Key Reuse**: Fresh salt + nonce for every encryption operation

pub mod cipher;
pub mod kdf;

pub use cipher::{decrypt, encrypt, EncryptionKey, Nonce, KEY_SIZE, NONCE_SIZE, TAG_SIZE};
pub use kdf::{
    derive_key, expand_passkey_material, generate_salt, KdfParams, PBKDF2_ITERATIONS, SALT_SIZE,
};
