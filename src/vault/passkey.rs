//! # Passkey Unlock
//!
//! Migrates vault encryption from a password onto a passkey credential.
//!
//! ## Flow
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      PASSKEY RE-ENCRYPTION                              │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Authenticator assertion                                               │
//! │  (credential_id, input key material)                                    │
//! │            │                                                            │
//! │            ▼                                                            │
//! │  derive_factor ──► HKDF(salt = credential_id) ──► UnlockFactor::Passkey │
//! │            │                                                            │
//! │            ▼                                                            │
//! │  sleep(delay)      ← progress UI pacing; NOTHING is written yet,        │
//! │            │         so dropping the future here discards the whole     │
//! │            │         migration with no partial state                    │
//! │            ▼                                                            │
//! │  decrypt with current factor → re-encrypt with passkey factor           │
//! │            │                                                            │
//! │            ▼                                                            │
//! │  ONE batched write: record(s) + factor descriptor                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use zeroize::Zeroizing;

use crate::crypto;
use crate::error::{Error, Result};
use crate::vault::factor::{FactorDescriptor, UnlockFactor};
use crate::vault::store::keys;
use crate::vault::{EncryptedBlob, PrivateKeyVault};

/// Re-encrypts vault contents under a passkey-derived factor
#[derive(Clone)]
pub struct PasskeyUnlockAdapter {
    vault: Arc<PrivateKeyVault>,
}

impl PasskeyUnlockAdapter {
    /// Create an adapter over a vault
    pub fn new(vault: Arc<PrivateKeyVault>) -> Self {
        Self { vault }
    }

    /// Derive an unlock factor from a passkey assertion
    ///
    /// Deterministic per (credential, material): asserting the same
    /// credential always reproduces the factor that encrypted the vault.
    pub fn derive_factor(credential_id: &str, input_key_material: &[u8]) -> Result<UnlockFactor> {
        let secret = crypto::expand_passkey_material(credential_id, input_key_material)?;

        Ok(UnlockFactor::Passkey {
            credential_id: credential_id.to_string(),
            secret,
        })
    }

    /// Re-encrypt a single private key record under a passkey factor
    ///
    /// Sleeps `delay` first (onboarding UIs stagger records to animate
    /// progress), then decrypts the record with `current_factor` and
    /// persists the re-encrypted record together with the updated factor
    /// descriptor as one batch. Cancelling (dropping the future) before
    /// the delay elapses leaves storage untouched.
    pub async fn reencrypt_private_key(
        &self,
        public_key_hex: &str,
        current_factor: &UnlockFactor,
        passkey_factor: &UnlockFactor,
        delay: Duration,
    ) -> Result<()> {
        tokio::time::sleep(delay).await;

        if !self.vault.verify(current_factor).await? {
            return Err(Error::InvalidPassword);
        }

        let key = PrivateKeyVault::account_key(public_key_hex);
        let stored = self
            .vault
            .store
            .get(&key)
            .await?
            .ok_or_else(|| Error::UnknownAccount(public_key_hex.to_string()))?;

        let blob = EncryptedBlob::from_hex(&stored)?;
        let plaintext = Zeroizing::new(self.vault.decrypt_with(current_factor, &blob)?);
        let reencrypted = self.vault.encrypt_with(passkey_factor, &plaintext)?;

        let descriptor = serde_json::to_string(&FactorDescriptor::for_factor(passkey_factor))?;
        self.vault
            .store
            .set_many(vec![
                (key, reencrypted.to_hex()),
                (keys::FACTOR.to_string(), descriptor),
            ])
            .await?;

        tracing::debug!(public_key = %public_key_hex, "record re-encrypted under passkey");
        Ok(())
    }

    /// Re-encrypt the whole vault under a passkey factor
    ///
    /// The delayed, all-at-once form of
    /// [`reencrypt_private_key`](Self::reencrypt_private_key): after the
    /// delay, rotates the tag and every record onto the passkey factor in
    /// one batched write.
    pub async fn enable(
        &self,
        current_factor: &UnlockFactor,
        passkey_factor: &UnlockFactor,
        delay: Duration,
    ) -> Result<()> {
        tokio::time::sleep(delay).await;

        self.vault
            .rotate(Some(current_factor), passkey_factor)
            .await
    }
}

// ============================================================================
// TESTS
// ============================================================================
