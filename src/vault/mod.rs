//! # Private Key Vault
//!
//! Encrypted, factor-locked storage for account private keys.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        PRIVATE KEY VAULT                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌──────────────┐   verify / unlock   ┌─────────────────────────────┐  │
//! │  │ UnlockFactor │ ──────────────────► │ PrivateKeyVault             │  │
//! │  │ (password or │                     │                             │  │
//! │  │  passkey)    │                     │  • initialize               │  │
//! │  └──────────────┘                     │  • verify                   │  │
//! │                                       │  • set/get_private_key      │  │
//! │                                       │  • rotate                   │  │
//! │                                       │  • reset                    │  │
//! │                                       │  • list_public_keys         │  │
//! │                                       └──────────────┬──────────────┘  │
//! │                                                      │                 │
//! │                                                      ▼                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │ VaultStore (host key-value storage)                             │   │
//! │  │                                                                 │   │
//! │  │  aegis_wallet_password_tag   → hex(EncryptedBlob(tag const))    │   │
//! │  │  aegis_wallet_account_<pub>  → hex(EncryptedBlob(private key))  │   │
//! │  │  aegis_wallet_factor         → { method, encryption_id }        │   │
//! │  │  aegis_wallet_version        → schema version                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//!
//! | Invariant | How it is held |
//! |-----------|----------------|
//! | Tag existence = initialized | Only `initialize`/`rotate` write it, only `reset` removes it |
//! | Tag decryption = sole password oracle | `verify` is the single check path; mutating ops call it first |
//! | No plaintext at rest | Every stored value is an [`EncryptedBlob`] or non-secret metadata |
//! | Rotation is all-or-nothing | Re-encryption happens in memory, commit is one `set_many` |
//! | Fresh salt + nonce per encryption | `encrypt_with` never reuses either |
//!
//! The vault does not serialize concurrent rotations; the host extension's
//! single settings flow is expected to issue one at a time.

pub mod blob;
pub mod factor;
pub mod passkey;
pub mod store;

use std::sync::Arc;

use zeroize::Zeroizing;

use crate::crypto::{self, KdfParams, Nonce};
use crate::error::{Error, Result};

pub use blob::EncryptedBlob;
pub use factor::{FactorDescriptor, FactorMethod, UnlockFactor};
pub use passkey::PasskeyUnlockAdapter;
pub use store::{keys, MemoryVaultStore, VaultStore};

/// Plaintext of the password tag
///
/// A fixed constant: the tag only needs to be a known value whose
/// authenticated decryption proves the factor, and a constant keeps
/// verification stable across reinstalls of the host extension.
pub const PASSWORD_TAG_PLAINTEXT: &[u8] = b"aegis-wallet-password-tag-v0";

/// Current storage schema version
pub const SCHEMA_VERSION: u32 = 0;

/// The private key vault
///
/// Explicitly constructed over a storage backend; hold it wherever the
/// privileged context keeps its services.
pub struct PrivateKeyVault {
    store: Arc<dyn VaultStore>,
    kdf: KdfParams,
}

impl PrivateKeyVault {
    /// Create a vault with production derivation parameters
    pub fn new(store: Arc<dyn VaultStore>) -> Self {
        Self::with_kdf_params(store, KdfParams::default())
    }

    /// Create a vault with explicit derivation parameters
    pub fn with_kdf_params(store: Arc<dyn VaultStore>, kdf: KdfParams) -> Self {
        Self { store, kdf }
    }

    /// Storage key for an account record
    fn account_key(public_key_hex: &str) -> String {
        format!("{}{}", keys::ACCOUNT_PREFIX, public_key_hex.to_lowercase())
    }

    /// Encrypt `plaintext` under `factor` with a fresh salt and nonce
    fn encrypt_with(&self, factor: &UnlockFactor, plaintext: &[u8]) -> Result<EncryptedBlob> {
        let salt = crypto::generate_salt();
        let key = crypto::derive_key(factor.secret_bytes(), &salt, &self.kdf)?;
        let nonce = Nonce::random();
        let ciphertext = crypto::encrypt(&key, &nonce, plaintext)?;

        Ok(EncryptedBlob::new(*nonce.as_bytes(), salt, ciphertext))
    }

    /// Decrypt a blob under `factor`, using the blob's own salt
    fn decrypt_with(&self, factor: &UnlockFactor, blob: &EncryptedBlob) -> Result<Vec<u8>> {
        let key = crypto::derive_key(factor.secret_bytes(), &blob.salt, &self.kdf)?;
        crypto::decrypt(&key, &Nonce::from_bytes(blob.iv), &blob.ciphertext)
    }

    /// Whether the vault has been initialized (the password tag exists)
    pub async fn is_initialized(&self) -> Result<bool> {
        Ok(self.store.get(keys::PASSWORD_TAG).await?.is_some())
    }

    /// Initialize the vault under `factor`
    ///
    /// Removes any stray account records left by a previous installation,
    /// then writes the tag, schema version and factor descriptor as one
    /// batch. Calling this on an initialized vault re-keys the tag and
    /// orphans existing records; use [`rotate`](Self::rotate) instead.
    pub async fn initialize(&self, factor: &UnlockFactor) -> Result<()> {
        let stray = self.store.keys_with_prefix(keys::ACCOUNT_PREFIX).await?;
        if !stray.is_empty() {
            tracing::debug!(count = stray.len(), "removing stray account records");
            self.store.remove_many(&stray).await?;
        }

        let tag = self.encrypt_with(factor, PASSWORD_TAG_PLAINTEXT)?;
        let descriptor = serde_json::to_string(&FactorDescriptor::for_factor(factor))?;

        self.store
            .set_many(vec![
                (keys::PASSWORD_TAG.to_string(), tag.to_hex()),
                (keys::VERSION.to_string(), SCHEMA_VERSION.to_string()),
                (keys::FACTOR.to_string(), descriptor),
            ])
            .await?;

        tracing::info!("vault initialized");
        Ok(())
    }

    /// Check an unlock factor against the password tag
    ///
    /// This is the only password oracle: the tag is decrypted and its
    /// plaintext compared. An uninitialized vault and a failed decryption
    /// both answer `false`; only structural corruption of the stored tag
    /// is an error.
    pub async fn verify(&self, factor: &UnlockFactor) -> Result<bool> {
        let stored = match self.store.get(keys::PASSWORD_TAG).await? {
            Some(stored) => stored,
            None => return Ok(false),
        };

        let tag = EncryptedBlob::from_hex(&stored)?;
        match self.decrypt_with(factor, &tag) {
            Ok(plaintext) => Ok(plaintext == PASSWORD_TAG_PLAINTEXT),
            Err(Error::DecryptionFailed(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Store a private key under its public key
    ///
    /// Fails with `InvalidPassword` unless `factor` verifies. Each call
    /// encrypts with a fresh salt and nonce, so re-setting the same key
    /// produces a different stored blob.
    pub async fn set_private_key(
        &self,
        public_key_hex: &str,
        private_key: &[u8],
        factor: &UnlockFactor,
    ) -> Result<()> {
        if !self.verify(factor).await? {
            return Err(Error::InvalidPassword);
        }

        let blob = self.encrypt_with(factor, private_key)?;
        self.store
            .set(&Self::account_key(public_key_hex), &blob.to_hex())
            .await?;

        tracing::debug!(public_key = %public_key_hex, "private key stored");
        Ok(())
    }

    /// Retrieve a private key by its public key
    ///
    /// Fails with `InvalidPassword` unless `factor` verifies; returns
    /// `None` when no record exists. Because the factor was just verified,
    /// a record that fails to decrypt here is corrupt and the error is
    /// surfaced rather than treated as a wrong password.
    pub async fn get_private_key(
        &self,
        public_key_hex: &str,
        factor: &UnlockFactor,
    ) -> Result<Option<Zeroizing<Vec<u8>>>> {
        if !self.verify(factor).await? {
            return Err(Error::InvalidPassword);
        }

        let stored = match self.store.get(&Self::account_key(public_key_hex)).await? {
            Some(stored) => stored,
            None => return Ok(None),
        };

        let blob = EncryptedBlob::from_hex(&stored)?;
        let plaintext = self.decrypt_with(factor, &blob)?;

        Ok(Some(Zeroizing::new(plaintext)))
    }

    /// Switch the vault to a new unlock factor
    ///
    /// On an uninitialized vault this degrades to
    /// [`initialize`](Self::initialize) with the new factor (`old_factor`
    /// is ignored). Otherwise `old_factor` must verify; every record is
    /// decrypted with it and re-encrypted with `new_factor` (fresh salts
    /// and nonces) entirely in memory, then the new tag, all records and
    /// the factor descriptor are committed as a single batched write.
    pub async fn rotate(
        &self,
        old_factor: Option<&UnlockFactor>,
        new_factor: &UnlockFactor,
    ) -> Result<()> {
        if !self.is_initialized().await? {
            tracing::debug!("vault uninitialized, rotation degrades to initialize");
            return self.initialize(new_factor).await;
        }

        let old_factor = old_factor.ok_or(Error::InvalidPassword)?;
        if !self.verify(old_factor).await? {
            return Err(Error::InvalidPassword);
        }

        let mut batch = Vec::new();
        for key in self.store.keys_with_prefix(keys::ACCOUNT_PREFIX).await? {
            let stored = match self.store.get(&key).await? {
                Some(stored) => stored,
                None => continue,
            };

            let blob = EncryptedBlob::from_hex(&stored)?;
            let plaintext = Zeroizing::new(self.decrypt_with(old_factor, &blob)?);
            let reencrypted = self.encrypt_with(new_factor, &plaintext)?;
            batch.push((key, reencrypted.to_hex()));
        }

        let record_count = batch.len();
        let tag = self.encrypt_with(new_factor, PASSWORD_TAG_PLAINTEXT)?;
        let descriptor = serde_json::to_string(&FactorDescriptor::for_factor(new_factor))?;
        batch.push((keys::PASSWORD_TAG.to_string(), tag.to_hex()));
        batch.push((keys::FACTOR.to_string(), descriptor));

        self.store.set_many(batch).await?;

        tracing::info!(records = record_count, "vault rotated to new unlock factor");
        Ok(())
    }

    /// Wipe the vault unconditionally
    ///
    /// Removes the tag, metadata and every account record in one batch.
    /// No factor required; idempotent.
    pub async fn reset(&self) -> Result<()> {
        let mut targets = self.store.keys_with_prefix(keys::ACCOUNT_PREFIX).await?;
        targets.push(keys::PASSWORD_TAG.to_string());
        targets.push(keys::FACTOR.to_string());
        targets.push(keys::VERSION.to_string());

        self.store.remove_many(&targets).await?;

        tracing::info!("vault reset");
        Ok(())
    }

    /// List the public keys of all stored records
    ///
    /// Requires no factor (public keys are not secret). Empty for an
    /// uninitialized vault.
    pub async fn list_public_keys(&self) -> Result<Vec<String>> {
        let mut public_keys: Vec<String> = self
            .store
            .keys_with_prefix(keys::ACCOUNT_PREFIX)
            .await?
            .into_iter()
            .map(|key| key[keys::ACCOUNT_PREFIX.len()..].to_string())
            .collect();
        public_keys.sort();

        Ok(public_keys)
    }

    /// The descriptor of the currently active unlock factor, if any
    pub async fn active_factor(&self) -> Result<Option<FactorDescriptor>> {
        match self.store.get(keys::FACTOR).await? {
            Some(stored) => Ok(Some(serde_json::from_str(&stored)?)),
            None => Ok(None),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::kdf::KdfParams;

    const PUB_A: &str = "aa11";
    const PUB_B: &str = "bb22";

    fn test_vault() -> (Arc<MemoryVaultStore>, PrivateKeyVault) {
        let store = Arc::new(MemoryVaultStore::new());
        let vault =
            PrivateKeyVault::with_kdf_params(store.clone(), KdfParams { iterations: 1_000 });
        (store, vault)
    }

    #[tokio::test]
    async fn test_initialize_and_verify() {
        let (_, vault) = test_vault();
        let factor = UnlockFactor::password("correct horse");

        assert!(!vault.is_initialized().await.unwrap());
        assert!(!vault.verify(&factor).await.unwrap());

        vault.initialize(&factor).await.unwrap();

        assert!(vault.is_initialized().await.unwrap());
        assert!(vault.verify(&factor).await.unwrap());
        assert!(!vault
            .verify(&UnlockFactor::password("battery staple"))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_initialize_writes_metadata() {
        let (store, vault) = test_vault();
        vault
            .initialize(&UnlockFactor::password("pw"))
            .await
            .unwrap();

        assert_eq!(
            store.get(keys::VERSION).await.unwrap().as_deref(),
            Some("0")
        );
        let descriptor = vault.active_factor().await.unwrap().unwrap();
        assert_eq!(descriptor.method, FactorMethod::Password);
        assert!(descriptor.encryption_id.is_none());
    }

    #[tokio::test]
    async fn test_initialize_removes_stray_records() {
        let (store, vault) = test_vault();

        // Leftover from a previous installation, encrypted under a
        // password nobody knows anymore
        store
            .set(&PrivateKeyVault::account_key(PUB_A), "deadbeef")
            .await
            .unwrap();

        vault
            .initialize(&UnlockFactor::password("pw"))
            .await
            .unwrap();

        assert!(vault.list_public_keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_get_round_trip() {
        let (_, vault) = test_vault();
        let factor = UnlockFactor::password("pw");
        vault.initialize(&factor).await.unwrap();

        vault
            .set_private_key(PUB_A, &[7u8; 32], &factor)
            .await
            .unwrap();

        let retrieved = vault.get_private_key(PUB_A, &factor).await.unwrap().unwrap();
        assert_eq!(&*retrieved, &[7u8; 32]);
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let (_, vault) = test_vault();
        let factor = UnlockFactor::password("pw");
        vault.initialize(&factor).await.unwrap();

        assert!(vault
            .get_private_key(PUB_A, &factor)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_wrong_factor_rejected_before_lookup() {
        let (_, vault) = test_vault();
        let factor = UnlockFactor::password("pw");
        vault.initialize(&factor).await.unwrap();
        vault
            .set_private_key(PUB_A, &[7u8; 32], &factor)
            .await
            .unwrap();

        let wrong = UnlockFactor::password("not pw");
        assert!(matches!(
            vault.get_private_key(PUB_A, &wrong).await,
            Err(Error::InvalidPassword)
        ));
        assert!(matches!(
            vault.set_private_key(PUB_B, &[8u8; 32], &wrong).await,
            Err(Error::InvalidPassword)
        ));
    }

    #[tokio::test]
    async fn test_set_before_initialize_rejected() {
        let (_, vault) = test_vault();

        let result = vault
            .set_private_key(PUB_A, &[7u8; 32], &UnlockFactor::password("pw"))
            .await;
        assert!(matches!(result, Err(Error::InvalidPassword)));
    }

    #[tokio::test]
    async fn test_corrupt_record_surfaces_decryption_error() {
        let (store, vault) = test_vault();
        let factor = UnlockFactor::password("pw");
        vault.initialize(&factor).await.unwrap();
        vault
            .set_private_key(PUB_A, &[7u8; 32], &factor)
            .await
            .unwrap();

        // Flip a ciphertext byte in the stored blob
        let key = PrivateKeyVault::account_key(PUB_A);
        let stored = store.get(&key).await.unwrap().unwrap();
        let mut blob = EncryptedBlob::from_hex(&stored).unwrap();
        blob.ciphertext[0] ^= 0xFF;
        store.set(&key, &blob.to_hex()).await.unwrap();

        let result = vault.get_private_key(PUB_A, &factor).await;
        assert!(matches!(result, Err(Error::DecryptionFailed(_))));
    }

    #[tokio::test]
    async fn test_malformed_record_surfaces_malformed_data() {
        let (store, vault) = test_vault();
        let factor = UnlockFactor::password("pw");
        vault.initialize(&factor).await.unwrap();

        store
            .set(&PrivateKeyVault::account_key(PUB_A), "abcd")
            .await
            .unwrap();

        let result = vault.get_private_key(PUB_A, &factor).await;
        assert!(matches!(result, Err(Error::MalformedData(_))));
    }

    #[tokio::test]
    async fn test_rotate_preserves_keys_and_rejects_old_factor() {
        let (_, vault) = test_vault();
        let old = UnlockFactor::password("old password");
        let new = UnlockFactor::password("new password");

        vault.initialize(&old).await.unwrap();
        vault.set_private_key(PUB_A, &[1u8; 32], &old).await.unwrap();
        vault.set_private_key(PUB_B, &[2u8; 32], &old).await.unwrap();

        vault.rotate(Some(&old), &new).await.unwrap();

        assert!(vault.verify(&new).await.unwrap());
        assert!(!vault.verify(&old).await.unwrap());

        let a = vault.get_private_key(PUB_A, &new).await.unwrap().unwrap();
        let b = vault.get_private_key(PUB_B, &new).await.unwrap().unwrap();
        assert_eq!(&*a, &[1u8; 32]);
        assert_eq!(&*b, &[2u8; 32]);

        assert!(matches!(
            vault.get_private_key(PUB_A, &old).await,
            Err(Error::InvalidPassword)
        ));
    }

    #[tokio::test]
    async fn test_rotate_with_wrong_old_factor_changes_nothing() {
        let (_, vault) = test_vault();
        let factor = UnlockFactor::password("pw");
        vault.initialize(&factor).await.unwrap();
        vault
            .set_private_key(PUB_A, &[1u8; 32], &factor)
            .await
            .unwrap();

        let result = vault
            .rotate(
                Some(&UnlockFactor::password("wrong")),
                &UnlockFactor::password("new"),
            )
            .await;
        assert!(matches!(result, Err(Error::InvalidPassword)));

        // Old factor still works, nothing was re-encrypted
        assert!(vault.verify(&factor).await.unwrap());
        let a = vault.get_private_key(PUB_A, &factor).await.unwrap().unwrap();
        assert_eq!(&*a, &[1u8; 32]);
    }

    #[tokio::test]
    async fn test_rotate_without_old_factor_rejected_when_initialized() {
        let (_, vault) = test_vault();
        vault
            .initialize(&UnlockFactor::password("pw"))
            .await
            .unwrap();

        let result = vault.rotate(None, &UnlockFactor::password("new")).await;
        assert!(matches!(result, Err(Error::InvalidPassword)));
    }

    #[tokio::test]
    async fn test_rotate_uninitialized_degrades_to_initialize() {
        let (_, vault) = test_vault();
        let new = UnlockFactor::password("brand new");

        vault.rotate(None, &new).await.unwrap();

        assert!(vault.is_initialized().await.unwrap());
        assert!(vault.verify(&new).await.unwrap());
    }

    #[tokio::test]
    async fn test_reset_is_unconditional_and_idempotent() {
        let (store, vault) = test_vault();
        let factor = UnlockFactor::password("pw");
        vault.initialize(&factor).await.unwrap();
        vault
            .set_private_key(PUB_A, &[1u8; 32], &factor)
            .await
            .unwrap();

        vault.reset().await.unwrap();

        assert!(!vault.is_initialized().await.unwrap());
        assert!(vault.list_public_keys().await.unwrap().is_empty());
        assert!(store.get(keys::VERSION).await.unwrap().is_none());
        assert!(store.get(keys::FACTOR).await.unwrap().is_none());

        // Second reset on an empty vault is a no-op
        vault.reset().await.unwrap();
    }

    #[tokio::test]
    async fn test_list_public_keys_sorted() {
        let (_, vault) = test_vault();
        let factor = UnlockFactor::password("pw");
        vault.initialize(&factor).await.unwrap();

        vault
            .set_private_key(PUB_B, &[2u8; 32], &factor)
            .await
            .unwrap();
        vault
            .set_private_key(PUB_A, &[1u8; 32], &factor)
            .await
            .unwrap();

        assert_eq!(
            vault.list_public_keys().await.unwrap(),
            vec![PUB_A.to_string(), PUB_B.to_string()]
        );
    }

    #[tokio::test]
    async fn test_empty_password_is_a_valid_factor() {
        let (_, vault) = test_vault();
        let empty = UnlockFactor::password("");

        vault.initialize(&empty).await.unwrap();
        assert!(vault.verify(&empty).await.unwrap());
        assert!(!vault.verify(&UnlockFactor::password(" ")).await.unwrap());
    }
}
