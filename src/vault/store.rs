//! # Vault Storage
//!
//! The key-value seam between the vault and whatever the host extension
//! uses for persistence (browser `storage.local` in production, memory in
//! tests).
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      VAULT STORAGE                                      │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  VaultStore Trait                                               │   │
//! │  │  ────────────────                                               │   │
//! │  │                                                                 │   │
//! │  │  • get(key)              - Read one value                       │   │
//! │  │  • set(key, value)       - Write one value                      │   │
//! │  │  • set_many(entries)     - Write a batch as ONE operation       │   │
//! │  │  • remove_many(keys)     - Remove a batch as ONE operation      │   │
//! │  │  • keys_with_prefix(p)   - Enumerate stored key names           │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  The batch operations are the atomicity primitive: password rotation   │
//! │  and reset stage everything in memory and commit with a single call,   │
//! │  so no observer sees a half-rotated vault.                             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Values are the hex blob strings produced by [`crate::vault::EncryptedBlob`]
//! (plus a couple of small metadata records); nothing stored here is ever
//! plaintext key material.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::Result;

/// Key names for vault storage
///
/// All keys share one prefix so reset can enumerate everything the vault
/// owns without touching unrelated extension state.
pub mod keys {
    /// Prefix for every vault-owned storage key
    pub const PREFIX: &str = "aegis_wallet";

    /// The encrypted password tag (existence = "vault initialized")
    pub const PASSWORD_TAG: &str = "aegis_wallet_password_tag";

    /// Prefix for per-account private key records
    pub const ACCOUNT_PREFIX: &str = "aegis_wallet_account_";

    /// Which unlock factor currently encrypts the vault
    pub const FACTOR: &str = "aegis_wallet_factor";

    /// Storage schema version
    pub const VERSION: &str = "aegis_wallet_version";
}

/// Storage interface for the vault
///
/// Implementations are expected to apply `set_many`/`remove_many` as a
/// single storage operation; the host runtime is assumed to serialize
/// calls (browser storage APIs do).
#[async_trait]
pub trait VaultStore: Send + Sync {
    /// Read a single value
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a single value
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Write a batch of values as one operation
    async fn set_many(&self, entries: Vec<(String, String)>) -> Result<()>;

    /// Remove a batch of keys as one operation
    async fn remove_many(&self, keys: &[String]) -> Result<()>;

    /// Enumerate stored key names starting with `prefix`
    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>>;
}

/// In-memory storage backend
///
/// Used in tests and anywhere the host has no persistent storage.
#[derive(Default)]
pub struct MemoryVaultStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryVaultStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VaultStore for MemoryVaultStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn set_many(&self, batch: Vec<(String, String)>) -> Result<()> {
        let mut entries = self.entries.write();
        for (key, value) in batch {
            entries.insert(key, value);
        }
        Ok(())
    }

    async fn remove_many(&self, keys: &[String]) -> Result<()> {
        let mut entries = self.entries.write();
        for key in keys {
            entries.remove(key);
        }
        Ok(())
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .entries
            .read()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_set() {
        let store = MemoryVaultStore::new();

        assert!(store.get("missing").await.unwrap().is_none());

        store.set("k", "v").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_set_many_remove_many() {
        let store = MemoryVaultStore::new();

        store
            .set_many(vec![
                ("a".into(), "1".into()),
                ("b".into(), "2".into()),
                ("c".into(), "3".into()),
            ])
            .await
            .unwrap();

        store
            .remove_many(&["a".to_string(), "c".to_string()])
            .await
            .unwrap();

        assert!(store.get("a").await.unwrap().is_none());
        assert_eq!(store.get("b").await.unwrap().as_deref(), Some("2"));
        assert!(store.get("c").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_keys_with_prefix() {
        let store = MemoryVaultStore::new();

        store.set("aegis_wallet_account_aa", "x").await.unwrap();
        store.set("aegis_wallet_account_bb", "y").await.unwrap();
        store.set("aegis_wallet_password_tag", "z").await.unwrap();
        store.set("unrelated", "w").await.unwrap();

        let mut account_keys = store
            .keys_with_prefix(keys::ACCOUNT_PREFIX)
            .await
            .unwrap();
        account_keys.sort();

        assert_eq!(
            account_keys,
            vec!["aegis_wallet_account_aa", "aegis_wallet_account_bb"]
        );

        let all = store.keys_with_prefix(keys::PREFIX).await.unwrap();
        assert_eq!(all.len(), 3);
    }
}
