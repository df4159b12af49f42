//! Session state: which wallet is connected and under which account.

use std::sync::Arc;
use tracing::{info, warn};

use lumen_core::crypto::PublicKey;
use lumen_core::error::StorageError;
use lumen_core::traits::KeyValueStore;

use crate::storage::{PUBLIC_KEY, SECRET_KEY, WALLET};
use crate::wallet::WalletKind;

/// Session view over a shared key-value store.
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn KeyValueStore>,
}

impl Session {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn save_public_key(&self, public_key: &PublicKey) -> Result<(), StorageError> {
        self.store.store_item(PUBLIC_KEY, &public_key.account_id())
    }

    /// Record a successful connection of `kind` as `public_key`.
    pub fn persist_wallet(
        &self,
        kind: WalletKind,
        public_key: &PublicKey,
    ) -> Result<(), StorageError> {
        self.store.store_item(WALLET, kind.name())?;
        self.save_public_key(public_key)
    }

    /// The stored account, if any. A stored value that no longer parses is
    /// treated as absent.
    pub fn public_key(&self) -> Result<Option<PublicKey>, StorageError> {
        let Some(raw) = self.store.get_item(PUBLIC_KEY)? else {
            return Ok(None);
        };
        match PublicKey::from_account_id(&raw) {
            Ok(pk) => Ok(Some(pk)),
            Err(e) => {
                warn!("ignoring stored public key: {e}");
                Ok(None)
            }
        }
    }

    /// Name of the last connected wallet variant.
    pub fn active_wallet_name(&self) -> Result<Option<String>, StorageError> {
        self.store.get_item(WALLET)
    }

    pub fn is_signed_in(&self) -> Result<bool, StorageError> {
        Ok(self.public_key()?.is_some())
    }

    /// Forget the session.
    pub fn sign_out(&self) -> Result<(), StorageError> {
        self.store.remove_item(PUBLIC_KEY)?;
        self.store.remove_item(SECRET_KEY)?;
        self.store.remove_item(WALLET)?;
        info!("signed out");
        Ok(())
    }
}

/// Short display form of an account ID: `GAS4V...AL`.
pub fn abbreviate_public_key(public_key: &str) -> String {
    let chars: Vec<char> = public_key.chars().collect();
    if chars.len() <= 7 {
        return public_key.to_string();
    }
    let head: String = chars[..5].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{head}...{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use lumen_core::crypto::KeyPair;

    fn session() -> (Arc<MemoryStore>, Session) {
        let store = Arc::new(MemoryStore::new());
        (store.clone(), Session::new(store))
    }

    #[test]
    fn persist_and_read_back() {
        let (_, session) = session();
        let pk = KeyPair::from_seed_bytes([1u8; 32]).public_key();
        assert_eq!(session.public_key().unwrap(), None);

        session.persist_wallet(WalletKind::Albedo, &pk).unwrap();
        assert_eq!(session.public_key().unwrap(), Some(pk));
        assert_eq!(session.active_wallet_name().unwrap().as_deref(), Some("albedo"));
        assert!(session.is_signed_in().unwrap());
    }

    #[test]
    fn corrupt_public_key_is_ignored() {
        let (store, session) = session();
        store.store_item(PUBLIC_KEY, "not-a-key").unwrap();
        assert_eq!(session.public_key().unwrap(), None);
    }

    #[test]
    fn sign_out_clears_session_keys() {
        let (store, session) = session();
        let pk = KeyPair::from_seed_bytes([1u8; 32]).public_key();
        session.persist_wallet(WalletKind::SecretKey, &pk).unwrap();
        store.store_item(SECRET_KEY, "legacy").unwrap();
        store.store_item("theme", "dark").unwrap();

        session.sign_out().unwrap();
        assert_eq!(store.get_item(PUBLIC_KEY).unwrap(), None);
        assert_eq!(store.get_item(SECRET_KEY).unwrap(), None);
        assert_eq!(store.get_item(WALLET).unwrap(), None);
        assert_eq!(store.get_item("theme").unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn abbreviation() {
        assert_eq!(
            abbreviate_public_key("GAS4V4O2B7DW5T7IQRPEEVCRXMDZESKISR7DVIGKZQYYV3OSQ5SH5LAL"),
            "GAS4V...AL"
        );
        assert_eq!(abbreviate_public_key("GABC"), "GABC");
    }
}
