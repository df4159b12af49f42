//! Wallet factory.

use std::sync::Arc;
use tracing::debug;

use lumen_core::traits::{IntentTransport, KeyValueStore};

use crate::error::WalletError;
use crate::session::Session;
use crate::wallet::{Wallet, WalletKind};

/// Builds wallet variants that share one store and one intent transport.
#[derive(Clone)]
pub struct WalletFactory {
    store: Arc<dyn KeyValueStore>,
    transport: Arc<dyn IntentTransport>,
}

impl WalletFactory {
    pub fn new(store: Arc<dyn KeyValueStore>, transport: Arc<dyn IntentTransport>) -> Self {
        Self { store, transport }
    }

    /// One unconnected instance of every variant, in display order.
    pub fn create_all(&self) -> Vec<Wallet> {
        WalletKind::ALL.into_iter().map(|k| self.create_kind(k)).collect()
    }

    /// Construct a variant by its stable name.
    pub fn create(&self, name: &str) -> Result<Wallet, WalletError> {
        let kind: WalletKind = name.parse()?;
        Ok(self.create_kind(kind))
    }

    pub fn create_kind(&self, kind: WalletKind) -> Wallet {
        Wallet::new(kind, self.store.clone(), self.transport.clone())
    }

    /// Recreate the last connected wallet from the session store.
    ///
    /// Returns `None` when nothing was connected. The stored account is
    /// reattached, but a secret-key wallet must be reconnected before it can
    /// sign again.
    pub fn restore(&self) -> Result<Option<Wallet>, WalletError> {
        let session = Session::new(self.store.clone());
        let Some(name) = session.active_wallet_name()? else {
            return Ok(None);
        };
        let mut wallet = self.create(&name)?;
        if let Some(public_key) = session.public_key()? {
            wallet.restore_public_key(public_key);
        }
        debug!(wallet = %name, "restored wallet from session");
        Ok(Some(wallet))
    }
}
