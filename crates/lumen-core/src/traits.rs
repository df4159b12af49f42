//! Trait interfaces for the Lumen wallet.
//!
//! These traits define the seams between the wallet logic and the outside
//! world:
//! - [`LedgerApi`]: ledger queries and transaction submission (lumen-net implements over HTTP)
//! - [`IntentTransport`]: round-trips to an external signer (lumen-net implements over HTTP)
//! - [`KeyValueStore`]: string storage for session state (lumen-wallet implements)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::crypto::PublicKey;
use crate::error::{IntentError, LedgerError, StorageError};
use crate::records::{AccountRecord, OperationRecord, Order, SubmitResponse};

/// Read and submit access to the ledger.
#[async_trait]
pub trait LedgerApi: Send + Sync {
    /// Load an account. Unfunded accounts yield [`LedgerError::NotFound`].
    async fn load_account(&self, account: &PublicKey) -> Result<AccountRecord, LedgerError>;

    /// Operations touching `account`, at most `limit` records in `order`.
    async fn operations_for_account(
        &self,
        account: &PublicKey,
        limit: u32,
        order: Order,
    ) -> Result<Vec<OperationRecord>, LedgerError>;

    /// Submit a base64 XDR transaction envelope.
    async fn submit_transaction(&self, envelope_xdr: &str) -> Result<SubmitResponse, LedgerError>;
}

/// Intent error code reported when the user declines a request.
pub const INTENT_USER_REJECTED: i32 = -4;

/// A request sent to an external, intent-based signer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum IntentRequest {
    /// Ask the signer which account it controls.
    PublicKey,
    /// Ask the signer to sign an unsigned envelope for `network`
    /// (`"testnet"` or `"public"`).
    Tx { xdr: String, network: String },
}

/// A successful reply from the external signer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pubkey: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed_envelope_xdr: Option<String>,
}

/// Transport to an external signer.
///
/// Implementations map the signer's "rejected by user" reply to
/// [`IntentError::Rejected`].
#[async_trait]
pub trait IntentTransport: Send + Sync {
    async fn request(&self, request: IntentRequest) -> Result<IntentResponse, IntentError>;
}

/// String key-value storage for session state.
pub trait KeyValueStore: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn store_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing a missing key is not an error.
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;

    fn clear(&self) -> Result<(), StorageError>;
}
