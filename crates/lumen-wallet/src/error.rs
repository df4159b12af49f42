//! Wallet error types.

use lumen_core::error::{
    CryptoError, IntentError, LedgerError, StorageError, TransactionError, XdrError,
};
use lumen_core::traits::INTENT_USER_REJECTED;
use thiserror::Error;

use crate::validation::FormErrors;

/// Errors from connecting a wallet and reading account state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    /// Secret seed missing or malformed.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// The account has not been funded on the ledger.
    #[error("account not found: {0}")]
    AccountNotFound(String),

    /// No wallet variant with this name.
    #[error("invalid wallet: {0}")]
    InvalidWallet(String),

    /// The external signer declined the request.
    #[error("request rejected by user")]
    UserRejected,

    /// The external signer could not be reached or replied with garbage.
    #[error("communication error: {0}")]
    Communication(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors from signing a transaction through a wallet.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignError {
    /// `sign` was called before a successful `get_public_key`.
    #[error("wallet is not connected")]
    NotConnected,

    #[error("request rejected by user")]
    UserRejected,

    #[error("communication error: {0}")]
    Communication(String),

    /// The signer returned an envelope for a different transaction.
    #[error("signed envelope does not match the transaction")]
    TransactionMismatch,

    /// The signer's signature does not verify against the connected key.
    #[error("invalid signature: {0}")]
    InvalidSignature(#[from] CryptoError),

    #[error(transparent)]
    Xdr(#[from] XdrError),
}

/// Errors from the payment pipeline. Their `Display` text becomes the
/// user-facing `error_message` of a failed payment.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaymentError {
    #[error("invalid payment form: {0}")]
    InvalidForm(FormErrors),

    #[error("The destination account does not exist!")]
    DestinationNotFound,

    #[error("account not found: {0}")]
    AccountNotFound(String),

    #[error("Fee cannot be less than base fee ({fee} < {min})")]
    FeeTooLow { fee: u32, min: u32 },

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("A payment is already in progress")]
    AlreadyInProgress,

    #[error(transparent)]
    Transaction(#[from] TransactionError),

    #[error(transparent)]
    Sign(#[from] SignError),

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl From<IntentError> for WalletError {
    fn from(e: IntentError) -> Self {
        match e {
            IntentError::Rejected => WalletError::UserRejected,
            IntentError::Failed { code, .. } if code == INTENT_USER_REJECTED => {
                WalletError::UserRejected
            }
            other => WalletError::Communication(other.to_string()),
        }
    }
}

impl From<IntentError> for SignError {
    fn from(e: IntentError) -> Self {
        match WalletError::from(e) {
            WalletError::UserRejected => SignError::UserRejected,
            WalletError::Communication(msg) => SignError::Communication(msg),
            other => SignError::Communication(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destination_not_found_message() {
        assert_eq!(
            PaymentError::DestinationNotFound.to_string(),
            "The destination account does not exist!"
        );
    }

    #[test]
    fn in_progress_message() {
        assert_eq!(
            PaymentError::AlreadyInProgress.to_string(),
            "A payment is already in progress"
        );
    }

    #[test]
    fn intent_rejection_maps_to_user_rejected() {
        assert_eq!(WalletError::from(IntentError::Rejected), WalletError::UserRejected);
        let coded = IntentError::Failed {
            code: -4,
            message: "denied".into(),
        };
        assert_eq!(SignError::from(coded), SignError::UserRejected);
    }

    #[test]
    fn intent_transport_failure_maps_to_communication() {
        let e = WalletError::from(IntentError::Transport("connection refused".into()));
        assert_eq!(
            e,
            WalletError::Communication("transport: connection refused".into())
        );
        let e = SignError::from(IntentError::Failed {
            code: -1,
            message: "boom".into(),
        });
        assert!(matches!(e, SignError::Communication(_)));
    }

    #[test]
    fn from_ledger_error() {
        let e: PaymentError = LedgerError::Transport("timeout".into()).into();
        assert_eq!(e, PaymentError::Ledger(LedgerError::Transport("timeout".into())));
    }
}
