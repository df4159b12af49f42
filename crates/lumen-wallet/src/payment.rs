//! Payment construction, signing and submission.
//!
//! A payment runs as one pipeline:
//! 1. Validate the form ([`is_form_valid`]); any error aborts
//! 2. Check that the destination account exists
//! 3. Arm the wallet (secret-key wallets sign with the form's signer key)
//! 4. Build a single native payment on top of the source account's sequence
//! 5. Sign through the wallet and submit once
//!
//! Every failure is reported as [`PaymentResult::Failed`]; nothing is retried.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use zeroize::Zeroize;

use lumen_core::amount::Amount;
use lumen_core::constants::{BASE_FEE, DEFAULT_TIMEOUT_SECS, Network};
use lumen_core::crypto::PublicKey;
use lumen_core::error::{AmountError, LedgerError, TransactionError};
use lumen_core::traits::LedgerApi;
use lumen_core::types::{Memo, Operation, TimeBounds, Transaction};

use crate::error::{PaymentError, SignError};
use crate::keys::{keypair_from_secret, public_key_from_str};
use crate::validation::is_form_valid;
use crate::wallet::{SignedEnvelope, Wallet};

/// Raw payment form input.
///
/// `amount` is a decimal lumen string, `fee` is in stroops and
/// `time_out_in_seconds` bounds how long the transaction stays valid
/// (0 disables the bound).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSummary {
    pub signer_key: String,
    pub destination_public_key: String,
    pub amount: String,
    pub memo: String,
    pub time_out_in_seconds: i64,
    pub fee: i64,
}

impl PaymentSummary {
    /// Clear the form, wiping the signer key.
    pub fn reset(&mut self) {
        self.signer_key.zeroize();
        *self = Self::default();
    }
}

impl Default for PaymentSummary {
    fn default() -> Self {
        Self {
            signer_key: String::new(),
            destination_public_key: String::new(),
            amount: String::new(),
            memo: String::new(),
            time_out_in_seconds: DEFAULT_TIMEOUT_SECS as i64,
            fee: i64::from(BASE_FEE),
        }
    }
}

impl fmt::Debug for PaymentSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentSummary")
            .field("signer_key", &"<redacted>")
            .field("destination_public_key", &self.destination_public_key)
            .field("amount", &self.amount)
            .field("memo", &self.memo)
            .field("time_out_in_seconds", &self.time_out_in_seconds)
            .field("fee", &self.fee)
            .finish()
    }
}

/// Outcome of [`PaymentService::send_payment`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status")]
pub enum PaymentResult {
    #[serde(rename_all = "camelCase")]
    Success {
        source_public_key: String,
        destination_public_key: String,
        amount: String,
        transaction_hash: String,
    },
    #[serde(rename_all = "camelCase")]
    Failed {
        source_public_key: Option<String>,
        destination_public_key: String,
        amount: String,
        error_message: String,
    },
}

impl PaymentResult {
    pub fn is_success(&self) -> bool {
        matches!(self, PaymentResult::Success { .. })
    }

    /// `"Success"` or `"Failed"`.
    pub fn status(&self) -> &'static str {
        match self {
            PaymentResult::Success { .. } => "Success",
            PaymentResult::Failed { .. } => "Failed",
        }
    }

    /// Headline for the user.
    pub fn message(&self) -> &'static str {
        match self {
            PaymentResult::Success { .. } => "Successful payment",
            PaymentResult::Failed { .. } => "Payment Failed",
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            PaymentResult::Success { .. } => None,
            PaymentResult::Failed { error_message, .. } => Some(error_message),
        }
    }

    fn failed(summary: &PaymentSummary, source: Option<PublicKey>, err: &PaymentError) -> Self {
        PaymentResult::Failed {
            source_public_key: source.map(|pk| pk.account_id()),
            destination_public_key: summary.destination_public_key.clone(),
            amount: summary.amount.clone(),
            error_message: err.to_string(),
        }
    }
}

/// Builds, signs and submits payments against one ledger and network.
pub struct PaymentService {
    ledger: Arc<dyn LedgerApi>,
    network: Network,
    in_flight: Mutex<()>,
}

impl PaymentService {
    pub fn new(ledger: Arc<dyn LedgerApi>, network: Network) -> Self {
        Self {
            ledger,
            network,
            in_flight: Mutex::new(()),
        }
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// Build an unsigned single-payment transaction from `source`.
    ///
    /// Loads the source account to pick up its sequence number. An empty
    /// memo yields no memo; a `timeout_secs` of 0 yields no upper time bound.
    pub async fn build_transaction(
        &self,
        source: &PublicKey,
        destination: &PublicKey,
        amount: Amount,
        memo: &str,
        fee: u32,
        timeout_secs: u64,
    ) -> Result<Transaction, PaymentError> {
        if fee < BASE_FEE {
            return Err(PaymentError::FeeTooLow { fee, min: BASE_FEE });
        }
        let memo = Memo::text(memo)?;

        let account = match self.ledger.load_account(source).await {
            Ok(account) => account,
            Err(LedgerError::NotFound(_)) => {
                return Err(PaymentError::AccountNotFound(source.account_id()));
            }
            Err(e) => return Err(e.into()),
        };
        let sequence = account
            .sequence
            .checked_add(1)
            .ok_or(TransactionError::SequenceOverflow)?;

        let tx = Transaction {
            source_account: *source,
            fee,
            sequence,
            time_bounds: Some(TimeBounds::with_timeout(now_unix(), timeout_secs)),
            memo,
            operations: vec![Operation::Payment {
                destination: *destination,
                amount,
            }],
        };
        tx.validate()?;
        debug!(source = %source, sequence, "built payment transaction");
        Ok(tx)
    }

    /// Sign `tx` through `wallet`. Failures are logged and returned.
    pub async fn sign_transaction_with_wallet(
        &self,
        tx: &Transaction,
        wallet: &Wallet,
    ) -> Result<SignedEnvelope, SignError> {
        match wallet.sign(tx, self.network).await {
            Ok(signed) => Ok(signed),
            Err(e) => {
                error!(wallet = wallet.name(), "signing failed: {e}");
                Err(e)
            }
        }
    }

    /// Submit a signed envelope once and return the ledger's transaction hash.
    pub async fn submit(&self, signed: &SignedEnvelope) -> Result<String, PaymentError> {
        let response = self.ledger.submit_transaction(&signed.xdr).await?;
        let local = signed.envelope.hash_hex(self.network);
        if response.hash != local {
            warn!(ledger = %response.hash, local = %local, "ledger reported a different transaction hash");
        }
        if !response.successful {
            return Err(LedgerError::Rejected {
                transaction: "tx_failed".into(),
                operations: Vec::new(),
            }
            .into());
        }
        Ok(response.hash)
    }

    /// Run the whole payment pipeline for `summary`.
    ///
    /// Only one payment runs at a time per service; a call made while another
    /// is in flight fails immediately without touching the ledger.
    pub async fn send_payment(
        &self,
        summary: &PaymentSummary,
        wallet: &mut Wallet,
        current_balance: Option<Amount>,
    ) -> PaymentResult {
        let Ok(_guard) = self.in_flight.try_lock() else {
            warn!("rejecting payment: another payment is in progress");
            return PaymentResult::failed(summary, wallet.public_key(), &PaymentError::AlreadyInProgress);
        };

        match self.execute(summary, wallet, current_balance).await {
            Ok((source, transaction_hash)) => {
                info!(
                    source = %source,
                    destination = %summary.destination_public_key,
                    amount = %summary.amount,
                    hash = %transaction_hash,
                    "payment submitted"
                );
                PaymentResult::Success {
                    source_public_key: source.account_id(),
                    destination_public_key: summary.destination_public_key.trim().to_string(),
                    amount: summary.amount.trim().to_string(),
                    transaction_hash,
                }
            }
            Err(e) => {
                error!("payment failed: {e}");
                PaymentResult::failed(summary, wallet.public_key(), &e)
            }
        }
    }

    async fn execute(
        &self,
        summary: &PaymentSummary,
        wallet: &mut Wallet,
        current_balance: Option<Amount>,
    ) -> Result<(PublicKey, String), PaymentError> {
        let errors = is_form_valid(summary, current_balance, wallet.is_signed_externally());
        if !errors.is_empty() {
            return Err(PaymentError::InvalidForm(errors));
        }

        let destination = public_key_from_str(&summary.destination_public_key)?;
        match self.ledger.load_account(&destination).await {
            Ok(_) => {}
            Err(LedgerError::NotFound(_)) => return Err(PaymentError::DestinationNotFound),
            Err(e) => return Err(e.into()),
        }

        // The form's signer key is used for this payment only; the session
        // keeps whichever account was signed in.
        if !wallet.is_signed_externally() {
            wallet.arm(keypair_from_secret(&summary.signer_key)?);
        }
        let source = wallet.public_key().ok_or(SignError::NotConnected)?;

        let amount: Amount = summary
            .amount
            .parse()
            .map_err(|e: AmountError| PaymentError::InvalidAmount(e.to_string()))?;
        let fee = u32::try_from(summary.fee).map_err(|_| TransactionError::FeeOverflow)?;
        let timeout = u64::try_from(summary.time_out_in_seconds).unwrap_or(0);

        let tx = self
            .build_transaction(&source, &destination, amount, &summary.memo, fee, timeout)
            .await?;
        let signed = self.sign_transaction_with_wallet(&tx, wallet).await?;
        let hash = self.submit(&signed).await?;
        Ok((source, hash))
    }
}

fn now_unix() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0)
}
