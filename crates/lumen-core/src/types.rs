//! Transaction model: memos, time bounds, payment operations, envelopes.
//!
//! Only the subset needed to move the native asset between two accounts is
//! modelled. All monetary values are [`Amount`]s in stroops.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::amount::Amount;
use crate::constants::{MAX_MEMO_TEXT_LEN, MAX_OPERATIONS, Network};
use crate::crypto::{self, PublicKey};
use crate::error::{TransactionError, XdrError};
use crate::xdr;

/// Memo attached to a transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Memo {
    #[default]
    None,
    /// UTF-8 text of at most [`MAX_MEMO_TEXT_LEN`] bytes.
    Text(String),
}

impl Memo {
    /// Build a text memo. Empty text yields [`Memo::None`].
    pub fn text(text: &str) -> Result<Self, TransactionError> {
        if text.is_empty() {
            return Ok(Memo::None);
        }
        if text.len() > MAX_MEMO_TEXT_LEN {
            return Err(TransactionError::MemoTooLong {
                len: text.len(),
                max: MAX_MEMO_TEXT_LEN,
            });
        }
        Ok(Memo::Text(text.to_string()))
    }

    /// Memo text, or the empty string for [`Memo::None`].
    pub fn as_text(&self) -> &str {
        match self {
            Memo::None => "",
            Memo::Text(t) => t,
        }
    }
}

/// Validity window of a transaction in Unix seconds. `max_time == 0`
/// means no upper bound.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeBounds {
    pub min_time: u64,
    pub max_time: u64,
}

impl TimeBounds {
    /// Window starting now and closing `timeout_secs` later
    /// (never closing if `timeout_secs` is zero).
    pub fn with_timeout(now_unix: u64, timeout_secs: u64) -> Self {
        let max_time = if timeout_secs == 0 {
            0
        } else {
            now_unix.saturating_add(timeout_secs)
        };
        Self {
            min_time: 0,
            max_time,
        }
    }
}

/// A ledger operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    /// Native asset payment.
    Payment {
        destination: PublicKey,
        amount: Amount,
    },
}

/// An unsigned transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    /// Account paying the fee and consuming the sequence number.
    pub source_account: PublicKey,
    /// Total fee in stroops.
    pub fee: u32,
    /// Source account sequence number + 1.
    pub sequence: i64,
    pub time_bounds: Option<TimeBounds>,
    pub memo: Memo,
    pub operations: Vec<Operation>,
}

impl Transaction {
    /// Structural checks shared by the builder and the wire decoder.
    pub fn validate(&self) -> Result<(), TransactionError> {
        if self.operations.is_empty() {
            return Err(TransactionError::NoOperations);
        }
        if self.operations.len() > MAX_OPERATIONS {
            return Err(TransactionError::TooManyOperations(self.operations.len()));
        }
        if let Memo::Text(text) = &self.memo {
            if text.len() > MAX_MEMO_TEXT_LEN {
                return Err(TransactionError::MemoTooLong {
                    len: text.len(),
                    max: MAX_MEMO_TEXT_LEN,
                });
            }
        }
        for op in &self.operations {
            match op {
                Operation::Payment { amount, .. } if amount.is_zero() => {
                    return Err(TransactionError::NonPositiveAmount);
                }
                Operation::Payment { .. } => {}
            }
        }
        Ok(())
    }
}

/// Signature with the signer's key hint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecoratedSignature {
    /// Last four bytes of the signer's public key.
    pub hint: [u8; 4],
    pub signature: [u8; 64],
}

/// A transaction together with its signatures: the unit submitted to the
/// ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionEnvelope {
    pub tx: Transaction,
    pub signatures: Vec<DecoratedSignature>,
}

impl TransactionEnvelope {
    /// Wrap a transaction with no signatures.
    pub fn unsigned(tx: Transaction) -> Self {
        Self {
            tx,
            signatures: Vec::new(),
        }
    }

    /// Base64 XDR wire form.
    pub fn to_xdr_base64(&self) -> String {
        BASE64.encode(xdr::encode_envelope(self))
    }

    /// Parse the base64 XDR wire form.
    pub fn from_xdr_base64(s: &str) -> Result<Self, XdrError> {
        let bytes = BASE64
            .decode(s.trim())
            .map_err(|e| XdrError::Base64(e.to_string()))?;
        xdr::decode_envelope(&bytes)
    }

    /// Transaction hash (hex) as reported by the ledger.
    pub fn hash_hex(&self, network: Network) -> String {
        hex::encode(crypto::transaction_hash(&self.tx, network))
    }
}
