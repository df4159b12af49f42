//! Payment form validation.
//!
//! Validation is pure: it never touches the ledger and never fails. Every
//! rule runs on every call and contributes at most one message to a fresh
//! [`FormErrors`] map. An empty map means the form may be submitted.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use lumen_core::amount::Amount;
use lumen_core::constants::{BASE_FEE, MAX_MEMO_TEXT_LEN};
use lumen_core::crypto::{KeyPair, PublicKey};

use crate::payment::PaymentSummary;

/// A validated field of the payment form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FormField {
    #[serde(rename = "signerKeyError")]
    SignerKey,
    #[serde(rename = "destinationPublicKeyError")]
    DestinationPublicKey,
    #[serde(rename = "amountError")]
    Amount,
    #[serde(rename = "feeError")]
    Fee,
    #[serde(rename = "timeOutError")]
    TimeOut,
    #[serde(rename = "memoError")]
    Memo,
}

impl FormField {
    /// Message shown when the field fails validation.
    pub fn message(&self) -> &'static str {
        match self {
            FormField::SignerKey => "Invalid signer key",
            FormField::DestinationPublicKey => "Invalid destination public key",
            FormField::Amount => "Invalid amount",
            FormField::Fee => "Invalid fee",
            FormField::TimeOut => "Invalid time out",
            FormField::Memo => "Invalid memo",
        }
    }
}

/// Sparse map of field errors.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<FormField, String>);

impl FormErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: FormField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: FormField) -> bool {
        self.0.contains_key(&field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (FormField, &str)> {
        self.0.iter().map(|(f, m)| (*f, m.as_str()))
    }

    fn flag(&mut self, field: FormField) {
        self.0.insert(field, field.message().to_string());
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.0.values().map(String::as_str).collect();
        f.write_str(&messages.join(", "))
    }
}

/// Validate a payment form against the sender's current balance.
///
/// A missing balance is treated as zero. When `is_signed_externally` is set
/// the signer key field is not checked, since the external wallet holds the
/// secret.
pub fn is_form_valid(
    summary: &PaymentSummary,
    current_balance: Option<Amount>,
    is_signed_externally: bool,
) -> FormErrors {
    let mut errors = FormErrors::default();

    if !is_signed_externally && KeyPair::from_secret(summary.signer_key.trim()).is_err() {
        errors.flag(FormField::SignerKey);
    }
    if PublicKey::from_account_id(summary.destination_public_key.trim()).is_err() {
        errors.flag(FormField::DestinationPublicKey);
    }
    if is_amount_invalid(&summary.amount, current_balance) {
        errors.flag(FormField::Amount);
    }
    if is_fee_invalid(summary.fee, current_balance) {
        errors.flag(FormField::Fee);
    }
    if is_time_out_invalid(summary.time_out_in_seconds) {
        errors.flag(FormField::TimeOut);
    }
    if summary.memo.len() > MAX_MEMO_TEXT_LEN {
        errors.flag(FormField::Memo);
    }

    errors
}

/// An amount is invalid unless it parses and `0 < amount <= balance - BASE_FEE`.
pub fn is_amount_invalid(amount: &str, current_balance: Option<Amount>) -> bool {
    let Ok(amount) = amount.parse::<Amount>() else {
        return true;
    };
    let spendable = current_balance
        .unwrap_or(Amount::ZERO)
        .stroops()
        .saturating_sub(i64::from(BASE_FEE));
    amount.is_zero() || amount.stroops() > spendable
}

/// A fee in stroops is invalid unless `BASE_FEE <= fee <= balance`.
pub fn is_fee_invalid(fee: i64, current_balance: Option<Amount>) -> bool {
    let balance = current_balance.unwrap_or(Amount::ZERO).stroops();
    fee < i64::from(BASE_FEE) || fee > balance
}

/// A timeout is invalid when negative. Zero means no upper time bound.
pub fn is_time_out_invalid(time_out_in_seconds: i64) -> bool {
    time_out_in_seconds < 0
}
