//! Read-only account queries: balance, funding status, payment history.

use chrono::DateTime;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use lumen_core::amount::Amount;
use lumen_core::constants::HISTORY_LIMIT;
use lumen_core::crypto::PublicKey;
use lumen_core::error::LedgerError;
use lumen_core::records::{OperationRecord, Order};
use lumen_core::traits::LedgerApi;

use crate::error::WalletError;

/// Balance summary for the dashboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct AccountOverview {
    pub balance: Amount,
    /// False when the account does not exist on the ledger yet.
    pub funded: bool,
}

/// One row of the payment history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentHistoryRecord {
    pub amount: Option<Amount>,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`
    pub time: String,
    pub asset_type: Option<String>,
    pub source_account: Option<String>,
    pub destination_account: Option<String>,
    pub transaction_hash: String,
    pub successful: bool,
    #[serde(rename = "type")]
    pub kind: String,
}

impl From<OperationRecord> for PaymentHistoryRecord {
    fn from(op: OperationRecord) -> Self {
        let (date, time) = split_timestamp(&op.created_at);
        // Account creation moves native funds from funder to the new account.
        let is_creation = op.funder.is_some() || op.account.is_some();
        let (amount, asset_type, source_account, destination_account) = if is_creation {
            (
                op.starting_balance,
                Some(op.asset_type.unwrap_or_else(|| "native".to_string())),
                op.funder,
                op.account,
            )
        } else {
            (op.amount, op.asset_type, op.from, op.to)
        };
        Self {
            amount,
            date,
            time,
            asset_type,
            source_account,
            destination_account,
            transaction_hash: op.transaction_hash,
            successful: op.transaction_successful,
            kind: op.kind,
        }
    }
}

fn split_timestamp(created_at: &str) -> (String, String) {
    match DateTime::parse_from_rfc3339(created_at) {
        Ok(ts) => (
            ts.format("%Y-%m-%d").to_string(),
            ts.format("%H:%M").to_string(),
        ),
        Err(_) => (
            created_at.get(0..10).unwrap_or_default().to_string(),
            created_at.get(11..16).unwrap_or_default().to_string(),
        ),
    }
}

/// Account queries against a ledger API.
#[derive(Clone)]
pub struct AccountReader {
    ledger: Arc<dyn LedgerApi>,
}

impl AccountReader {
    pub fn new(ledger: Arc<dyn LedgerApi>) -> Self {
        Self { ledger }
    }

    /// Native balance of a funded account.
    pub async fn get_balance(&self, public_key: &PublicKey) -> Result<Amount, WalletError> {
        debug!(account = %public_key, "loading balance");
        match self.ledger.load_account(public_key).await {
            Ok(account) => Ok(account.native_balance().unwrap_or(Amount::ZERO)),
            Err(LedgerError::NotFound(_)) => {
                Err(WalletError::AccountNotFound(public_key.account_id()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Balance and funding status. Unfunded accounts report a zero balance.
    pub async fn account_overview(&self, public_key: &PublicKey) -> Result<AccountOverview, WalletError> {
        match self.get_balance(public_key).await {
            Ok(balance) => Ok(AccountOverview {
                balance,
                funded: true,
            }),
            Err(WalletError::AccountNotFound(_)) => Ok(AccountOverview {
                balance: Amount::ZERO,
                funded: false,
            }),
            Err(e) => Err(e),
        }
    }

    /// The most recent operations touching the account, newest first.
    pub async fn payments_history(
        &self,
        public_key: &PublicKey,
    ) -> Result<Vec<PaymentHistoryRecord>, WalletError> {
        debug!(account = %public_key, limit = HISTORY_LIMIT, "loading payment history");
        let records = match self
            .ledger
            .operations_for_account(public_key, HISTORY_LIMIT, Order::Desc)
            .await
        {
            Ok(records) => records,
            Err(LedgerError::NotFound(_)) => {
                return Err(WalletError::AccountNotFound(public_key.account_id()));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(records.into_iter().map(PaymentHistoryRecord::from).collect())
    }
}

/// Page `page` (1-based) of `records`, `per_page` at a time. Pages past the
/// end, page 0 and a zero page size all yield an empty slice.
pub fn paginate<T>(records: &[T], page: usize, per_page: usize) -> &[T] {
    if page == 0 || per_page == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(per_page);
    if start >= records.len() {
        return &[];
    }
    let end = start.saturating_add(per_page).min(records.len());
    &records[start..end]
}

/// Number of pages needed for `total` records.
pub fn page_count(total: usize, per_page: usize) -> usize {
    if per_page == 0 {
        return 0;
    }
    total.div_ceil(per_page)
}
