//! Ledger API records.
//!
//! These mirror the JSON documents served by a Horizon-compatible ledger
//! API, trimmed to the fields the wallet reads. They deserialize directly
//! from the API's responses.

use serde::{Deserialize, Deserializer, Serialize};

use crate::amount::Amount;

/// An account as returned by `GET /accounts/{id}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub account_id: String,
    /// Current sequence number. The next transaction must use `sequence + 1`.
    #[serde(deserialize_with = "de_sequence")]
    pub sequence: i64,
    #[serde(default)]
    pub balances: Vec<BalanceLine>,
}

impl AccountRecord {
    /// Native asset balance, if the account holds a native balance line.
    pub fn native_balance(&self) -> Option<Amount> {
        self.balances
            .iter()
            .find(|b| b.asset_type == "native")
            .map(|b| b.balance)
    }
}

/// One balance line of an account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceLine {
    pub balance: Amount,
    pub asset_type: String,
}

/// An operation record as returned by `GET /accounts/{id}/operations`.
///
/// Payment records carry `from`/`to`/`amount`/`asset_type`; account creation
/// records carry `funder`/`account`/`starting_balance` instead.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// RFC 3339 timestamp, e.g. `2023-06-21T09:45:12Z`.
    pub created_at: String,
    pub transaction_hash: String,
    #[serde(default = "default_true")]
    pub transaction_successful: bool,
    #[serde(default)]
    pub source_account: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub amount: Option<Amount>,
    #[serde(default)]
    pub asset_type: Option<String>,
    #[serde(default)]
    pub funder: Option<String>,
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub starting_balance: Option<Amount>,
}

/// Result of a successful `POST /transactions`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub hash: String,
    #[serde(default)]
    pub ledger: Option<u32>,
    #[serde(default = "default_true")]
    pub successful: bool,
}

/// Record ordering for collection queries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    Asc,
    #[default]
    Desc,
}

impl Order {
    pub fn as_str(&self) -> &'static str {
        match self {
            Order::Asc => "asc",
            Order::Desc => "desc",
        }
    }
}

fn default_true() -> bool {
    true
}

/// Sequence numbers are int64 and served as JSON strings; accept both forms.
fn de_sequence<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Seq {
        Str(String),
        Num(i64),
    }
    match Seq::deserialize(deserializer)? {
        Seq::Str(s) => s.parse().map_err(serde::de::Error::custom),
        Seq::Num(n) => Ok(n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_record_from_horizon_json() {
        let json = r#"{
            "id": "GAS4V4O2B7DW5T7IQRPEEVCRXMDZESKISR7DVIGKZQYYV3OSQ5SH5LVP",
            "account_id": "GAS4V4O2B7DW5T7IQRPEEVCRXMDZESKISR7DVIGKZQYYV3OSQ5SH5LVP",
            "sequence": "4294967296",
            "balances": [
                {"balance": "12.5000000", "asset_type": "credit_alphanum4", "asset_code": "USD"},
                {"balance": "18173.0000000", "asset_type": "native"}
            ]
        }"#;
        let record: AccountRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.sequence, 4_294_967_296);
        assert_eq!(
            record.native_balance(),
            Some(Amount::from_lumens(18173).unwrap())
        );
    }

    #[test]
    fn account_without_native_line() {
        let record = AccountRecord {
            account_id: "G".into(),
            sequence: 1,
            balances: vec![],
        };
        assert_eq!(record.native_balance(), None);
    }

    #[test]
    fn payment_operation_from_horizon_json() {
        let json = r#"{
            "id": "12884905985",
            "type": "payment",
            "created_at": "2023-06-21T09:45:12Z",
            "transaction_hash": "abc123",
            "transaction_successful": true,
            "source_account": "GSRC",
            "from": "GSRC",
            "to": "GDST",
            "asset_type": "native",
            "amount": "110.0000000"
        }"#;
        let op: OperationRecord = serde_json::from_str(json).unwrap();
        assert_eq!(op.kind, "payment");
        assert_eq!(op.amount, Some(Amount::from_lumens(110).unwrap()));
        assert_eq!(op.funder, None);
    }

    #[test]
    fn create_account_operation_from_horizon_json() {
        let json = r#"{
            "id": "1",
            "type": "create_account",
            "created_at": "2023-06-20T00:00:00Z",
            "transaction_hash": "def456",
            "funder": "GFUNDER",
            "account": "GNEW",
            "starting_balance": "10000.0000000"
        }"#;
        let op: OperationRecord = serde_json::from_str(json).unwrap();
        assert!(op.transaction_successful);
        assert_eq!(op.account.as_deref(), Some("GNEW"));
        assert_eq!(op.from, None);
    }

    #[test]
    fn order_renders_lowercase() {
        assert_eq!(Order::Desc.as_str(), "desc");
        assert_eq!(Order::default(), Order::Desc);
    }
}
