//! Protocol constants. Monetary values are in stroops (1 lumen = 10^7 stroops).

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Stroops per whole lumen.
pub const STROOPS_PER_LUMEN: i64 = 10_000_000;

/// Maximum number of fractional digits in a decimal amount string.
pub const AMOUNT_DECIMALS: usize = 7;

/// Minimum fee per operation, in stroops.
pub const BASE_FEE: u32 = 100;

/// Maximum size of a text memo, in bytes.
pub const MAX_MEMO_TEXT_LEN: usize = 28;

/// Maximum number of operations in a single transaction.
pub const MAX_OPERATIONS: usize = 100;

/// Maximum number of signatures attached to an envelope.
pub const MAX_SIGNATURES: usize = 20;

/// Number of operation records fetched for the payment history.
pub const HISTORY_LIMIT: u32 = 100;

/// Default validity window of a submitted transaction, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Ledger network a transaction is signed for.
///
/// The network passphrase is hashed into every signature payload, so a
/// transaction signed for one network is invalid on the other.
///
/// # Examples
///
/// ```
/// use lumen_core::constants::Network;
/// assert_eq!(Network::default(), Network::Testnet);
/// assert_eq!("public".parse::<Network>().unwrap(), Network::Public);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Public test network.
    #[default]
    Testnet,
    /// Production network.
    Public,
}

impl Network {
    /// Network passphrase as published by the ledger operators.
    pub fn passphrase(&self) -> &'static str {
        match self {
            Network::Testnet => "Test SDF Network ; September 2015",
            Network::Public => "Public Global Stellar Network ; September 2015",
        }
    }

    /// SHA-256 of the passphrase; prefixes every signature payload.
    pub fn network_id(&self) -> [u8; 32] {
        Sha256::digest(self.passphrase().as_bytes()).into()
    }

    /// Identifier used by external intent signers.
    pub fn intent_name(&self) -> &'static str {
        match self {
            Network::Testnet => "testnet",
            Network::Public => "public",
        }
    }

    /// Default Horizon endpoint for this network.
    pub fn default_horizon_url(&self) -> &'static str {
        match self {
            Network::Testnet => "https://horizon-testnet.stellar.org",
            Network::Public => "https://horizon.stellar.org",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.intent_name())
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "testnet" | "test" => Ok(Network::Testnet),
            "public" | "pubnet" | "mainnet" => Ok(Network::Public),
            other => Err(format!("unknown network: {other}")),
        }
    }
}
