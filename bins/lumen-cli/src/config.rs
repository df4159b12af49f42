//! CLI configuration loaded from environment variables.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use lumen_core::constants::{BASE_FEE, DEFAULT_TIMEOUT_SECS, Network};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Ledger network transactions are signed for.
    pub network: Network,
    /// Horizon REST endpoint.
    pub horizon_url: String,
    /// External signer intent endpoint.
    pub intent_url: String,
    /// Session store file.
    pub store_path: PathBuf,
    /// Validity window of submitted transactions, in seconds.
    pub tx_timeout_secs: u64,
    /// Default fee offered per transaction, in stroops.
    pub base_fee: u32,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which plays the role of the
    /// process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let network: Network = match lookup("LUMEN_NETWORK") {
            Some(s) => s
                .parse()
                .map_err(anyhow::Error::msg)
                .context("LUMEN_NETWORK must be `testnet` or `public`")?,
            None => Network::default(),
        };

        let horizon_url = lookup("LUMEN_HORIZON_URL")
            .unwrap_or_else(|| network.default_horizon_url().to_string());

        let intent_url = lookup("LUMEN_INTENT_URL")
            .unwrap_or_else(|| "http://127.0.0.1:8090/intent".to_string());

        let store_path = lookup("LUMEN_STORE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(default_store_path);

        let tx_timeout_secs: u64 = lookup("LUMEN_TX_TIMEOUT_SECS")
            .unwrap_or_else(|| DEFAULT_TIMEOUT_SECS.to_string())
            .parse()
            .context("LUMEN_TX_TIMEOUT_SECS must be a non-negative integer")?;

        let base_fee: u32 = lookup("LUMEN_BASE_FEE")
            .unwrap_or_else(|| BASE_FEE.to_string())
            .parse()
            .context("LUMEN_BASE_FEE must be a positive integer")?;
        if base_fee < BASE_FEE {
            bail!("LUMEN_BASE_FEE must be at least {BASE_FEE} stroops");
        }

        Ok(Config {
            network,
            horizon_url,
            intent_url,
            store_path,
            tx_timeout_secs,
            base_fee,
        })
    }

    /// Apply command-line overrides. A network override without an explicit
    /// Horizon URL also switches to that network's default endpoint.
    pub fn with_overrides(mut self, network: Option<Network>, horizon_url: Option<String>) -> Self {
        if let Some(network) = network {
            if self.horizon_url == self.network.default_horizon_url() {
                self.horizon_url = network.default_horizon_url().to_string();
            }
            self.network = network;
        }
        if let Some(url) = horizon_url {
            self.horizon_url = url;
        }
        self
    }
}

fn default_store_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lumen")
        .join("storage.json")
}
