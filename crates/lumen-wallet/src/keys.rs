//! Key generation and parsing.
//!
//! Thin helpers over [`KeyPair`] that report failures as [`WalletError`]s.

use lumen_core::crypto::{KeyPair, PublicKey};

use crate::error::WalletError;

/// Generate a fresh keypair from the OS cryptographic RNG.
pub fn generate_keys() -> KeyPair {
    KeyPair::generate()
}

/// Parse a secret seed (`S...`).
pub fn keypair_from_secret(secret: &str) -> Result<KeyPair, WalletError> {
    KeyPair::from_secret(secret.trim()).map_err(|e| WalletError::InvalidKey(e.to_string()))
}

/// Parse an account ID (`G...`). Only the format is checked, not whether the
/// account exists on the ledger.
pub fn public_key_from_str(account_id: &str) -> Result<PublicKey, WalletError> {
    PublicKey::from_account_id(account_id.trim())
        .map_err(|e| WalletError::InvalidKey(e.to_string()))
}
