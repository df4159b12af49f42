//! Ed25519 keys and transaction signing.
//!
//! Keys are exchanged as StrKeys: account IDs (`G...`) for public keys and
//! secret seeds (`S...`) for signing keys. ed25519-dalek provides the
//! signature scheme; this module only handles encoding and the signature
//! payload layout.
//!
//! # Signing scheme
//!
//! A transaction is signed over
//! `SHA-256(network_id || ENVELOPE_TYPE_TX || xdr(transaction))`, where
//! `network_id` is the SHA-256 of the network passphrase. Signatures are
//! attached as [`DecoratedSignature`]s carrying the last four bytes of the
//! signer's public key as a hint.

use ed25519_dalek::{Signer, Verifier};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use zeroize::{Zeroize, Zeroizing};

use crate::constants::Network;
use crate::error::CryptoError;
use crate::strkey::{self, VersionByte};
use crate::types::{DecoratedSignature, Transaction, TransactionEnvelope};
use crate::xdr;

/// Ed25519 signing keypair.
///
/// Wraps [`ed25519_dalek::SigningKey`], which zeroizes its secret on drop.
/// `Debug` output only shows the public half.
pub struct KeyPair {
    signing_key: ed25519_dalek::SigningKey,
}

impl KeyPair {
    /// Generate a random keypair using the OS cryptographic RNG.
    pub fn generate() -> Self {
        let mut csprng = rand::rngs::OsRng;
        Self {
            signing_key: ed25519_dalek::SigningKey::generate(&mut csprng),
        }
    }

    /// Create a keypair from raw 32-byte seed material.
    pub fn from_seed_bytes(bytes: [u8; 32]) -> Self {
        Self {
            signing_key: ed25519_dalek::SigningKey::from_bytes(&bytes),
        }
    }

    /// Parse a secret seed StrKey (`S...`).
    pub fn from_secret(secret: &str) -> Result<Self, CryptoError> {
        let mut seed = strkey::decode(VersionByte::SecretSeed, secret)?;
        let kp = Self::from_seed_bytes(seed);
        seed.zeroize();
        Ok(kp)
    }

    /// Derive the public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            verifying_key: self.signing_key.verifying_key(),
        }
    }

    /// Encode the secret seed as a StrKey. Handle with care.
    pub fn secret_seed(&self) -> Zeroizing<String> {
        let mut seed = self.signing_key.to_bytes();
        let encoded = Zeroizing::new(strkey::encode(VersionByte::SecretSeed, &seed));
        seed.zeroize();
        encoded
    }

    /// Sign a message, returning the raw 64-byte Ed25519 signature.
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }

    /// Sign a message and attach this key's hint.
    pub fn sign_decorated(&self, message: &[u8]) -> DecoratedSignature {
        DecoratedSignature {
            hint: self.public_key().signature_hint(),
            signature: self.sign(message),
        }
    }
}

impl Clone for KeyPair {
    fn clone(&self) -> Self {
        Self {
            signing_key: self.signing_key.clone(),
        }
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

/// Ed25519 public key, displayed as an account ID.
#[derive(Clone, Copy)]
pub struct PublicKey {
    verifying_key: ed25519_dalek::VerifyingKey,
}

impl PublicKey {
    /// Create a public key from raw bytes.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, CryptoError> {
        let vk = ed25519_dalek::VerifyingKey::from_bytes(bytes)
            .map_err(|_| CryptoError::InvalidPublicKey)?;
        Ok(Self { verifying_key: vk })
    }

    /// Parse an account ID StrKey (`G...`).
    pub fn from_account_id(account_id: &str) -> Result<Self, CryptoError> {
        let bytes = strkey::decode(VersionByte::AccountId, account_id)?;
        Self::from_bytes(&bytes)
    }

    /// Raw public key bytes.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.verifying_key.to_bytes()
    }

    /// Account ID StrKey for this key.
    pub fn account_id(&self) -> String {
        strkey::encode(VersionByte::AccountId, &self.to_bytes())
    }

    /// Last four bytes of the key, used to match signatures to signers.
    pub fn signature_hint(&self) -> [u8; 4] {
        let bytes = self.to_bytes();
        [bytes[28], bytes[29], bytes[30], bytes[31]]
    }

    /// Verify an Ed25519 signature on a message.
    pub fn verify(&self, message: &[u8], signature: &[u8; 64]) -> Result<(), CryptoError> {
        let sig = ed25519_dalek::Signature::from_bytes(signature);
        self.verifying_key
            .verify(message, &sig)
            .map_err(|_| CryptoError::VerificationFailed)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.account_id())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.account_id())
    }
}

impl FromStr for PublicKey {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_account_id(s)
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for PublicKey {}

impl std::hash::Hash for PublicKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.to_bytes().hash(state);
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.account_id())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_account_id(&s).map_err(serde::de::Error::custom)
    }
}

/// Hash committed to by every signature on `tx` for `network`.
pub fn transaction_hash(tx: &Transaction, network: Network) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(network.network_id());
    hasher.update(xdr::ENVELOPE_TYPE_TX.to_be_bytes());
    hasher.update(xdr::encode_transaction(tx));
    hasher.finalize().into()
}

/// Sign an envelope's transaction in place, appending a decorated signature.
pub fn sign_envelope(envelope: &mut TransactionEnvelope, keypair: &KeyPair, network: Network) {
    let hash = transaction_hash(&envelope.tx, network);
    envelope.signatures.push(keypair.sign_decorated(&hash));
}

/// Verify that `envelope` carries a valid signature from `signer`.
///
/// Signatures are matched by hint first, then checked cryptographically.
pub fn verify_envelope(
    envelope: &TransactionEnvelope,
    signer: &PublicKey,
    network: Network,
) -> Result<(), CryptoError> {
    let hash = transaction_hash(&envelope.tx, network);
    let hint = signer.signature_hint();
    let mut candidates = envelope.signatures.iter().filter(|s| s.hint == hint).peekable();
    if candidates.peek().is_none() {
        return Err(CryptoError::InvalidSignature);
    }
    if candidates.any(|s| signer.verify(&hash, &s.signature).is_ok()) {
        Ok(())
    } else {
        Err(CryptoError::VerificationFailed)
    }
}
