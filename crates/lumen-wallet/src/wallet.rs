//! Wallet variants.
//!
//! A [`Wallet`] is one of a closed set of signers. Each variant can report
//! the account it controls and sign transactions for it:
//!
//! - [`SecretKeyWallet`] holds a secret seed in memory for the session and
//!   signs in-process.
//! - [`AlbedoWallet`] delegates both operations to an external intent-based
//!   signer reached through an [`IntentTransport`].
//!
//! Connecting (`get_public_key`) records the variant name and account ID in
//! the session store. The secret seed itself is never persisted.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

use lumen_core::constants::Network;
use lumen_core::crypto::{self, KeyPair, PublicKey};
use lumen_core::traits::{IntentRequest, IntentTransport, KeyValueStore};
use lumen_core::types::{Transaction, TransactionEnvelope};

use crate::error::{SignError, WalletError};
use crate::keys::keypair_from_secret;
use crate::session::Session;

/// Identifies a wallet variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WalletKind {
    SecretKey,
    Albedo,
}

impl WalletKind {
    /// Every variant, in display order.
    pub const ALL: [WalletKind; 2] = [WalletKind::SecretKey, WalletKind::Albedo];

    /// Stable name, as stored under the `"wallet"` key.
    pub fn name(&self) -> &'static str {
        match self {
            WalletKind::SecretKey => "secretKey",
            WalletKind::Albedo => "albedo",
        }
    }

    pub fn friendly_name(&self) -> &'static str {
        match self {
            WalletKind::SecretKey => "Secret key",
            WalletKind::Albedo => "Albedo",
        }
    }

    /// Where to get the external signer, if the variant needs one.
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            WalletKind::SecretKey => None,
            WalletKind::Albedo => Some("https://albedo.link/"),
        }
    }

    /// Whether signatures are produced outside this process.
    pub fn is_external(&self) -> bool {
        matches!(self, WalletKind::Albedo)
    }
}

impl fmt::Display for WalletKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WalletKind {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WalletKind::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| WalletError::InvalidWallet(s.to_string()))
    }
}

/// A signed envelope in both decoded and wire form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedEnvelope {
    pub envelope: TransactionEnvelope,
    /// Base64 XDR, ready for submission.
    pub xdr: String,
}

impl SignedEnvelope {
    fn from_envelope(envelope: TransactionEnvelope) -> Self {
        let xdr = envelope.to_xdr_base64();
        Self { envelope, xdr }
    }
}

/// Signs locally with a secret seed held for the session.
pub struct SecretKeyWallet {
    session: Session,
    keypair: Option<KeyPair>,
    public_key: Option<PublicKey>,
}

impl SecretKeyWallet {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            keypair: None,
            public_key: None,
        }
    }

    fn get_public_key(&mut self, secret: Option<&str>) -> Result<PublicKey, WalletError> {
        let secret =
            secret.ok_or_else(|| WalletError::InvalidKey("no secret key supplied".into()))?;
        let keypair = keypair_from_secret(secret)?;
        self.session.persist_wallet(WalletKind::SecretKey, &keypair.public_key())?;
        Ok(self.arm(keypair))
    }

    /// Hold `keypair` for signing. The session store is left alone.
    fn arm(&mut self, keypair: KeyPair) -> PublicKey {
        let public_key = keypair.public_key();
        self.keypair = Some(keypair);
        self.public_key = Some(public_key);
        public_key
    }

    fn sign(&self, tx: &Transaction, network: Network) -> Result<SignedEnvelope, SignError> {
        let keypair = self.keypair.as_ref().ok_or(SignError::NotConnected)?;
        let mut envelope = TransactionEnvelope::unsigned(tx.clone());
        crypto::sign_envelope(&mut envelope, keypair, network);
        Ok(SignedEnvelope::from_envelope(envelope))
    }
}

impl fmt::Debug for SecretKeyWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKeyWallet")
            .field("public_key", &self.public_key)
            .field("armed", &self.keypair.is_some())
            .finish()
    }
}

/// Signs through the Albedo intent protocol.
pub struct AlbedoWallet {
    session: Session,
    transport: Arc<dyn IntentTransport>,
    public_key: Option<PublicKey>,
}

impl AlbedoWallet {
    pub fn new(session: Session, transport: Arc<dyn IntentTransport>) -> Self {
        Self {
            session,
            transport,
            public_key: None,
        }
    }

    async fn get_public_key(&mut self) -> Result<PublicKey, WalletError> {
        let response = self.transport.request(IntentRequest::PublicKey).await?;
        let pubkey = response
            .pubkey
            .ok_or_else(|| WalletError::Communication("reply is missing pubkey".into()))?;
        let public_key = PublicKey::from_account_id(&pubkey)
            .map_err(|e| WalletError::Communication(format!("invalid pubkey in reply: {e}")))?;
        self.session.persist_wallet(WalletKind::Albedo, &public_key)?;
        self.public_key = Some(public_key);
        Ok(public_key)
    }

    async fn sign(&self, tx: &Transaction, network: Network) -> Result<SignedEnvelope, SignError> {
        let signer = self.public_key.ok_or(SignError::NotConnected)?;
        let unsigned = TransactionEnvelope::unsigned(tx.clone());
        let request = IntentRequest::Tx {
            xdr: unsigned.to_xdr_base64(),
            network: network.intent_name().to_string(),
        };
        debug!(network = network.intent_name(), "requesting external signature");
        let response = self.transport.request(request).await?;
        let signed_xdr = response.signed_envelope_xdr.ok_or_else(|| {
            SignError::Communication("reply is missing signed_envelope_xdr".into())
        })?;

        let envelope = TransactionEnvelope::from_xdr_base64(&signed_xdr)?;
        if envelope.tx != *tx {
            return Err(SignError::TransactionMismatch);
        }
        crypto::verify_envelope(&envelope, &signer, network)?;
        Ok(SignedEnvelope {
            envelope,
            xdr: signed_xdr,
        })
    }
}

impl fmt::Debug for AlbedoWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlbedoWallet")
            .field("public_key", &self.public_key)
            .finish()
    }
}

/// A wallet variant.
#[derive(Debug)]
pub enum Wallet {
    SecretKey(SecretKeyWallet),
    Albedo(AlbedoWallet),
}

impl Wallet {
    pub fn kind(&self) -> WalletKind {
        match self {
            Wallet::SecretKey(_) => WalletKind::SecretKey,
            Wallet::Albedo(_) => WalletKind::Albedo,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    pub fn friendly_name(&self) -> &'static str {
        self.kind().friendly_name()
    }

    pub fn extension(&self) -> Option<&'static str> {
        self.kind().extension()
    }

    pub fn is_signed_externally(&self) -> bool {
        self.kind().is_external()
    }

    /// Account this wallet is connected as, if any.
    pub fn public_key(&self) -> Option<PublicKey> {
        match self {
            Wallet::SecretKey(w) => w.public_key,
            Wallet::Albedo(w) => w.public_key,
        }
    }

    /// Whether [`sign`](Self::sign) can succeed without reconnecting.
    pub fn can_sign(&self) -> bool {
        match self {
            Wallet::SecretKey(w) => w.keypair.is_some(),
            Wallet::Albedo(w) => w.public_key.is_some(),
        }
    }

    /// Connect the wallet and return the account it controls.
    ///
    /// The secret-key variant requires `secret`; the external variant ignores
    /// it and asks the signer instead. On success the variant name and account
    /// ID are written to the session store.
    pub async fn get_public_key(&mut self, secret: Option<&str>) -> Result<PublicKey, WalletError> {
        let kind = self.kind();
        let public_key = match self {
            Wallet::SecretKey(w) => w.get_public_key(secret)?,
            Wallet::Albedo(w) => w.get_public_key().await?,
        };
        info!(wallet = kind.name(), account = %public_key, "wallet connected");
        Ok(public_key)
    }

    /// Sign `tx` for `network`, returning an envelope with the wallet's
    /// signature appended. Requires a prior successful
    /// [`get_public_key`](Self::get_public_key).
    pub async fn sign(&self, tx: &Transaction, network: Network) -> Result<SignedEnvelope, SignError> {
        match self {
            Wallet::SecretKey(w) => w.sign(tx, network),
            Wallet::Albedo(w) => w.sign(tx, network).await,
        }
    }

    /// Sign with `keypair` from now on without recording it as the
    /// session's account. External wallets ignore it and return `None`.
    pub(crate) fn arm(&mut self, keypair: KeyPair) -> Option<PublicKey> {
        match self {
            Wallet::SecretKey(w) => Some(w.arm(keypair)),
            Wallet::Albedo(_) => None,
        }
    }

    /// Reattach a previously connected account without re-arming a secret.
    pub(crate) fn restore_public_key(&mut self, public_key: PublicKey) {
        match self {
            Wallet::SecretKey(w) => w.public_key = Some(public_key),
            Wallet::Albedo(w) => w.public_key = Some(public_key),
        }
    }

    pub(crate) fn new(kind: WalletKind, store: Arc<dyn KeyValueStore>, transport: Arc<dyn IntentTransport>) -> Self {
        let session = Session::new(store);
        match kind {
            WalletKind::SecretKey => Wallet::SecretKey(SecretKeyWallet::new(session)),
            WalletKind::Albedo => Wallet::Albedo(AlbedoWallet::new(session, transport)),
        }
    }
}
