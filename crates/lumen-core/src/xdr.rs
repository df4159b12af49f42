//! XDR wire codec for transaction envelopes.
//!
//! Implements the fixed subset of the ledger's XDR schema this wallet
//! produces: a v1 `TransactionEnvelope` holding a `Transaction` with an
//! ed25519 source account, optional time bounds, a none/text memo and native
//! payment operations. Anything outside that subset decodes to
//! [`XdrError::Unsupported`].
//!
//! XDR is big-endian with every item padded to a multiple of four bytes.

use crate::amount::Amount;
use crate::constants::{MAX_MEMO_TEXT_LEN, MAX_OPERATIONS, MAX_SIGNATURES};
use crate::crypto::PublicKey;
use crate::error::XdrError;
use crate::types::{DecoratedSignature, Memo, Operation, TimeBounds, Transaction, TransactionEnvelope};

/// `EnvelopeType::ENVELOPE_TYPE_TX`.
pub const ENVELOPE_TYPE_TX: i32 = 2;

const KEY_TYPE_ED25519: i32 = 0;
const PRECOND_NONE: i32 = 0;
const PRECOND_TIME: i32 = 1;
const MEMO_NONE: i32 = 0;
const MEMO_TEXT: i32 = 1;
const OPERATION_PAYMENT: i32 = 1;
const ASSET_TYPE_NATIVE: i32 = 0;
const SIGNATURE_LEN: usize = 64;

/// Encode a transaction (the body that signatures commit to).
pub fn encode_transaction(tx: &Transaction) -> Vec<u8> {
    let mut w = XdrWriter::default();
    write_transaction(&mut w, tx);
    w.into_bytes()
}

/// Encode a full envelope.
pub fn encode_envelope(envelope: &TransactionEnvelope) -> Vec<u8> {
    let mut w = XdrWriter::default();
    w.i32(ENVELOPE_TYPE_TX);
    write_transaction(&mut w, &envelope.tx);
    w.u32(envelope.signatures.len() as u32);
    for sig in &envelope.signatures {
        w.fixed(&sig.hint);
        w.var_opaque(&sig.signature);
    }
    w.into_bytes()
}

/// Decode a full envelope, rejecting trailing bytes.
pub fn decode_envelope(bytes: &[u8]) -> Result<TransactionEnvelope, XdrError> {
    let mut r = XdrReader::new(bytes);
    let envelope_type = r.i32()?;
    if envelope_type != ENVELOPE_TYPE_TX {
        return Err(XdrError::Unsupported(format!("envelope type {envelope_type}")));
    }
    let tx = read_transaction(&mut r)?;

    let count = r.len_prefix("signatures", MAX_SIGNATURES)?;
    let mut signatures = Vec::with_capacity(count);
    for _ in 0..count {
        let hint = r.fixed::<4>()?;
        let sig = r.var_opaque("signature", SIGNATURE_LEN)?;
        let signature: [u8; SIGNATURE_LEN] = sig
            .as_slice()
            .try_into()
            .map_err(|_| XdrError::LengthExceeded {
                what: "signature",
                len: sig.len(),
                max: SIGNATURE_LEN,
            })?;
        signatures.push(DecoratedSignature { hint, signature });
    }
    r.finish()?;
    Ok(TransactionEnvelope { tx, signatures })
}

fn write_transaction(w: &mut XdrWriter, tx: &Transaction) {
    write_account(w, &tx.source_account);
    w.u32(tx.fee);
    w.i64(tx.sequence);

    match &tx.time_bounds {
        None => w.i32(PRECOND_NONE),
        Some(tb) => {
            w.i32(PRECOND_TIME);
            w.u64(tb.min_time);
            w.u64(tb.max_time);
        }
    }

    match &tx.memo {
        Memo::None => w.i32(MEMO_NONE),
        Memo::Text(text) => {
            w.i32(MEMO_TEXT);
            w.var_opaque(text.as_bytes());
        }
    }

    w.u32(tx.operations.len() as u32);
    for op in &tx.operations {
        // Operations inherit the transaction source account.
        w.u32(0);
        match op {
            Operation::Payment {
                destination,
                amount,
            } => {
                w.i32(OPERATION_PAYMENT);
                write_account(w, destination);
                w.i32(ASSET_TYPE_NATIVE);
                w.i64(amount.stroops());
            }
        }
    }

    // ext
    w.i32(0);
}

fn write_account(w: &mut XdrWriter, account: &PublicKey) {
    w.i32(KEY_TYPE_ED25519);
    w.fixed(&account.to_bytes());
}

fn read_transaction(r: &mut XdrReader<'_>) -> Result<Transaction, XdrError> {
    let source_account = read_account(r)?;
    let fee = r.u32()?;
    let sequence = r.i64()?;

    let time_bounds = match r.i32()? {
        PRECOND_NONE => None,
        PRECOND_TIME => Some(TimeBounds {
            min_time: r.u64()?,
            max_time: r.u64()?,
        }),
        other => return Err(XdrError::Unsupported(format!("precondition type {other}"))),
    };

    let memo = match r.i32()? {
        MEMO_NONE => Memo::None,
        MEMO_TEXT => {
            let bytes = r.var_opaque("memo", MAX_MEMO_TEXT_LEN)?;
            Memo::Text(String::from_utf8(bytes).map_err(|_| XdrError::InvalidUtf8)?)
        }
        other => return Err(XdrError::Unsupported(format!("memo type {other}"))),
    };

    let count = r.len_prefix("operations", MAX_OPERATIONS)?;
    let mut operations = Vec::with_capacity(count);
    for _ in 0..count {
        if r.u32()? != 0 {
            return Err(XdrError::Unsupported("operation source account".into()));
        }
        let op_type = r.i32()?;
        if op_type != OPERATION_PAYMENT {
            return Err(XdrError::Unsupported(format!("operation type {op_type}")));
        }
        let destination = read_account(r)?;
        let asset_type = r.i32()?;
        if asset_type != ASSET_TYPE_NATIVE {
            return Err(XdrError::Unsupported(format!("asset type {asset_type}")));
        }
        let amount = Amount::from_stroops(r.i64()?)
            .map_err(|e| XdrError::Unsupported(e.to_string()))?;
        operations.push(Operation::Payment {
            destination,
            amount,
        });
    }

    match r.i32()? {
        0 => {}
        other => return Err(XdrError::InvalidDiscriminant { what: "transaction ext", value: other }),
    }

    Ok(Transaction {
        source_account,
        fee,
        sequence,
        time_bounds,
        memo,
        operations,
    })
}

fn read_account(r: &mut XdrReader<'_>) -> Result<PublicKey, XdrError> {
    match r.i32()? {
        KEY_TYPE_ED25519 => {
            let bytes = r.fixed::<32>()?;
            Ok(PublicKey::from_bytes(&bytes)?)
        }
        other => Err(XdrError::Unsupported(format!("account key type {other}"))),
    }
}

#[derive(Default)]
struct XdrWriter {
    buf: Vec<u8>,
}

impl XdrWriter {
    fn i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    fn u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    fn i64(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    fn u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    /// Fixed-length opaque; callers only pass multiples of four.
    fn fixed(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    fn var_opaque(&mut self, bytes: &[u8]) {
        self.u32(bytes.len() as u32);
        self.buf.extend_from_slice(bytes);
        let pad = (4 - bytes.len() % 4) % 4;
        self.buf.extend(std::iter::repeat_n(0u8, pad));
    }

    fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

struct XdrReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> XdrReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], XdrError> {
        let end = self.pos.checked_add(n).ok_or(XdrError::UnexpectedEof)?;
        let slice = self.data.get(self.pos..end).ok_or(XdrError::UnexpectedEof)?;
        self.pos = end;
        Ok(slice)
    }

    fn fixed<const N: usize>(&mut self) -> Result<[u8; N], XdrError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn i32(&mut self) -> Result<i32, XdrError> {
        Ok(i32::from_be_bytes(self.fixed::<4>()?))
    }

    fn u32(&mut self) -> Result<u32, XdrError> {
        Ok(u32::from_be_bytes(self.fixed::<4>()?))
    }

    fn i64(&mut self) -> Result<i64, XdrError> {
        Ok(i64::from_be_bytes(self.fixed::<8>()?))
    }

    fn u64(&mut self) -> Result<u64, XdrError> {
        Ok(u64::from_be_bytes(self.fixed::<8>()?))
    }

    fn len_prefix(&mut self, what: &'static str, max: usize) -> Result<usize, XdrError> {
        let len = self.u32()? as usize;
        if len > max {
            return Err(XdrError::LengthExceeded { what, len, max });
        }
        Ok(len)
    }

    fn var_opaque(&mut self, what: &'static str, max: usize) -> Result<Vec<u8>, XdrError> {
        let len = self.len_prefix(what, max)?;
        let bytes = self.take(len)?.to_vec();
        let pad = (4 - len % 4) % 4;
        if self.take(pad)?.iter().any(|&b| b != 0) {
            return Err(XdrError::InvalidPadding);
        }
        Ok(bytes)
    }

    fn finish(&self) -> Result<(), XdrError> {
        let remaining = self.data.len() - self.pos;
        if remaining != 0 {
            return Err(XdrError::TrailingBytes(remaining));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::Network;
    use crate::crypto::{KeyPair, sign_envelope, transaction_hash};

    const UNSIGNED_VECTOR: &str = "AAAAAgAAAADtSSjGKNHCxurpAziQWZVhKVknOlxj+TY2wUYUrIc30QAAAGQAAAAAAAAAKgAAAAEAAAAAAAAAAAAAAABlU/EAAAAAAQAAAAZjb2ZmZWUAAAAAAAEAAAAAAAAAAQAAAADKk6wXBRhwcdZ7g8f/Dv6BCOjsRTBXXXcmh5Mz29q+fAAAAAAAAAAAQZCrAAAAAAAAAAAA";
    const SIGNED_VECTOR: &str = "AAAAAgAAAADtSSjGKNHCxurpAziQWZVhKVknOlxj+TY2wUYUrIc30QAAAGQAAAAAAAAAKgAAAAEAAAAAAAAAAAAAAABlU/EAAAAAAQAAAAZjb2ZmZWUAAAAAAAEAAAAAAAAAAQAAAADKk6wXBRhwcdZ7g8f/Dv6BCOjsRTBXXXcmh5Mz29q+fAAAAAAAAAAAQZCrAAAAAAAAAAABrIc30QAAAEBWcYP3yO3AuXUVdBanmon5L4kC9qeTurEnADNzx9mkgrCnImq4SBycb2ROlyOH3X1cDahso5pqayv7hc7FgGQK";

    fn vector_tx() -> Transaction {
        Transaction {
            source_account: KeyPair::from_seed_bytes([3u8; 32]).public_key(),
            fee: 100,
            sequence: 42,
            time_bounds: Some(TimeBounds { min_time: 0, max_time: 1_700_000_000 }),
            memo: Memo::Text("coffee".into()),
            operations: vec![Operation::Payment {
                destination: KeyPair::from_seed_bytes([4u8; 32]).public_key(),
                amount: Amount::from_stroops(1_100_000_000).unwrap(),
            }],
        }
    }

    #[test]
    fn unsigned_envelope_matches_vector() {
        let env = TransactionEnvelope::unsigned(vector_tx());
        assert_eq!(env.to_xdr_base64(), UNSIGNED_VECTOR);
    }

    #[test]
    fn transaction_hash_matches_vector() {
        assert_eq!(
            hex::encode(transaction_hash(&vector_tx(), Network::Testnet)),
            "cb8abe0fdcf4be48bd8fa34883aa8fdc1ad853afc408e1a5af3aa481d1a2955d"
        );
    }

    #[test]
    fn signed_envelope_matches_vector() {
        let mut env = TransactionEnvelope::unsigned(vector_tx());
        sign_envelope(&mut env, &KeyPair::from_seed_bytes([3u8; 32]), Network::Testnet);
        assert_eq!(env.to_xdr_base64(), SIGNED_VECTOR);
    }

    #[test]
    fn decode_signed_vector() {
        let env = TransactionEnvelope::from_xdr_base64(SIGNED_VECTOR).unwrap();
        assert_eq!(env.tx, vector_tx());
        assert_eq!(env.signatures.len(), 1);
        assert_eq!(
            env.signatures[0].hint,
            KeyPair::from_seed_bytes([3u8; 32]).public_key().signature_hint()
        );
    }

    #[test]
    fn decode_without_time_bounds_or_memo() {
        let mut tx = vector_tx();
        tx.time_bounds = None;
        tx.memo = Memo::None;
        let env = TransactionEnvelope::unsigned(tx);
        let bytes = encode_envelope(&env);
        assert_eq!(decode_envelope(&bytes).unwrap(), env);
    }

    #[test]
    fn decode_rejects_truncated() {
        let bytes = encode_envelope(&TransactionEnvelope::unsigned(vector_tx()));
        assert_eq!(
            decode_envelope(&bytes[..bytes.len() - 3]),
            Err(XdrError::UnexpectedEof)
        );
    }

    #[test]
    fn decode_rejects_trailing_bytes() {
        let mut bytes = encode_envelope(&TransactionEnvelope::unsigned(vector_tx()));
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        assert_eq!(decode_envelope(&bytes), Err(XdrError::TrailingBytes(4)));
    }

    #[test]
    fn decode_rejects_other_envelope_types() {
        let mut bytes = encode_envelope(&TransactionEnvelope::unsigned(vector_tx()));
        bytes[3] = 5; // fee bump
        assert!(matches!(decode_envelope(&bytes), Err(XdrError::Unsupported(_))));
    }

    #[test]
    fn decode_rejects_nonzero_padding() {
        let mut bytes = encode_envelope(&TransactionEnvelope::unsigned(vector_tx()));
        // "coffee" is 6 bytes followed by 2 padding bytes.
        let memo_at = bytes
            .windows(6)
            .position(|w| w == b"coffee")
            .unwrap();
        bytes[memo_at + 6] = 1;
        assert_eq!(decode_envelope(&bytes), Err(XdrError::InvalidPadding));
    }
}
