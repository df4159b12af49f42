//! Error types for the Lumen core crate.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StrKeyError {
    #[error("invalid length: {0}")] InvalidLength(usize),
    #[error("invalid character: {0}")] InvalidCharacter(char),
    #[error("invalid version byte: expected {expected:#04x}, got {got:#04x}")] InvalidVersion { expected: u8, got: u8 },
    #[error("invalid checksum")] InvalidChecksum,
    #[error("invalid padding bits")] InvalidPadding,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid public key bytes")] InvalidPublicKey,
    #[error("invalid signature bytes")] InvalidSignature,
    #[error("signature verification failed")] VerificationFailed,
    #[error(transparent)] StrKey(#[from] StrKeyError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("empty amount")] Empty,
    #[error("invalid amount format: {0}")] InvalidFormat(String),
    #[error("too many decimal places: {0}")] TooManyDecimals(String),
    #[error("negative amount")] Negative,
    #[error("amount overflow")] Overflow,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    #[error("memo too long: {len} > {max} bytes")] MemoTooLong { len: usize, max: usize },
    #[error("transaction has no operations")] NoOperations,
    #[error("too many operations: {0}")] TooManyOperations(usize),
    #[error("payment amount must be positive")] NonPositiveAmount,
    #[error("fee overflow")] FeeOverflow,
    #[error("sequence number overflow")] SequenceOverflow,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum XdrError {
    #[error("unexpected end of input")] UnexpectedEof,
    #[error("invalid {what} discriminant: {value}")] InvalidDiscriminant { what: &'static str, value: i32 },
    #[error("{what} length {len} exceeds {max}")] LengthExceeded { what: &'static str, len: usize, max: usize },
    #[error("non-zero padding")] InvalidPadding,
    #[error("invalid utf-8 in string")] InvalidUtf8,
    #[error("{0} trailing bytes")] TrailingBytes(usize),
    #[error("base64: {0}")] Base64(String),
    #[error("unsupported: {0}")] Unsupported(String),
    #[error(transparent)] Crypto(#[from] CryptoError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("resource not found: {0}")] NotFound(String),
    #[error("transaction rejected: {transaction}")] Rejected { transaction: String, operations: Vec<String> },
    #[error("http status {status}: {message}")] Http { status: u16, message: String },
    #[error("transport: {0}")] Transport(String),
    #[error("invalid response: {0}")] InvalidResponse(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntentError {
    #[error("request rejected by user")] Rejected,
    #[error("intent failed with code {code}: {message}")] Failed { code: i32, message: String },
    #[error("transport: {0}")] Transport(String),
    #[error("invalid response: {0}")] InvalidResponse(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("I/O error: {0}")] Io(String),
    #[error("corrupted store: {0}")] Corrupted(String),
}
