//! StrKey encoding for account IDs and secret seeds.
//!
//! A StrKey is the RFC 4648 base32 encoding (no padding) of:
//! - a version byte selecting the key type (`G` for account IDs, `S` for
//!   secret seeds once encoded)
//! - the 32-byte Ed25519 key material
//! - a CRC16-XModem checksum of the preceding 33 bytes, little-endian
//!
//! 35 bytes encode to exactly 56 characters, so no padding is ever present.

use crc::{CRC_16_XMODEM, Crc};

use crate::error::StrKeyError;

/// RFC 4648 base32 alphabet.
const ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// Length of an encoded Ed25519 StrKey.
pub const STRKEY_LEN: usize = 56;

/// Decoded payload length: version byte + key + checksum.
const RAW_LEN: usize = 1 + 32 + 2;

/// Key type encoded in the first byte of a StrKey.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VersionByte {
    /// Ed25519 public key (account ID), renders with a leading `G`.
    AccountId,
    /// Ed25519 secret seed, renders with a leading `S`.
    SecretSeed,
}

impl VersionByte {
    /// Raw version byte value.
    pub fn byte(self) -> u8 {
        match self {
            VersionByte::AccountId => 6 << 3,
            VersionByte::SecretSeed => 18 << 3,
        }
    }
}

/// Encode 32 bytes of key material as a StrKey.
pub fn encode(version: VersionByte, key: &[u8; 32]) -> String {
    let mut raw = Vec::with_capacity(RAW_LEN);
    raw.push(version.byte());
    raw.extend_from_slice(key);
    let checksum = crc16_xmodem(&raw);
    raw.extend_from_slice(&checksum.to_le_bytes());
    base32_encode(&raw)
}

/// Decode a StrKey, checking length, version byte and checksum.
pub fn decode(version: VersionByte, s: &str) -> Result<[u8; 32], StrKeyError> {
    if s.len() != STRKEY_LEN {
        return Err(StrKeyError::InvalidLength(s.len()));
    }
    let raw = base32_decode(s)?;
    if raw.len() != RAW_LEN {
        return Err(StrKeyError::InvalidLength(s.len()));
    }

    if raw[0] != version.byte() {
        return Err(StrKeyError::InvalidVersion {
            expected: version.byte(),
            got: raw[0],
        });
    }

    let (body, checksum) = raw.split_at(RAW_LEN - 2);
    let expected = crc16_xmodem(body);
    if checksum != expected.to_le_bytes() {
        return Err(StrKeyError::InvalidChecksum);
    }

    let mut key = [0u8; 32];
    key.copy_from_slice(&body[1..]);
    Ok(key)
}

/// Whether `s` is a well-formed account ID (`G...`).
pub fn is_valid_account_id(s: &str) -> bool {
    decode(VersionByte::AccountId, s).is_ok()
}

/// Whether `s` is a well-formed secret seed (`S...`).
pub fn is_valid_secret_seed(s: &str) -> bool {
    decode(VersionByte::SecretSeed, s).is_ok()
}

const XMODEM: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);

/// CRC16-XModem (polynomial 0x1021, initial value 0).
fn crc16_xmodem(data: &[u8]) -> u16 {
    XMODEM.checksum(data)
}

fn base32_encode(data: &[u8]) -> String {
    let mut out = String::with_capacity((data.len() * 8).div_ceil(5));
    let mut buffer: u32 = 0;
    let mut bits: u32 = 0;
    for &byte in data {
        buffer = ((buffer << 8) | byte as u32) & 0xFFFF;
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(ALPHABET[((buffer >> bits) & 0x1F) as usize] as char);
        }
    }
    if bits > 0 {
        out.push(ALPHABET[((buffer << (5 - bits)) & 0x1F) as usize] as char);
    }
    out
}

fn base32_decode(s: &str) -> Result<Vec<u8>, StrKeyError> {
    let mut out = Vec::with_capacity(s.len() * 5 / 8);
    let mut buffer: u32 = 0;
    let mut bits: u32 = 0;
    for c in s.chars() {
        let value = ALPHABET
            .iter()
            .position(|&a| a as char == c)
            .ok_or(StrKeyError::InvalidCharacter(c))? as u32;
        buffer = ((buffer << 5) | value) & 0xFFFF;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push((buffer >> bits) as u8);
        }
    }
    // Leftover bits must be zero padding shorter than one symbol.
    if bits >= 5 || buffer & ((1 << bits) - 1) != 0 {
        return Err(StrKeyError::InvalidPadding);
    }
    Ok(out)
}
