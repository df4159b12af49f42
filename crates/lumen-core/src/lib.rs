//! # lumen-core
//! Foundation types and traits for the Lumen wallet.

pub mod amount;
pub mod constants;
pub mod crypto;
pub mod error;
pub mod records;
pub mod strkey;
pub mod traits;
pub mod types;
pub mod xdr;
