//! # lumen-wallet
//! Wallet variants and the payment workflow.
//!
//! Provides the closed set of signer variants (local secret key, external
//! intent signer), the build → sign → submit payment pipeline, the pure
//! form validator that gates it, and read-only account queries.
//!
//! # Modules
//!
//! - [`error`]: `WalletError`, `SignError`, `PaymentError`
//! - [`keys`]: Key generation and parsing helpers
//! - [`storage`]: In-memory and JSON-file key-value stores
//! - [`session`]: Session state over a key-value store
//! - [`wallet`]: `Wallet` variants
//! - [`factory`]: `WalletFactory`
//! - [`validation`]: Payment form validation
//! - [`payment`]: Transaction building, signing and submission
//! - [`account`]: Balance and payment history readers

pub mod account;
pub mod error;
pub mod factory;
pub mod keys;
pub mod payment;
pub mod session;
pub mod storage;
pub mod validation;
pub mod wallet;

// Re-exports for convenient access
pub use account::{AccountOverview, AccountReader, PaymentHistoryRecord, page_count, paginate};
pub use error::{PaymentError, SignError, WalletError};
pub use factory::WalletFactory;
pub use keys::generate_keys;
pub use payment::{PaymentResult, PaymentService, PaymentSummary};
pub use session::{Session, abbreviate_public_key};
pub use storage::{FileStore, MemoryStore};
pub use validation::{FormErrors, FormField, is_form_valid};
pub use wallet::{SignedEnvelope, Wallet, WalletKind};
