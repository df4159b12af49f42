//! # lumen-net
//! HTTP implementations of the Lumen trait seams.
//!
//! - [`horizon`]: [`HorizonClient`], a [`LedgerApi`](lumen_core::traits::LedgerApi) over Horizon REST
//! - [`intent`]: [`HttpIntentTransport`], an [`IntentTransport`](lumen_core::traits::IntentTransport) posting JSON intents

pub mod horizon;
pub mod intent;

pub use horizon::HorizonClient;
pub use intent::HttpIntentTransport;

/// Request timeout shared by all HTTP clients.
pub const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);
