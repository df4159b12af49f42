//! Integration test suite for Lumen.
//!
//! Drives the wallet crate end to end against an in-memory ledger that
//! enforces sequence numbers, signatures, fees and balances the way the
//! real ledger does, plus property tests over the core encodings.

pub mod helpers;
