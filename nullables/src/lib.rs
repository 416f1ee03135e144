//! Nullable infrastructure for deterministic testing.
//!
//! Every external dependency of the RNG core (block source, fee token,
//! VRF oracle, beacon) is abstracted behind a trait in `tombola-chain`.
//! This crate provides test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically (advance blocks, publish pulses,
//!   force transfer failures)
//! - Never touch the network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod beacon;
pub mod chain;
pub mod oracle;
pub mod token;

pub use beacon::NullBeacon;
pub use chain::NullChain;
pub use oracle::NullOracle;
pub use token::NullToken;
