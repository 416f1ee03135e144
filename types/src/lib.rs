//! Fundamental types for the Tombola RNG service.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: account addresses, token amounts, and the 32-byte value types
//! used for block hashes, random values, and oracle key hashes.

pub mod address;
pub mod amount;
pub mod value;

pub use address::Address;
pub use amount::TokenAmount;
pub use value::{BlockHash, KeyHash, RandomValue};
