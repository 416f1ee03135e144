//! External collaborator interfaces for the Tombola RNG service.
//!
//! The RNG core never talks to a chain, token, oracle, or beacon directly —
//! each is abstracted behind a trait defined here:
//! - [`BlockSource`]: block numbers and the 256-block blockhash window
//! - [`FeeToken`]: the fee token's transfer surface
//! - [`VrfOracle`] / [`SubscriptionVrfOracle`]: the oracle request side
//!   (fulfillment arrives as an inbound call on the generator)
//! - [`RandomnessBeacon`]: pulse-indexed published randomness
//!
//! Production wiring adapts a chain client to these traits; tests use the
//! deterministic implementations from `tombola-nullables`.

pub mod beacon;
pub mod error;
pub mod oracle;
pub mod source;
pub mod token;

pub use beacon::{BeaconClient, BeaconPulse, CachedBeacon, RandomnessBeacon};
pub use error::ChainError;
pub use oracle::{SubscriptionVrfOracle, VrfOracle, WordsRequest};
pub use source::{BlockSource, BLOCKHASH_WINDOW};
pub use token::FeeToken;
