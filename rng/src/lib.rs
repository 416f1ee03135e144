//! Randomness request/fulfillment protocol for the Tombola prize draws.
//!
//! Four interchangeable backends implement the [`RngService`] capability
//! trait, each with its own completion model:
//! - [`BlockhashRng`]: a future block hash, available two blocks later —
//!   escalating to the oracle when the caller's budget meets a threshold
//! - [`VrfOracleRng`]: external oracle with per-request fee, completed by
//!   an asynchronous callback
//! - [`SubscriptionVrfRng`]: external oracle with subscription-funded fees
//!   and a manager-gated request path
//! - [`BeaconPulseRng`]: a third-party beacon publishing on a fixed pulse
//!   schedule, polled without callbacks
//!
//! The coordinator crate multiplexes these behind one global request-id
//! space.

pub mod beacon;
pub mod blockhash;
pub mod error;
pub mod events;
pub mod oracle;
pub mod subscription;

pub use beacon::BeaconPulseRng;
pub use blockhash::BlockhashRng;
pub use error::RngError;
pub use events::{EventLog, RngEvent};
pub use oracle::VrfOracleRng;
pub use subscription::SubscriptionVrfRng;

use tombola_types::{Address, RandomValue, TokenAmount};

/// A freshly issued randomness request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RngRequest {
    /// The service-assigned request id (local to the issuing service).
    pub id: u64,
    /// The block at or after which the randomness becomes derivable.
    pub lock_block: u64,
}

/// The contract every randomness source implements.
///
/// Requests return immediately; completion may be deferred. Polling via
/// [`is_request_complete`](Self::is_request_complete) and
/// [`random_number`](Self::random_number) is repeatable and non-blocking:
/// before completion `random_number` yields [`RandomValue::ZERO`] rather
/// than failing, so integrators can poll without special-casing.
///
/// The coordinator implements this trait too — to its consumer it is just
/// another randomness service.
pub trait RngService: Send + Sync {
    /// The service's account identity.
    fn address(&self) -> Address;

    /// Issue a new request on behalf of `caller`.
    ///
    /// `token` and `budget` describe what the caller is willing to spend;
    /// fee-charging backends fail with [`RngError::TransferFailed`] when
    /// the caller cannot be charged.
    fn request_random_number(
        &self,
        caller: Address,
        token: Address,
        budget: TokenAmount,
    ) -> Result<RngRequest, RngError>;

    /// Whether the request's randomness can be read.
    fn is_request_complete(&self, request_id: u64) -> Result<bool, RngError>;

    /// The request's random value, or [`RandomValue::ZERO`] before
    /// completion. Idempotent once completed.
    fn random_number(&self, request_id: u64) -> Result<RandomValue, RngError>;

    /// Advisory fee quote, for integrators pre-approving token transfers.
    fn get_request_fee(&self) -> Result<(Address, TokenAmount), RngError>;

    /// The most recently issued request id (0 before the first request).
    fn get_last_request_id(&self) -> u64;
}
