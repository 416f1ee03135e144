//! VRF oracle request interfaces.
//!
//! Two oracle generations exist side by side: the per-request-fee oracle
//! ([`VrfOracle`]) and the subscription-funded oracle
//! ([`SubscriptionVrfOracle`]). Both assign their own correlation id at
//! request time; fulfillment arrives later as an inbound call on the
//! requesting generator, carrying only that correlation id.

use serde::{Deserialize, Serialize};
use tombola_types::{Address, KeyHash};

/// The per-request-fee VRF oracle (fee travels with the request via
/// `transfer_and_call`).
pub trait VrfOracle: Send + Sync {
    /// The oracle contract's address — the only principal allowed to
    /// deliver fulfillment callbacks.
    fn address(&self) -> Address;

    /// Issue a randomness request against the proving key `key_hash` with
    /// the given seed. Returns the oracle-assigned correlation id.
    fn request_randomness(&self, key_hash: KeyHash, seed: [u8; 32]) -> u64;
}

/// Parameters of a subscription-funded randomness request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordsRequest {
    pub key_hash: KeyHash,
    pub subscription_id: u64,
    pub request_confirmations: u16,
    pub callback_gas_limit: u32,
    pub num_words: u32,
}

/// The subscription-funded VRF oracle. Fees are debited from a
/// subscription registered with the oracle network out-of-band.
pub trait SubscriptionVrfOracle: Send + Sync {
    fn address(&self) -> Address;

    /// Issue a request for `request.num_words` random words. Returns the
    /// oracle-assigned correlation id.
    fn request_random_words(&self, request: &WordsRequest) -> u64;
}
