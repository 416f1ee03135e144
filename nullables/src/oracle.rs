//! Nullable VRF oracle — sequential correlation ids, recorded requests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tombola_chain::{SubscriptionVrfOracle, VrfOracle, WordsRequest};
use tombola_types::{Address, KeyHash};

/// A deterministic oracle for testing both oracle generations.
///
/// Correlation ids are assigned sequentially from a configurable base that
/// is deliberately far from the generators' local id space, so tests catch
/// any code path that confuses the two.
pub struct NullOracle {
    address: Address,
    next_correlation: AtomicU64,
    randomness_requests: Mutex<Vec<(KeyHash, [u8; 32])>>,
    words_requests: Mutex<Vec<WordsRequest>>,
}

impl NullOracle {
    pub fn new(address: Address) -> Self {
        Self::with_correlation_base(address, 7000)
    }

    pub fn with_correlation_base(address: Address, base: u64) -> Self {
        Self {
            address,
            next_correlation: AtomicU64::new(base),
            randomness_requests: Mutex::new(Vec::new()),
            words_requests: Mutex::new(Vec::new()),
        }
    }

    /// The correlation id the next request will be assigned.
    pub fn peek_next_correlation(&self) -> u64 {
        self.next_correlation.load(Ordering::SeqCst) + 1
    }

    /// Per-request-fee requests observed so far.
    pub fn randomness_requests(&self) -> Vec<(KeyHash, [u8; 32])> {
        self.randomness_requests.lock().unwrap().clone()
    }

    /// Subscription-funded requests observed so far.
    pub fn words_requests(&self) -> Vec<WordsRequest> {
        self.words_requests.lock().unwrap().clone()
    }
}

impl VrfOracle for NullOracle {
    fn address(&self) -> Address {
        self.address
    }

    fn request_randomness(&self, key_hash: KeyHash, seed: [u8; 32]) -> u64 {
        self.randomness_requests
            .lock()
            .unwrap()
            .push((key_hash, seed));
        self.next_correlation.fetch_add(1, Ordering::SeqCst) + 1
    }
}

impl SubscriptionVrfOracle for NullOracle {
    fn address(&self) -> Address {
        self.address
    }

    fn request_random_words(&self, request: &WordsRequest) -> u64 {
        self.words_requests.lock().unwrap().push(*request);
        self.next_correlation.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correlation_ids_are_sequential_from_base() {
        let oracle = NullOracle::with_correlation_base(Address::from_label("vrf"), 100);
        let key_hash = KeyHash::new([1u8; 32]);
        assert_eq!(oracle.request_randomness(key_hash, [0u8; 32]), 101);
        assert_eq!(oracle.request_randomness(key_hash, [0u8; 32]), 102);
    }

    #[test]
    fn requests_are_recorded() {
        let oracle = NullOracle::new(Address::from_label("vrf"));
        let key_hash = KeyHash::new([2u8; 32]);
        oracle.request_randomness(key_hash, [9u8; 32]);

        let requests = oracle.randomness_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0, key_hash);
        assert_eq!(requests[0].1, [9u8; 32]);
    }
}
