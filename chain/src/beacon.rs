//! Randomness beacon — pulse-indexed published randomness.
//!
//! A beacon publishes a fresh random value at fixed block intervals
//! ("pulses"). The protocol core only ever reads through the synchronous
//! [`RandomnessBeacon`] trait; [`BeaconClient`] is an HTTP client for a
//! beacon relay that feeds a [`CachedBeacon`] so reads stay non-blocking.

use crate::ChainError;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Mutex;
use tombola_types::RandomValue;

/// Pulse-indexed read access to a beacon's published randomness.
///
/// Unpublished pulses read as [`RandomValue::ZERO`]; the beacon-backed
/// generator interprets that as "not yet complete".
pub trait RandomnessBeacon: Send + Sync {
    fn randomness(&self, pulse: u64) -> RandomValue;
}

/// A beacon relay response for a single pulse.
#[derive(Debug, Clone, Deserialize)]
pub struct BeaconPulse {
    /// The block number this pulse was published for.
    pub pulse: u64,
    /// Hex-encoded 32-byte randomness value.
    pub randomness: String,
}

impl BeaconPulse {
    /// Decode the hex randomness into a [`RandomValue`].
    pub fn to_random_value(&self) -> Result<RandomValue, ChainError> {
        let bytes = hex::decode(&self.randomness)
            .map_err(|e| ChainError::InvalidResponse(format!("randomness hex decode: {e}")))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| ChainError::InvalidResponse("expected 32 bytes of randomness".into()))?;
        Ok(RandomValue::new(bytes))
    }
}

/// HTTP client for fetching pulses from a beacon relay.
pub struct BeaconClient {
    /// Base URL of the relay.
    base_url: String,
    /// Reusable HTTP client.
    client: reqwest::Client,
}

impl BeaconClient {
    /// Create a client pointing at a relay URL.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn pulse_url(&self, pulse: u64) -> String {
        format!("{}/randomness/{}", self.base_url, pulse)
    }

    /// Fetch the published randomness for `pulse`.
    ///
    /// A relay that has not yet published for that pulse responds with a
    /// non-success status, surfaced as [`ChainError::RelayFetch`] — callers
    /// polling ahead of the schedule should treat that as "retry later".
    pub async fn fetch_pulse(&self, pulse: u64) -> Result<BeaconPulse, ChainError> {
        let url = self.pulse_url(pulse);
        let resp = self
            .client
            .get(&url)
            .timeout(std::time::Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| ChainError::RelayFetch(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(ChainError::RelayFetch(format!(
                "HTTP {} from {}",
                resp.status(),
                url
            )));
        }

        resp.json()
            .await
            .map_err(|e| ChainError::RelayFetch(e.to_string()))
    }

    /// Fetch `pulse` and store its value into `cache`.
    pub async fn refresh(&self, cache: &CachedBeacon, pulse: u64) -> Result<(), ChainError> {
        let fetched = self.fetch_pulse(pulse).await?;
        let value = fetched.to_random_value()?;
        tracing::debug!(pulse = fetched.pulse, "beacon pulse cached");
        cache.insert(fetched.pulse, value);
        Ok(())
    }
}

/// Thread-safe pulse cache backing the synchronous [`RandomnessBeacon`]
/// reads the protocol core performs.
#[derive(Default)]
pub struct CachedBeacon {
    values: Mutex<HashMap<u64, RandomValue>>,
}

impl CachedBeacon {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, pulse: u64, value: RandomValue) {
        self.values.lock().unwrap().insert(pulse, value);
    }
}

impl RandomnessBeacon for CachedBeacon {
    fn randomness(&self, pulse: u64) -> RandomValue {
        self.values
            .lock()
            .unwrap()
            .get(&pulse)
            .copied()
            .unwrap_or(RandomValue::ZERO)
    }
}
