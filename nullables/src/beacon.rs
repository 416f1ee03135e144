//! Nullable beacon — pulses publish when the test says so.

use std::collections::HashMap;
use std::sync::Mutex;
use tombola_chain::RandomnessBeacon;
use tombola_types::RandomValue;

/// A deterministic beacon for testing.
///
/// Pulses read as zero until the test publishes them.
pub struct NullBeacon {
    published: Mutex<HashMap<u64, RandomValue>>,
}

impl NullBeacon {
    pub fn new() -> Self {
        Self {
            published: Mutex::new(HashMap::new()),
        }
    }

    /// Publish a value for `pulse`.
    pub fn publish(&self, pulse: u64, value: RandomValue) {
        self.published.lock().unwrap().insert(pulse, value);
    }
}

impl Default for NullBeacon {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomnessBeacon for NullBeacon {
    fn randomness(&self, pulse: u64) -> RandomValue {
        self.published
            .lock()
            .unwrap()
            .get(&pulse)
            .copied()
            .unwrap_or(RandomValue::ZERO)
    }
}
