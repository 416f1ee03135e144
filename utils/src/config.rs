//! Deployment configuration with TOML file support.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tombola_types::{KeyHash, TokenAmount};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config error: {0}")]
    Invalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration for wiring up the RNG services.
///
/// Can be loaded from a TOML file via [`RngConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). These are deployment-time
/// defaults — the owner surface can change every value at runtime.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RngConfig {
    /// Oracle proving key, hex-encoded. Parse with [`RngConfig::key_hash`].
    #[serde(default = "default_key_hash")]
    pub key_hash: String,

    /// Oracle fee per request, in raw token units.
    #[serde(default = "default_fee")]
    pub fee: u128,

    /// Budget threshold for oracle escalation; 0 leaves escalation off.
    #[serde(default)]
    pub threshold: u128,

    /// Subscription registered with the oracle network (v2 accounting).
    #[serde(default)]
    pub subscription_id: u64,

    /// Gas limit for the oracle's fulfillment callback.
    #[serde(default = "default_callback_gas_limit")]
    pub callback_gas_limit: u32,

    /// Confirmations the oracle waits for before fulfilling.
    #[serde(default = "default_request_confirmations")]
    pub request_confirmations: u16,

    /// Random words per oracle request.
    #[serde(default = "default_num_words")]
    pub num_words: u32,

    /// First pulse block of the beacon schedule.
    #[serde(default)]
    pub start_block: u64,

    /// Blocks between beacon pulses.
    #[serde(default = "default_block_step")]
    pub block_step: u64,

    /// HTTP relay serving the beacon's published pulses.
    #[serde(default = "default_relay_url")]
    pub relay_url: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_key_hash() -> String {
    // Local development proving key.
    "0xced103054e349b8dfb51352f0f8fa9b5d20dde3d06f9f43cb2b85bc64b238205".to_string()
}

fn default_fee() -> u128 {
    1_000_000_000_000_000_000 // 1 token
}

fn default_callback_gas_limit() -> u32 {
    1_000_000
}

fn default_request_confirmations() -> u16 {
    3
}

fn default_num_words() -> u32 {
    1
}

fn default_block_step() -> u64 {
    820
}

fn default_relay_url() -> String {
    "http://127.0.0.1:8999".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl RngConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).expect("RngConfig is always serializable to TOML")
    }

    /// The configured proving key, parsed.
    pub fn key_hash(&self) -> Result<KeyHash, ConfigError> {
        self.key_hash
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("key_hash: {e}")))
    }

    pub fn fee(&self) -> TokenAmount {
        TokenAmount::new(self.fee)
    }

    pub fn threshold(&self) -> TokenAmount {
        TokenAmount::new(self.threshold)
    }
}

impl Default for RngConfig {
    fn default() -> Self {
        Self {
            key_hash: default_key_hash(),
            fee: default_fee(),
            threshold: 0,
            subscription_id: 0,
            callback_gas_limit: default_callback_gas_limit(),
            request_confirmations: default_request_confirmations(),
            num_words: default_num_words(),
            start_block: 0,
            block_step: default_block_step(),
            relay_url: default_relay_url(),
        }
    }
}
