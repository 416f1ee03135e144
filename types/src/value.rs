//! 32-byte value types: block hashes, random values, and oracle key hashes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A 32-byte block hash, as retrieved from the chain's blockhash primitive.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockHash([u8; 32]);

impl BlockHash {
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Debug for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockHash({}\u{2026})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// A 32-byte random value produced by an RNG service.
///
/// `RandomValue::ZERO` is the sentinel for "not yet available" — services
/// return it from `random_number` before completion, and it is never a
/// legal completion value.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RandomValue([u8; 32]);

impl RandomValue {
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Widen a u64 into the low-order (big-endian trailing) bytes.
    ///
    /// Oracle fulfillment paths that deliver word-sized randomness use this
    /// to produce the canonical 32-byte representation.
    pub fn from_u64(word: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&word.to_be_bytes());
        Self(bytes)
    }

    /// The low-order 8 bytes interpreted as a big-endian u64.
    pub fn low_u64(&self) -> u64 {
        u64::from_be_bytes(self.0[24..].try_into().expect("8 bytes"))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl Default for RandomValue {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Debug for RandomValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RandomValue({}\u{2026})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for RandomValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// A 32-byte oracle key hash, identifying the VRF proving key (and its gas
/// lane) a request is served against.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyHash([u8; 32]);

impl KeyHash {
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Debug for KeyHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyHash({}\u{2026})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for KeyHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Error parsing a key hash from hex.
#[derive(Debug, thiserror::Error)]
#[error("invalid key hash: {0}")]
pub struct ParseKeyHashError(String);

impl FromStr for KeyHash {
    type Err = ParseKeyHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes =
            hex::decode(stripped).map_err(|e| ParseKeyHashError(format!("hex decode: {e}")))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| ParseKeyHashError("expected 32 bytes".into()))?;
        Ok(Self(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_value_u64_round_trip() {
        let value = RandomValue::from_u64(999);
        assert_eq!(value.low_u64(), 999);
        assert!(!value.is_zero());
    }

    #[test]
    fn zero_sentinel() {
        assert!(RandomValue::ZERO.is_zero());
        assert_eq!(RandomValue::from_u64(0), RandomValue::ZERO);
    }

    #[test]
    fn key_hash_parses_mainnet_style_hex() {
        let parsed: KeyHash = "0xced103054e349b8dfb51352f0f8fa9b5d20dde3d06f9f43cb2b85bc64b238205"
            .parse()
            .unwrap();
        assert!(!parsed.is_zero());
        assert_eq!(
            parsed.to_string(),
            "0xced103054e349b8dfb51352f0f8fa9b5d20dde3d06f9f43cb2b85bc64b238205"
        );
    }

    #[test]
    fn key_hash_rejects_short_input() {
        assert!("0xdead".parse::<KeyHash>().is_err());
    }
}
