//! 20-byte account address type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A 20-byte account address, displayed as `0x`-prefixed hex.
///
/// Identifies callers, token contracts, oracle contracts, and the RNG
/// services themselves. The all-zero address is reserved as "no address".
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address([u8; 20]);

impl Address {
    pub const ZERO: Self = Self([0u8; 20]);

    pub fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Deterministic address from a label — convenient for tests and
    /// fixtures, where textual names stand in for real accounts.
    pub fn from_label(label: &str) -> Self {
        let mut bytes = [0u8; 20];
        let src = label.as_bytes();
        let len = src.len().min(20);
        bytes[..len].copy_from_slice(&src[..len]);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl Default for Address {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address(0x{}\u{2026})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Error parsing an address from hex.
#[derive(Debug, thiserror::Error)]
#[error("invalid address: {0}")]
pub struct ParseAddressError(String);

impl FromStr for Address {
    type Err = ParseAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes =
            hex::decode(stripped).map_err(|e| ParseAddressError(format!("hex decode: {e}")))?;
        let bytes: [u8; 20] = bytes
            .try_into()
            .map_err(|_| ParseAddressError("expected 20 bytes".into()))?;
        Ok(Self(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_address_is_zero() {
        assert!(Address::ZERO.is_zero());
        assert!(!Address::from_label("alice").is_zero());
    }

    #[test]
    fn display_and_parse_round_trip() {
        let addr = Address::from_label("alice");
        let parsed: Address = addr.to_string().parse().unwrap();
        assert_eq!(parsed, addr);
    }

    #[test]
    fn parse_rejects_wrong_length() {
        assert!("0xabcd".parse::<Address>().is_err());
    }

    #[test]
    fn parse_rejects_non_hex() {
        assert!("0xzz".repeat(10).parse::<Address>().is_err());
    }
}
