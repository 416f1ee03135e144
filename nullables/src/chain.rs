//! Nullable block source — a chain whose height only advances when told to.

use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, Ordering};
use tombola_chain::{BlockSource, BLOCKHASH_WINDOW};
use tombola_types::BlockHash;

/// A deterministic block source for testing.
///
/// Block hashes are derived from the block number, so the same chain state
/// always yields the same randomness. The blockhash retrieval window is
/// enforced exactly as on a real chain.
pub struct NullChain {
    current: AtomicU64,
}

impl NullChain {
    pub fn new(initial_block: u64) -> Self {
        Self {
            current: AtomicU64::new(initial_block),
        }
    }

    /// Mine `count` blocks.
    pub fn advance(&self, count: u64) {
        self.current.fetch_add(count, Ordering::SeqCst);
    }

    /// Jump to a specific block number.
    pub fn set_block(&self, number: u64) {
        self.current.store(number, Ordering::SeqCst);
    }
}

impl BlockSource for NullChain {
    fn block_number(&self) -> u64 {
        self.current.load(Ordering::SeqCst)
    }

    fn block_hash(&self, number: u64) -> Option<BlockHash> {
        let current = self.block_number();
        if number >= current || current - number > BLOCKHASH_WINDOW {
            return None;
        }
        let digest = Sha256::digest(number.to_be_bytes());
        Some(BlockHash::new(digest.into()))
    }
}
