//! Block source — the chain's view of block numbers and hashes.

use tombola_types::BlockHash;

/// How many blocks back a block's hash remains retrievable.
///
/// Mirrors the chain primitive: the hash of block `n` becomes available
/// once block `n + 1` is mined and unrecoverable once the chain has
/// advanced more than 256 blocks past `n`.
pub const BLOCKHASH_WINDOW: u64 = 256;

/// Read access to the chain's block state.
pub trait BlockSource: Send + Sync {
    /// The current (latest mined) block number.
    fn block_number(&self) -> u64;

    /// The hash of block `number`, or `None` when it falls outside the
    /// retrieval window: only blocks strictly older than the current block
    /// and at most [`BLOCKHASH_WINDOW`] behind it have retrievable hashes.
    fn block_hash(&self, number: u64) -> Option<BlockHash>;

    /// Whether block `number`'s hash is currently retrievable.
    fn is_hash_available(&self, number: u64) -> bool {
        let current = self.block_number();
        number < current && current - number <= BLOCKHASH_WINDOW
    }
}
