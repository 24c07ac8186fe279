//! Shard prefix matching.
//!
//! A shard id is a 64-bit prefix code: the lowest set bit is a separator and the bits above it
//! form the prefix. `0x8000_0000_0000_0000` is the whole workchain, `0x4000_0000_0000_0000` and
//! `0xC000_0000_0000_0000` are its two halves.

use crate::models::BlockRef;

/// Longest prefix a one-byte selector can decide
pub const MAX_SELECTOR_PREFIX_LEN: u32 = 8;

/// Whether the shard `shard_id` contains the shard selected by the top byte `selector`.
///
/// True when the shard prefix is an ancestor of, or equal to, the selector byte. Shards split
/// deeper than one byte are rejected, as is the invalid id `0`.
pub fn is_in_shard(shard_id: u64, selector: u8) -> bool {
	if shard_id == 0 {
		return false;
	}

	let prefix_len = 63 - shard_id.trailing_zeros();
	if prefix_len > MAX_SELECTOR_PREFIX_LEN {
		return false;
	}

	let diff = ((selector as u64) << 56) ^ shard_id;
	diff.leading_zeros() >= prefix_len
}

/// Returns the first candidate that belongs to the tracked shard.
///
/// `None` is a legitimate outcome at split and merge boundaries, not an error.
pub fn select_shard_block<'a, I>(candidates: I, selector: u8) -> Option<BlockRef>
where
	I: IntoIterator<Item = &'a BlockRef>,
{
	candidates
		.into_iter()
		.find(|block| is_in_shard(block.shard_bits(), selector))
		.cloned()
}
