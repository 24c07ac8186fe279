use proptest::{prelude::*, test_runner::Config};
use ton_shard_scanner::{
	models::BlockRef,
	services::scanner::{is_in_shard, select_shard_block},
};

use crate::properties::strategies::{
	deep_shard_strategy, selectable_shard_strategy, shard_partition_strategy,
};

proptest! {
	#![proptest_config(Config {
		failure_persistence: None,
		..Config::default()
	})]

	/// A shard at prefix depth `len` owns exactly `256 >> len` selector bytes
	#[test]
	fn test_shard_owns_selector_range((shard, len) in selectable_shard_strategy()) {
		let matching = (0..=u8::MAX).filter(|selector| is_in_shard(shard, *selector)).count();
		prop_assert_eq!(matching, 256usize >> len);
	}

	/// Owned selectors agree with the shard on the prefix bits
	#[test]
	fn test_matching_selector_shares_prefix(
		(shard, len) in selectable_shard_strategy(),
		selector in any::<u8>(),
	) {
		let top = (shard >> 56) as u8;
		let mask = if len == 0 { 0 } else { u8::MAX << (8 - len) };
		prop_assert_eq!(is_in_shard(shard, selector), (top & mask) == (selector & mask));
	}

	/// Every selector lands in exactly one shard of a complete partition
	#[test]
	fn test_partition_has_single_owner(shards in shard_partition_strategy(), selector in any::<u8>()) {
		let owners = shards.iter().filter(|shard| is_in_shard(**shard, selector)).count();
		prop_assert_eq!(owners, 1);

		let candidates: Vec<BlockRef> = shards
			.iter()
			.enumerate()
			.map(|(i, shard)| BlockRef::new(0, *shard as i64, i as u32, "r", "f"))
			.collect();
		let selected = select_shard_block(&candidates, selector);
		prop_assert!(selected.is_some());
		prop_assert!(is_in_shard(selected.unwrap().shard_bits(), selector));
	}

	/// Shards split deeper than one byte are never tracked
	#[test]
	fn test_deep_shards_never_match(shard in deep_shard_strategy(), selector in any::<u8>()) {
		prop_assert!(!is_in_shard(shard, selector));
	}

	#[test]
	fn test_zero_shard_never_matches(selector in any::<u8>()) {
		prop_assert!(!is_in_shard(0, selector));
	}

	/// Selection returns the first owning candidate, regardless of what follows it
	#[test]
	fn test_selection_prefers_first_candidate(
		shards in shard_partition_strategy(),
		selector in any::<u8>(),
	) {
		let mut candidates: Vec<BlockRef> = shards
			.iter()
			.map(|shard| BlockRef::new(0, *shard as i64, 1, "r", "f"))
			.collect();
		candidates.push(BlockRef::new(0, i64::MIN, 2, "r", "f"));

		let selected = select_shard_block(&candidates, selector).unwrap();
		prop_assert_eq!(selected.seqno, 1);
	}
}
