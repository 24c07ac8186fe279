use proptest::{prelude::*, test_runner::Config};
use ton_shard_scanner::models::{BlockHeader, BlockRef};

use crate::properties::strategies::{
	block_header_strategy, block_ref_strategy, deep_shard_strategy, hash_strategy,
};

proptest! {
	#![proptest_config(Config {
		failure_persistence: None,
		..Config::default()
	})]

	/// Headers survive the JSON form used for archives and events, hashes included
	#[test]
	fn test_header_json_keeps_every_field(header in block_header_strategy()) {
		let json = serde_json::to_string(&header).unwrap();
		let decoded: BlockHeader = serde_json::from_str(&json).unwrap();

		prop_assert_eq!(&decoded, &header);
		prop_assert_eq!(decoded.id.shard, header.id.shard);
		prop_assert_eq!(
			decoded.parent.as_ref().map(|parent| parent.shard),
			header.parent.as_ref().map(|parent| parent.shard)
		);
		prop_assert_eq!(&decoded.id.root_hash, &header.id.root_hash);
		prop_assert_eq!(&decoded.id.file_hash, &header.id.file_hash);
		prop_assert_eq!(decoded.start_lt, header.start_lt);
		prop_assert_eq!(decoded.end_lt, header.end_lt);
	}

	/// Identity is shard and seqno; hashes never affect equality
	#[test]
	fn test_equality_ignores_hashes(
		block in block_ref_strategy(),
		root_hash in hash_strategy(),
		file_hash in hash_strategy(),
	) {
		let rehashed = BlockRef::new(block.workchain, block.shard, block.seqno, root_hash, file_hash);
		prop_assert_eq!(&rehashed, &block);

		let next = BlockRef::new(
			block.workchain,
			block.shard,
			block.seqno.wrapping_add(1),
			block.root_hash.clone(),
			block.file_hash.clone(),
		);
		prop_assert_ne!(&next, &block);
	}

	/// The shard id is written as a decimal string, the way gateways send it
	#[test]
	fn test_shard_written_as_decimal(block in block_ref_strategy()) {
		let value = serde_json::to_value(&block).unwrap();
		let shard = block.shard.to_string();
		prop_assert_eq!(value["shard"].as_str(), Some(shard.as_str()));
	}

	/// Deep shards keep their prefix length through JSON, so they are never mistaken for a
	/// shard a selector can track
	#[test]
	fn test_deep_shard_keeps_prefix_length(shard in deep_shard_strategy(), seqno in any::<u32>()) {
		let block = BlockRef::new(0, shard as i64, seqno, "r", "f");
		let decoded: BlockRef =
			serde_json::from_str(&serde_json::to_string(&block).unwrap()).unwrap();

		prop_assert_eq!(decoded.shard, block.shard);
		prop_assert_eq!(decoded.shard_bits().trailing_zeros(), shard.trailing_zeros());
	}
}
