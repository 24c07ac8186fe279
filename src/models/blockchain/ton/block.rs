//! TON block identifiers and headers.
//!
//! Note: these structures mirror `ton.blockIdExt` and the `blocks.header` result of
//! `getBlockHeader` from the toncenter v2 API:
//! <https://toncenter.com/api/v2/>

use std::{
	fmt,
	hash::{Hash, Hasher},
	time::Duration,
};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::utils::parsing::format_shard_id;

/// Workchain id of the masterchain
pub const MASTERCHAIN_WORKCHAIN: i32 = -1;

/// Identifies a block: workchain, shard prefix, sequence number and the two content hashes.
///
/// Two references are equal when shard and seqno match. Hashes are carried for downstream
/// consumers only.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BlockRef {
	/// Workchain id (`-1` for the masterchain, `0` for the basechain)
	pub workchain: i32,

	/// Shard identifier; the trailing zero run encodes the prefix length
	#[serde(with = "wire::shard")]
	pub shard: i64,

	/// Sequence number, monotonic within a shard
	pub seqno: u32,

	/// Base64 root hash
	pub root_hash: String,

	/// Base64 file hash
	pub file_hash: String,
}

impl BlockRef {
	pub fn new(
		workchain: i32,
		shard: i64,
		seqno: u32,
		root_hash: impl Into<String>,
		file_hash: impl Into<String>,
	) -> Self {
		Self {
			workchain,
			shard,
			seqno,
			root_hash: root_hash.into(),
			file_hash: file_hash.into(),
		}
	}

	/// Shard identifier as an unsigned bit pattern, the form the prefix matcher works on
	pub fn shard_bits(&self) -> u64 {
		self.shard as u64
	}

	pub fn is_masterchain(&self) -> bool {
		self.workchain == MASTERCHAIN_WORKCHAIN
	}
}

impl PartialEq for BlockRef {
	fn eq(&self, other: &Self) -> bool {
		self.shard == other.shard && self.seqno == other.seqno
	}
}

impl Eq for BlockRef {}

impl Hash for BlockRef {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.shard.hash(state);
		self.seqno.hash(state);
	}
}

impl fmt::Display for BlockRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"({},{},{})",
			self.workchain,
			format_shard_id(self.shard),
			self.seqno
		)
	}
}

/// Header of a block in the tracked shard.
///
/// Only the parent inside the tracked shard is kept; other parent candidates from splits and
/// merges are dropped when the header is built.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlockHeader {
	pub id: BlockRef,

	/// Generation time, unix seconds
	pub gen_utime: u32,

	/// Logical time interval `[start_lt, end_lt)`
	#[serde(with = "wire::lt")]
	pub start_lt: u64,
	#[serde(with = "wire::lt")]
	pub end_lt: u64,

	/// Parent in the tracked shard, `None` when no parent candidate belongs to it
	#[serde(default)]
	pub parent: Option<BlockRef>,
}

impl BlockHeader {
	pub fn seqno(&self) -> u32 {
		self.id.seqno
	}

	/// Age of the block relative to now, zero for timestamps in the future
	pub fn age(&self) -> Duration {
		let now = Utc::now().timestamp();
		Duration::from_secs(now.saturating_sub(i64::from(self.gen_utime)).max(0) as u64)
	}

	/// Whether the block was generated more than `ttl` ago
	pub fn is_expired(&self, ttl: Duration) -> bool {
		self.age() > ttl
	}
}

/// Current masterchain head, compared by seqno to detect new master blocks
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MasterchainHead {
	pub block: BlockRef,
}

impl MasterchainHead {
	pub fn new(block: BlockRef) -> Self {
		Self { block }
	}

	pub fn seqno(&self) -> u32 {
		self.block.seqno
	}
}

impl From<BlockRef> for MasterchainHead {
	fn from(block: BlockRef) -> Self {
		Self::new(block)
	}
}

/// Header data as returned by `getBlockHeader`, with every parent candidate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShardBlockInfo {
	pub id: BlockRef,

	pub gen_utime: u32,

	#[serde(with = "wire::lt")]
	pub start_lt: u64,
	#[serde(with = "wire::lt")]
	pub end_lt: u64,

	/// Parent candidates: one for a plain block, two after a merge
	#[serde(rename = "prev_blocks", default)]
	pub parents: Vec<BlockRef>,
}

impl ShardBlockInfo {
	/// Converts into a [`BlockHeader`] keeping only `parent`.
	pub fn into_header(self, parent: Option<BlockRef>) -> BlockHeader {
		BlockHeader {
			id: self.id,
			gen_utime: self.gen_utime,
			start_lt: self.start_lt,
			end_lt: self.end_lt,
			parent,
		}
	}
}

/// Serde adapters for integers that gateways send as decimal strings.
mod wire {
	use serde::{de, Deserialize, Deserializer};

	#[derive(Deserialize)]
	#[serde(untagged)]
	enum StringOrNumber {
		String(String),
		Signed(i64),
		Unsigned(u64),
	}

	pub mod shard {
		use super::*;
		use crate::utils::parsing::parse_shard_id;
		use serde::Serializer;

		pub fn serialize<S: Serializer>(value: &i64, serializer: S) -> Result<S::Ok, S::Error> {
			serializer.serialize_str(&value.to_string())
		}

		pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
			match StringOrNumber::deserialize(deserializer)? {
				StringOrNumber::String(s) => parse_shard_id(&s).map_err(de::Error::custom),
				StringOrNumber::Signed(n) => Ok(n),
				// Unsigned bit pattern above i64::MAX
				StringOrNumber::Unsigned(n) => Ok(n as i64),
			}
		}
	}

	pub mod lt {
		use super::*;
		use serde::Serializer;

		pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
			serializer.serialize_str(&value.to_string())
		}

		pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
			match StringOrNumber::deserialize(deserializer)? {
				StringOrNumber::String(s) => s
					.trim()
					.parse::<u64>()
					.map_err(|e| de::Error::custom(format!("invalid logical time '{}': {}", s, e))),
				StringOrNumber::Signed(n) => u64::try_from(n)
					.map_err(|_| de::Error::custom(format!("negative logical time {}", n))),
				StringOrNumber::Unsigned(n) => Ok(n),
			}
		}
	}
}
