use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::models::SecretValue;

fn default_workchain() -> i32 {
	0
}

fn default_master_poll_interval_ms() -> u64 {
	30_000
}

fn default_not_applied_backoff_ms() -> u64 {
	1_000
}

fn default_error_backoff_ms() -> u64 {
	1_000
}

fn default_dispatch_delay_ms() -> u64 {
	2_000
}

fn default_block_ttl_secs() -> u64 {
	600
}

fn default_storage_path() -> String {
	"data".to_string()
}

/// Configuration of one shard scanner.
///
/// Defines the RPC endpoints, the tracked shard and the pacing of the scan loop.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScannerConfig {
	/// Human-readable name of the scanner
	pub name: String,

	/// Unique identifier, used for watermark and archive file names
	pub slug: String,

	/// List of RPC endpoints with their weights
	pub rpc_urls: Vec<RpcUrl>,

	/// Workchain of the tracked shard
	#[serde(default = "default_workchain")]
	pub workchain: i32,

	/// One-byte shard prefix selecting the tracked shard
	#[serde(default)]
	pub shard_selector: u8,

	/// Sleep between masterchain polls when the head did not move
	#[serde(default = "default_master_poll_interval_ms")]
	pub master_poll_interval_ms: u64,

	/// Sleep between retries of a "block is not applied" fetch
	#[serde(default = "default_not_applied_backoff_ms")]
	pub not_applied_backoff_ms: u64,

	/// Sleep after a cycle aborted by a hard error
	#[serde(default = "default_error_backoff_ms")]
	pub error_backoff_ms: u64,

	/// Delay between emission and delivery of a block event
	#[serde(default = "default_dispatch_delay_ms")]
	pub dispatch_delay_ms: u64,

	/// Age after which a delivered block is reported as stale
	#[serde(default = "default_block_ttl_secs")]
	pub block_ttl_secs: u64,

	/// Directory for the watermark file and the block archive
	#[serde(default = "default_storage_path")]
	pub storage_path: String,

	/// Whether found blocks are appended to the block archive
	#[serde(default)]
	pub store_blocks: bool,
}

impl ScannerConfig {
	pub fn master_poll_interval(&self) -> Duration {
		Duration::from_millis(self.master_poll_interval_ms)
	}

	pub fn not_applied_backoff(&self) -> Duration {
		Duration::from_millis(self.not_applied_backoff_ms)
	}

	pub fn error_backoff(&self) -> Duration {
		Duration::from_millis(self.error_backoff_ms)
	}

	pub fn dispatch_delay(&self) -> Duration {
		Duration::from_millis(self.dispatch_delay_ms)
	}

	pub fn block_ttl(&self) -> Duration {
		Duration::from_secs(self.block_ttl_secs)
	}
}

/// RPC endpoint configuration with selection weight
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RpcUrl {
	/// Type of RPC endpoint (e.g. "rpc")
	pub type_: String,

	/// URL of the JSON-RPC endpoint (can be a secret value)
	pub url: SecretValue,

	/// Selection weight (0-100), higher is tried first
	pub weight: u32,
}
