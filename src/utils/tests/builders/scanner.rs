//! Test helper utilities for scanner configuration
//!
//! - `ScannerConfigBuilder`: Builder for creating test ScannerConfig instances

use crate::models::{RpcUrl, ScannerConfig, SecretString, SecretValue};

/// Builder for creating test ScannerConfig instances
pub struct ScannerConfigBuilder {
	config: ScannerConfig,
}

impl Default for ScannerConfigBuilder {
	fn default() -> Self {
		Self {
			config: ScannerConfig {
				name: "Test Scanner".to_string(),
				slug: "test_scanner".to_string(),
				rpc_urls: vec![rpc_url("https://toncenter.test/api/v2/jsonRPC", 100)],
				workchain: 0,
				shard_selector: 0,
				master_poll_interval_ms: 30_000,
				not_applied_backoff_ms: 1_000,
				error_backoff_ms: 1_000,
				dispatch_delay_ms: 2_000,
				block_ttl_secs: 600,
				storage_path: "data".to_string(),
				store_blocks: false,
			},
		}
	}
}

fn rpc_url(url: &str, weight: u32) -> RpcUrl {
	RpcUrl {
		type_: "rpc".to_string(),
		url: SecretValue::Plain(SecretString::new(url.to_string())),
		weight,
	}
}

impl ScannerConfigBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn name(mut self, name: &str) -> Self {
		self.config.name = name.to_string();
		self
	}

	pub fn slug(mut self, slug: &str) -> Self {
		self.config.slug = slug.to_string();
		self
	}

	pub fn rpc_url(mut self, url: &str) -> Self {
		self.config.rpc_urls = vec![rpc_url(url, 100)];
		self
	}

	pub fn rpc_url_with_weight(mut self, url: &str, weight: u32) -> Self {
		self.config.rpc_urls = vec![rpc_url(url, weight)];
		self
	}

	pub fn add_rpc_url(mut self, url: &str, weight: u32) -> Self {
		self.config.rpc_urls.push(rpc_url(url, weight));
		self
	}

	pub fn rpc_urls(mut self, urls: Vec<RpcUrl>) -> Self {
		self.config.rpc_urls = urls;
		self
	}

	pub fn shard_selector(mut self, selector: u8) -> Self {
		self.config.shard_selector = selector;
		self
	}

	pub fn master_poll_interval_ms(mut self, ms: u64) -> Self {
		self.config.master_poll_interval_ms = ms;
		self
	}

	pub fn not_applied_backoff_ms(mut self, ms: u64) -> Self {
		self.config.not_applied_backoff_ms = ms;
		self
	}

	pub fn error_backoff_ms(mut self, ms: u64) -> Self {
		self.config.error_backoff_ms = ms;
		self
	}

	pub fn dispatch_delay_ms(mut self, ms: u64) -> Self {
		self.config.dispatch_delay_ms = ms;
		self
	}

	pub fn storage_path(mut self, path: &str) -> Self {
		self.config.storage_path = path.to_string();
		self
	}

	pub fn store_blocks(mut self, store: bool) -> Self {
		self.config.store_blocks = store;
		self
	}

	pub fn build(self) -> ScannerConfig {
		self.config
	}
}
