//! Scanner configuration loading and validation.
//!
//! Implements the ConfigLoader trait for [`ScannerConfig`], read from a single JSON file.

use async_trait::async_trait;
use std::{collections::HashMap, path::Path};

use crate::{
	models::{config::error::ConfigError, ConfigLoader, ScannerConfig, SecretValue},
	utils::logging::error::BoxedSource,
};

fn path_metadata(path: &Path) -> Option<HashMap<String, String>> {
	Some(HashMap::from([(
		"path".to_string(),
		path.display().to_string(),
	)]))
}

#[async_trait]
impl ConfigLoader for ScannerConfig {
	/// Resolve all secrets in the scanner configuration
	fn resolve_secrets(&self) -> Result<Self, ConfigError> {
		let mut config = self.clone();

		for rpc_url in &mut config.rpc_urls {
			let resolved_url = rpc_url.url.resolve().map_err(|e| {
				ConfigError::parse_error(
					format!("failed to resolve RPC URL: {}", e),
					Some(e as BoxedSource),
					None,
				)
			})?;
			rpc_url.url = SecretValue::Plain(resolved_url);
		}
		Ok(config)
	}

	/// Load the scanner configuration from a specific file
	async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
		if !Self::is_json_file(path) {
			return Err(ConfigError::file_error(
				"scanner config must be a .json file",
				None,
				path_metadata(path),
			));
		}

		let content = tokio::fs::read_to_string(path).await.map_err(|e| {
			ConfigError::file_error(
				format!("failed to open scanner config file: {}", e),
				Some(Box::new(e)),
				path_metadata(path),
			)
		})?;

		let config: ScannerConfig = serde_json::from_str(&content).map_err(|e| {
			ConfigError::parse_error(
				format!("failed to parse scanner config: {}", e),
				Some(Box::new(e)),
				path_metadata(path),
			)
		})?;

		// Resolve secrets before validating
		let config = config.resolve_secrets()?;
		config.validate()?;

		Ok(config)
	}

	/// Validate the scanner configuration
	///
	/// Ensures that:
	/// - The scanner has a name and a valid slug
	/// - At least one http(s) RPC URL with a weight of at most 100 is specified
	/// - Every interval is non-zero
	fn validate(&self) -> Result<(), ConfigError> {
		if self.name.trim().is_empty() {
			return Err(ConfigError::validation_error(
				"Scanner name is required",
				None,
				None,
			));
		}

		if self.slug.is_empty()
			|| !self
				.slug
				.chars()
				.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
		{
			return Err(ConfigError::validation_error(
				"Slug must contain only lowercase letters, numbers, and underscores",
				None,
				None,
			));
		}

		if self.rpc_urls.is_empty() {
			return Err(ConfigError::validation_error(
				"At least one RPC URL is required",
				None,
				None,
			));
		}

		let supported_types = ["rpc"];
		if !self
			.rpc_urls
			.iter()
			.all(|rpc_url| supported_types.contains(&rpc_url.type_.as_str()))
		{
			return Err(ConfigError::validation_error(
				format!(
					"RPC URL type must be one of: {}",
					supported_types.join(", ")
				),
				None,
				None,
			));
		}

		if !self.rpc_urls.iter().all(|rpc_url| {
			rpc_url.url.starts_with("http://") || rpc_url.url.starts_with("https://")
		}) {
			return Err(ConfigError::validation_error(
				"All RPC URLs must start with http:// or https://",
				None,
				None,
			));
		}

		if !self.rpc_urls.iter().all(|rpc_url| rpc_url.weight <= 100) {
			return Err(ConfigError::validation_error(
				"All RPC URL weights must be between 0 and 100",
				None,
				None,
			));
		}

		let intervals = [
			("master_poll_interval_ms", self.master_poll_interval_ms),
			("not_applied_backoff_ms", self.not_applied_backoff_ms),
			("error_backoff_ms", self.error_backoff_ms),
			("block_ttl_secs", self.block_ttl_secs),
		];
		if let Some((field, _)) = intervals.iter().find(|(_, value)| *value == 0) {
			return Err(ConfigError::validation_error(
				format!("{} must be greater than 0", field),
				None,
				None,
			));
		}

		if self.storage_path.trim().is_empty() {
			return Err(ConfigError::validation_error(
				"storage_path must not be empty",
				None,
				None,
			));
		}

		// Log a warning if the scanner uses an insecure protocol
		self.validate_protocol();

		Ok(())
	}

	/// Validate the safety of the protocol used by the RPC endpoints
	fn validate_protocol(&self) {
		for rpc_url in &self.rpc_urls {
			if rpc_url.url.starts_with("http://") {
				tracing::warn!(
					"Scanner '{}' uses an insecure RPC URL: {}",
					self.slug,
					rpc_url.url.as_str()
				);
			}
		}
	}
}
