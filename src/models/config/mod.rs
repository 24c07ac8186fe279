//! Configuration loading and validation.
//!
//! This module provides the trait for loading and validating the scanner configuration file.

#![allow(clippy::result_large_err)]

use async_trait::async_trait;
use std::path::Path;

mod error;
mod scanner_config;

pub use error::ConfigError;

/// Default location of the scanner configuration
pub const DEFAULT_CONFIG_PATH: &str = "config/scanner.json";

/// Common interface for loading configuration files
#[async_trait]
pub trait ConfigLoader: Sized {
	/// Load configuration from a specific file path
	///
	/// Secrets are resolved and the result validated before it is returned.
	async fn load_from_path(path: &Path) -> Result<Self, ConfigError>;

	/// Validate the configuration
	fn validate(&self) -> Result<(), ConfigError>;

	/// Validate safety of the protocol
	///
	/// Logs a warning for insecure endpoints.
	fn validate_protocol(&self);

	/// Check if a file is a JSON file based on extension
	fn is_json_file(path: &Path) -> bool {
		path.extension()
			.map(|ext| ext.to_string_lossy().to_lowercase() == "json")
			.unwrap_or(false)
	}

	/// Resolve all secrets in the configuration
	fn resolve_secrets(&self) -> Result<Self, ConfigError>;
}
