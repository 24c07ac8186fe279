//! Domain models and data structures for the shard scanner.
//!
//! - `blockchain`: TON block identifiers and headers
//! - `config`: Configuration loading and validation
//! - `core`: Scanner configuration
//! - `security`: Security models (Secret)

mod blockchain;
mod config;
mod core;
mod security;

// Re-export blockchain types
pub use blockchain::ton::{
	BlockHeader, BlockRef, MasterchainHead, ShardBlockInfo, MASTERCHAIN_WORKCHAIN,
};

// Re-export core types
pub use core::{RpcUrl, ScannerConfig};

// Re-export config types
pub use config::{ConfigError, ConfigLoader, DEFAULT_CONFIG_PATH};

// Re-export security types
pub use security::{SecretString, SecretValue, SecurityError, SecurityResult};
