//! Core domain models for the shard scanner.
//!
//! - Scanner: which shard to track, where to read the chain from and how to pace the loop

mod scanner;

pub use scanner::{RpcUrl, ScannerConfig};
