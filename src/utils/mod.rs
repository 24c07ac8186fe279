//! Utility modules for common functionality.
//!
//! - http: retryable HTTP client creation
//! - logging: logging setup and error context plumbing
//! - metrics: Prometheus metrics and the metrics server
//! - parsing: parsing of sizes, shard ids and shard selectors
//! - tests: builders for tests

pub mod http;
pub mod logging;
pub mod metrics;
pub mod parsing;

pub use http::*;
pub use parsing::*;
