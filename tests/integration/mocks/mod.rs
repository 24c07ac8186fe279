//! Mock implementations for testing purposes.
//!
//! This module contains mock and fake implementations of the traits the scanner is wired from:
//! - Chain-head clients: a `mockall` mock and an in-memory shard chain
//! - Event sinks and watermark stores
//! - Transports for endpoint manager tests
//! - Configuration and gateway response helpers

mod transports;
#[allow(unused_imports)]
pub use chain::*;
#[allow(unused_imports)]
pub use models::*;
#[allow(unused_imports)]
pub use services::*;
#[allow(unused_imports)]
pub use transports::*;
