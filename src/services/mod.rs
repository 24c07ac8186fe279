//! Core services.
//!
//! - `blockchain`: chain-head client interface, TON client and HTTP transports
//! - `bus`: event sink and deferred dispatch to block handlers
//! - `scanner`: shard matching, watermark storage and the catch-up walk

pub mod blockchain;
pub mod bus;
pub mod scanner;
