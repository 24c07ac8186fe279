//! TON shard chain scanner.
//!
//! Follows a single shard of a TON workchain, discovers the shard blocks referenced by each new
//! masterchain block and replays every block between the last processed one and the newest one to
//! downstream handlers.
//!
//! # Module Structure
//!
//! - `bootstrap`: Wires configuration, client, watermark store and event pipeline together
//! - `models`: Block identifiers and headers, configuration and secrets
//! - `services`: Chain access, the scanner and the event bus
//! - `utils`: Logging, metrics, HTTP and parsing helpers

pub mod bootstrap;
pub mod models;
pub mod services;
pub mod utils;
