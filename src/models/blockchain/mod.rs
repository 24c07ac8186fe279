//! Blockchain-specific model implementations.
//!
//! The scanner tracks TON shard chains; the `ton` submodule holds the block identifiers and headers
//! exchanged between the chain-head client, the scanner and the event sink.

pub mod ton;
