//! TON block data structures.
//!
//! Field names follow the `ton.blockIdExt` and `blocks.header` objects returned by toncenter v2
//! compatible JSON-RPC gateways, so values can be decoded straight from RPC results.

mod block;

pub use block::{BlockHeader, BlockRef, MasterchainHead, ShardBlockInfo, MASTERCHAIN_WORKCHAIN};
