//! Chain access for the scanner.
//!
//! - [`ChainHeadClient`], the read interface the scanner depends on
//! - [`TonClient`], its JSON-RPC implementation
//! - HTTP transports with weighted endpoint selection, rotation and sticky pinning

mod client;
mod clients;
mod transports;

pub use client::ChainHeadClient;
#[cfg(test)]
pub use client::MockChainHeadClient;
pub use clients::{TonClient, TonClientError, NOT_APPLIED_MARKER};
pub use transports::{
	BlockchainTransport, EndpointManager, HttpTransportClient, RotatingTransport,
	TonTransportClient, TransientErrorRetryStrategy, TransportError, TON_TEST_CONNECTION_PAYLOAD,
};
