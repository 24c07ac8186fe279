//! Chain client implementations.
//!
//! - TON client for toncenter v2 compatible JSON-RPC gateways

mod ton {
	pub mod client;
	pub mod error;
}

pub use ton::client::TonClient;
pub use ton::error::{TonClientError, NOT_APPLIED_MARKER};
