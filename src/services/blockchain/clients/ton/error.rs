//! TON client error types
//!
//! Separates the "block is not applied" condition, which callers retry, from every other gateway
//! failure.

use crate::utils::logging::error::{ErrorContext, TraceableError};
use std::collections::HashMap;
use thiserror::Error;

/// Marker the lite server puts in its message when a block is known but not yet applied
pub const NOT_APPLIED_MARKER: &str = "block is not applied";

/// TON client error type
#[derive(Debug, Error)]
pub enum TonClientError {
	/// The node has not applied the requested block yet; retrying later succeeds
	#[error("Block is not applied yet: {0}")]
	NotApplied(Box<ErrorContext>),

	/// The gateway reported an error for the call
	#[error("TON RPC request failed: {0}")]
	RpcError(Box<ErrorContext>),

	/// The response could not be decoded
	#[error("Failed to parse TON RPC response: {0}")]
	ResponseParseError(Box<ErrorContext>),

	/// The response decoded but lacks an expected field
	#[error("Unexpected response structure from TON RPC: {0}")]
	UnexpectedResponseStructure(Box<ErrorContext>),
}

impl TonClientError {
	/// Not logged on construction: the scanner retries these and logs at debug level
	pub fn not_applied(
		message: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::NotApplied(Box::new(ErrorContext::new(message, source, metadata)))
	}

	pub fn rpc_error(
		message: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::RpcError(Box::new(ErrorContext::new_with_log(
			message, source, metadata,
		)))
	}

	pub fn response_parse_error(
		message: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::ResponseParseError(Box::new(ErrorContext::new_with_log(
			message, source, metadata,
		)))
	}

	pub fn unexpected_response_structure(
		message: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::UnexpectedResponseStructure(Box::new(ErrorContext::new_with_log(
			message, source, metadata,
		)))
	}

	pub fn is_not_applied(&self) -> bool {
		matches!(self, TonClientError::NotApplied(_))
	}

	/// Whether an error chain contains a [`TonClientError::NotApplied`]
	pub fn is_not_applied_error(err: &anyhow::Error) -> bool {
		err.chain().any(|cause| {
			cause
				.downcast_ref::<TonClientError>()
				.is_some_and(TonClientError::is_not_applied)
		})
	}

	/// Whether a gateway error message reports a not-applied block
	pub fn message_is_not_applied(message: &str) -> bool {
		message.to_lowercase().contains(NOT_APPLIED_MARKER)
	}
}

impl TraceableError for TonClientError {
	fn trace_id(&self) -> String {
		match self {
			TonClientError::NotApplied(context) => context.trace_id.clone(),
			TonClientError::RpcError(context) => context.trace_id.clone(),
			TonClientError::ResponseParseError(context) => context.trace_id.clone(),
			TonClientError::UnexpectedResponseStructure(context) => context.trace_id.clone(),
		}
	}
}
