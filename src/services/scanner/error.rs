//! Scanner error types.
//!
//! Every variant except [`ScannerError::Cancelled`] is a hard error: it aborts the current batch,
//! leaves the watermark untouched and sends the loop back to polling the master head.

use crate::utils::logging::error::{ErrorContext, TraceableError};
use std::collections::HashMap;
use thiserror::Error as ThisError;
use uuid::Uuid;

/// Errors raised while running a scan cycle
#[derive(ThisError, Debug)]
pub enum ScannerError {
	/// The chain-head client failed with something other than a not-applied block
	#[error("Network error: {0}")]
	NetworkError(ErrorContext),

	/// The watermark store could not be read
	#[error("Storage error: {0}")]
	StorageError(ErrorContext),

	/// The chain did not link up with the watermark
	#[error("Processing error: {0}")]
	ProcessingError(ErrorContext),

	/// The event sink refused a block
	#[error("Sink error: {0}")]
	SinkError(ErrorContext),

	/// Shutdown was requested while the cycle was suspended
	#[error("Scanner cancelled")]
	Cancelled,

	/// Other errors that don't fit into the categories above
	#[error(transparent)]
	Other(#[from] anyhow::Error),
}

impl ScannerError {
	// Network error
	pub fn network_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::NetworkError(ErrorContext::new_with_log(msg, source, metadata))
	}

	// Storage error
	pub fn storage_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::StorageError(ErrorContext::new_with_log(msg, source, metadata))
	}

	// Processing error
	pub fn processing_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::ProcessingError(ErrorContext::new_with_log(msg, source, metadata))
	}

	// Sink error
	pub fn sink_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::SinkError(ErrorContext::new_with_log(msg, source, metadata))
	}

	pub fn is_cancelled(&self) -> bool {
		matches!(self, Self::Cancelled)
	}

	/// Metric label of the stage that failed
	pub fn stage(&self) -> &'static str {
		match self {
			Self::NetworkError(_) => "network",
			Self::StorageError(_) => "storage",
			Self::ProcessingError(_) => "processing",
			Self::SinkError(_) => "sink",
			Self::Cancelled => "cancelled",
			Self::Other(_) => "other",
		}
	}
}

impl TraceableError for ScannerError {
	fn trace_id(&self) -> String {
		match self {
			Self::NetworkError(ctx) => ctx.trace_id.clone(),
			Self::StorageError(ctx) => ctx.trace_id.clone(),
			Self::ProcessingError(ctx) => ctx.trace_id.clone(),
			Self::SinkError(ctx) => ctx.trace_id.clone(),
			Self::Cancelled | Self::Other(_) => Uuid::new_v4().to_string(),
		}
	}
}
