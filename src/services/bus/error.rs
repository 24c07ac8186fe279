//! Event bus error types.

use crate::utils::logging::error::{ErrorContext, TraceableError};
use std::collections::HashMap;
use thiserror::Error as ThisError;

/// Errors raised by the event bus
#[derive(ThisError, Debug)]
pub enum EventBusError {
	/// The dispatch worker is gone and no longer accepts events
	#[error("Event bus closed: {0}")]
	Closed(ErrorContext),

	/// A handler failed to process an event
	#[error("Handler error: {0}")]
	HandlerError(ErrorContext),
}

impl EventBusError {
	pub fn closed(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::Closed(ErrorContext::new_with_log(msg, source, metadata))
	}

	pub fn handler_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::HandlerError(ErrorContext::new_with_log(msg, source, metadata))
	}
}

impl TraceableError for EventBusError {
	fn trace_id(&self) -> String {
		match self {
			Self::Closed(ctx) => ctx.trace_id.clone(),
			Self::HandlerError(ctx) => ctx.trace_id.clone(),
		}
	}
}
