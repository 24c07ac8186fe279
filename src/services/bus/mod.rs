//! Event bus between the scanner and downstream consumers.
//!
//! - [`EventSink`], the interface the scanner emits through
//! - [`EventBus`] and its [`DispatchWorker`], which deliver events after a fixed delay
//! - Built-in handlers for logging and archiving found blocks

mod dispatcher;
mod error;
mod handlers;

pub use dispatcher::{
	BlockEvent, BlockHandler, DispatchWorker, EventBus, EventSink, BLOCK_FOUND_TOPIC,
};
pub use error::EventBusError;
pub use handlers::{BlockArchiveHandler, LoggingBlockHandler};

#[cfg(test)]
pub use dispatcher::MockEventSink;
