//! Deferred event dispatch.
//!
//! [`EventBus`] is the scanner's event sink. Emitting only enqueues the event on an unbounded
//! channel; a separate [`DispatchWorker`] waits until each event is `dispatch_delay` old and then
//! hands it to every handler subscribed to its topic, in emission order.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::{
	channel::mpsc::{self, UnboundedReceiver, UnboundedSender},
	StreamExt,
};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::{
	sync::watch,
	task::JoinHandle,
	time::Instant,
};
use uuid::Uuid;

use crate::{
	models::BlockHeader,
	services::{
		bus::error::EventBusError,
		scanner::{cancellable, wait_for_shutdown},
	},
	utils::metrics::{EVENTS_DISPATCHED, HANDLER_FAILURES},
};

/// Topic of events announcing a shard block found by the scanner
pub const BLOCK_FOUND_TOPIC: &str = "block.found";

/// Accepts discovered blocks for downstream consumption
///
/// Must not block longer than it takes to enqueue the block.
#[cfg_attr(test, mockall::automock)]
pub trait EventSink: Send + Sync {
	fn emit_block_found(&self, header: BlockHeader) -> Result<(), EventBusError>;
}

/// Event delivered to handlers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlockEvent {
	pub id: Uuid,
	pub topic: String,
	pub header: BlockHeader,
	pub emitted_at: DateTime<Utc>,
}

impl BlockEvent {
	pub fn block_found(header: BlockHeader) -> Self {
		Self {
			id: Uuid::new_v4(),
			topic: BLOCK_FOUND_TOPIC.to_string(),
			header,
			emitted_at: Utc::now(),
		}
	}
}

/// Consumer of bus events
#[async_trait]
pub trait BlockHandler: Send + Sync {
	/// Name used in logs and metrics
	fn name(&self) -> &str;

	async fn handle(&self, event: &BlockEvent) -> Result<(), anyhow::Error>;
}

struct QueuedEvent {
	event: BlockEvent,
	due: Instant,
}

/// Sending half of the bus
#[derive(Clone)]
pub struct EventBus {
	sender: UnboundedSender<QueuedEvent>,
	dispatch_delay: Duration,
}

impl EventBus {
	/// Creates a bus and the worker that drains it
	pub fn new(dispatch_delay: Duration) -> (Self, DispatchWorker) {
		let (sender, receiver) = mpsc::unbounded();
		(
			Self {
				sender,
				dispatch_delay,
			},
			DispatchWorker {
				receiver,
				handlers: HashMap::new(),
			},
		)
	}

	/// Enqueues an event for dispatch after the configured delay
	pub fn publish(&self, event: BlockEvent) -> Result<(), EventBusError> {
		let queued = QueuedEvent {
			event,
			due: Instant::now() + self.dispatch_delay,
		};
		self.sender.unbounded_send(queued).map_err(|e| {
			EventBusError::closed(
				format!(
					"Dispatch worker stopped, dropping event for block {}",
					e.into_inner().event.header.id
				),
				None,
				None,
			)
		})
	}

	pub fn is_closed(&self) -> bool {
		self.sender.is_closed()
	}
}

impl EventSink for EventBus {
	fn emit_block_found(&self, header: BlockHeader) -> Result<(), EventBusError> {
		self.publish(BlockEvent::block_found(header))
	}
}

/// Receiving half of the bus
pub struct DispatchWorker {
	receiver: UnboundedReceiver<QueuedEvent>,
	handlers: HashMap<String, Vec<Arc<dyn BlockHandler>>>,
}

impl DispatchWorker {
	/// Registers `handler` for events on `topic`
	pub fn subscribe(&mut self, topic: &str, handler: Arc<dyn BlockHandler>) {
		self.handlers
			.entry(topic.to_string())
			.or_default()
			.push(handler);
	}

	pub fn handler_count(&self, topic: &str) -> usize {
		self.handlers.get(topic).map_or(0, Vec::len)
	}

	/// Dispatches events until shutdown or until every sender is dropped.
	///
	/// Returns the number of dispatched events. Events still queued at shutdown are dropped.
	pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> usize {
		let mut dispatched = 0;

		loop {
			let next = tokio::select! {
				biased;
				_ = wait_for_shutdown(&mut shutdown) => break,
				next = self.receiver.next() => next,
			};

			let Some(queued) = next else {
				tracing::debug!("All event senders dropped, stopping dispatch worker");
				return dispatched;
			};

			if cancellable(tokio::time::sleep_until(queued.due), &mut shutdown)
				.await
				.is_none()
			{
				self.drop_pending(1);
				return dispatched;
			}

			self.dispatch(&queued.event).await;
			dispatched += 1;
		}

		self.drop_pending(0);
		dispatched
	}

	/// Runs the worker on its own task
	pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<usize> {
		tokio::spawn(self.run(shutdown))
	}

	fn drop_pending(&mut self, in_flight: usize) {
		self.receiver.close();
		let mut dropped = in_flight;
		while self.receiver.try_recv().is_ok() {
			dropped += 1;
		}
		if dropped > 0 {
			tracing::warn!("Shutting down with {} undelivered block events", dropped);
		}
	}

	async fn dispatch(&self, event: &BlockEvent) {
		let Some(handlers) = self.handlers.get(&event.topic) else {
			tracing::debug!("No handlers for topic {}", event.topic);
			return;
		};

		for handler in handlers {
			if let Err(e) = handler.handle(event).await {
				HANDLER_FAILURES.with_label_values(&[handler.name()]).inc();
				EventBusError::handler_error(
					format!(
						"Handler '{}' failed for block {}",
						handler.name(),
						event.header.id
					),
					Some(e.into()),
					Some(HashMap::from([(
						"event_id".to_string(),
						event.id.to_string(),
					)])),
				);
			}
		}
		EVENTS_DISPATCHED.with_label_values(&[&event.topic]).inc();
	}
}
