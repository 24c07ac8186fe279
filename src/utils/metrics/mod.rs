//! Metrics module for the application.
//!
//! - This module contains the global Prometheus registry.
//! - Defines the scanner, dispatch and persistence metrics.

pub mod server;
use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

lazy_static! {
	/// Global Prometheus registry.
	///
	/// This registry holds all metrics defined in this module and is used
	/// to gather metrics for exposure via the metrics endpoint.
	pub static ref REGISTRY: Registry = Registry::new();

	/// Sequence number of the current shard watermark.
	pub static ref WATERMARK_SEQNO: IntGauge = {
		let gauge = IntGauge::new("scanner_watermark_seqno", "Seqno of the last fully processed shard block").unwrap();
		REGISTRY.register(Box::new(gauge.clone())).unwrap();
		gauge
	};

	/// Sequence number of the last observed masterchain head.
	pub static ref MASTER_SEQNO: IntGauge = {
		let gauge = IntGauge::new("scanner_master_seqno", "Seqno of the last observed masterchain block").unwrap();
		REGISTRY.register(Box::new(gauge.clone())).unwrap();
		gauge
	};

	/// Shard blocks handed to the event sink, re-emissions included.
	pub static ref BLOCKS_EMITTED: IntCounter = {
		let counter = IntCounter::new("scanner_blocks_emitted_total", "Shard blocks emitted to the event sink").unwrap();
		REGISTRY.register(Box::new(counter.clone())).unwrap();
		counter
	};

	/// Shard blocks emitted more than once (after an aborted batch).
	pub static ref BLOCKS_REEMITTED: IntCounter = {
		let counter = IntCounter::new("scanner_blocks_reemitted_total", "Shard blocks emitted again after an aborted batch").unwrap();
		REGISTRY.register(Box::new(counter.clone())).unwrap();
		counter
	};

	/// Catch-up batches that advanced the watermark.
	pub static ref BATCHES_COMPLETED: IntCounter = {
		let counter = IntCounter::new("scanner_batches_completed_total", "Catch-up batches completed").unwrap();
		REGISTRY.register(Box::new(counter.clone())).unwrap();
		counter
	};

	/// Cycles aborted by a hard error, labelled by stage.
	pub static ref BATCH_FAILURES: IntCounterVec = {
		let counter = IntCounterVec::new(
			Opts::new("scanner_batch_failures_total", "Scan cycles aborted by a hard error"),
			&["stage"]
		).unwrap();
		REGISTRY.register(Box::new(counter.clone())).unwrap();
		counter
	};

	/// Retries caused by "block is not applied" answers.
	pub static ref NOT_APPLIED_RETRIES: IntCounter = {
		let counter = IntCounter::new("scanner_not_applied_retries_total", "Fetches retried because the block was not applied yet").unwrap();
		REGISTRY.register(Box::new(counter.clone())).unwrap();
		counter
	};

	/// Watermark writes that failed after a completed batch.
	pub static ref WATERMARK_SAVE_FAILURES: IntCounter = {
		let counter = IntCounter::new("scanner_watermark_save_failures_total", "Failed watermark writes").unwrap();
		REGISTRY.register(Box::new(counter.clone())).unwrap();
		counter
	};

	/// Events delivered to handlers, labelled by topic.
	pub static ref EVENTS_DISPATCHED: IntCounterVec = {
		let counter = IntCounterVec::new(
			Opts::new("bus_events_dispatched_total", "Events delivered to handlers"),
			&["topic"]
		).unwrap();
		REGISTRY.register(Box::new(counter.clone())).unwrap();
		counter
	};

	/// Handler invocations that returned an error, labelled by handler.
	pub static ref HANDLER_FAILURES: IntCounterVec = {
		let counter = IntCounterVec::new(
			Opts::new("bus_handler_failures_total", "Handler invocations that failed"),
			&["handler"]
		).unwrap();
		REGISTRY.register(Box::new(counter.clone())).unwrap();
		counter
	};
}

/// Gather all metrics and encode into the provided format.
pub fn gather_metrics() -> Result<Vec<u8>, Box<dyn std::error::Error>> {
	let encoder = TextEncoder::new();
	let metric_families = REGISTRY.gather();
	let mut buffer = Vec::new();
	encoder.encode(&metric_families, &mut buffer)?;
	Ok(buffer)
}

/// Records the watermark after a completed batch.
pub fn record_watermark(seqno: u32) {
	WATERMARK_SEQNO.set(i64::from(seqno));
}

/// Records a newly observed masterchain head.
pub fn record_master_head(seqno: u32) {
	MASTER_SEQNO.set(i64::from(seqno));
}

/// Records a cycle aborted at `stage`.
pub fn record_batch_failure(stage: &str) {
	BATCH_FAILURES.with_label_values(&[stage]).inc();
}
