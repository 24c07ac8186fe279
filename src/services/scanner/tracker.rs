//! Emission history for the scanner.
//!
//! Batches that abort after emitting some blocks are replayed in full on the next cycle, so
//! consumers see those blocks twice. The [`EmissionTracker`] remembers the most recently emitted
//! blocks and reports such re-emissions so they show up in logs and metrics.

use std::collections::{HashSet, VecDeque};

use crate::{models::BlockRef, utils::metrics::BLOCKS_REEMITTED};

/// Default number of emitted blocks remembered
pub const DEFAULT_HISTORY_SIZE: usize = 1024;

/// Bounded history of emitted block references
#[derive(Debug, Clone)]
pub struct EmissionTracker {
	history: VecDeque<BlockRef>,
	seen: HashSet<BlockRef>,
	history_size: usize,
	reemitted: u64,
}

impl Default for EmissionTracker {
	fn default() -> Self {
		Self::new(DEFAULT_HISTORY_SIZE)
	}
}

impl EmissionTracker {
	pub fn new(history_size: usize) -> Self {
		Self {
			history: VecDeque::with_capacity(history_size),
			seen: HashSet::with_capacity(history_size),
			history_size: history_size.max(1),
			reemitted: 0,
		}
	}

	/// Records an emitted block. Returns `true` if it was emitted before.
	pub fn record(&mut self, block: &BlockRef) -> bool {
		if self.seen.contains(block) {
			self.reemitted += 1;
			BLOCKS_REEMITTED.inc();
			tracing::debug!("Re-emitting block {}", block);
			return true;
		}

		if self.history.len() == self.history_size {
			if let Some(evicted) = self.history.pop_front() {
				self.seen.remove(&evicted);
			}
		}
		self.history.push_back(block.clone());
		self.seen.insert(block.clone());
		false
	}

	/// Number of re-emissions seen so far
	pub fn reemitted(&self) -> u64 {
		self.reemitted
	}

	pub fn len(&self) -> usize {
		self.history.len()
	}

	pub fn is_empty(&self) -> bool {
		self.history.is_empty()
	}
}
