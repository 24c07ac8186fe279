//! Shard chain scanner.
//!
//! - Shard prefix matching used to pick the tracked shard's block among candidates
//! - Cancellable retry loops for not-applied blocks
//! - Watermark storage
//! - The catch-up walk itself

mod error;
mod retry;
mod service;
mod shard;
mod storage;
mod tracker;

pub use error::ScannerError;
pub use retry::{
	cancellable, retry, sleep_or_shutdown, wait_for_shutdown, Attempt, RetryError, RetryPolicy,
};
pub use service::{CycleOutcome, ScannerSettings, ShardScanner};
pub use shard::{is_in_shard, select_shard_block, MAX_SELECTOR_PREFIX_LEN};
pub use storage::{FileWatermarkStore, MemoryWatermarkStore, WatermarkStore};
pub use tracker::{EmissionTracker, DEFAULT_HISTORY_SIZE};
