//! Built-in block handlers.
//!
//! - [`LoggingBlockHandler`] logs every found block and flags stale ones
//! - [`BlockArchiveHandler`] appends events to a JSON lines file

use async_trait::async_trait;
use std::{path::PathBuf, time::Duration};
use tokio::io::AsyncWriteExt;

use crate::{
	services::bus::dispatcher::{BlockEvent, BlockHandler},
	utils::parsing::format_shard_id,
};

/// Logs found blocks and warns about blocks older than the TTL
pub struct LoggingBlockHandler {
	block_ttl: Duration,
}

impl LoggingBlockHandler {
	pub fn new(block_ttl: Duration) -> Self {
		Self { block_ttl }
	}
}

#[async_trait]
impl BlockHandler for LoggingBlockHandler {
	fn name(&self) -> &str {
		"logging"
	}

	async fn handle(&self, event: &BlockEvent) -> Result<(), anyhow::Error> {
		let header = &event.header;
		if header.is_expired(self.block_ttl) {
			tracing::warn!(
				"Block {} is {}s old, beyond the {}s TTL",
				header.id,
				header.age().as_secs(),
				self.block_ttl.as_secs()
			);
		}

		tracing::info!(
			event_id = %event.id,
			shard = %format_shard_id(header.id.shard),
			seqno = header.seqno(),
			"Block found: gen_utime={} lt=[{}, {})",
			header.gen_utime,
			header.start_lt,
			header.end_lt
		);
		Ok(())
	}
}

/// Appends each event as one JSON line to `{storage_path}/{slug}_blocks.jsonl`
pub struct BlockArchiveHandler {
	file_path: PathBuf,
}

impl BlockArchiveHandler {
	pub fn new(storage_path: PathBuf, scanner_slug: &str) -> Self {
		Self {
			file_path: storage_path.join(format!("{}_blocks.jsonl", scanner_slug)),
		}
	}

	pub fn file_path(&self) -> &PathBuf {
		&self.file_path
	}
}

#[async_trait]
impl BlockHandler for BlockArchiveHandler {
	fn name(&self) -> &str {
		"archive"
	}

	async fn handle(&self, event: &BlockEvent) -> Result<(), anyhow::Error> {
		if let Some(parent) = self.file_path.parent() {
			tokio::fs::create_dir_all(parent)
				.await
				.map_err(|e| anyhow::anyhow!("Failed to create archive directory: {}", e))?;
		}

		let mut line = serde_json::to_string(event)
			.map_err(|e| anyhow::anyhow!("Failed to serialize block event: {}", e))?;
		line.push('\n');

		let mut file = tokio::fs::OpenOptions::new()
			.create(true)
			.append(true)
			.open(&self.file_path)
			.await
			.map_err(|e| anyhow::anyhow!("Failed to open block archive: {}", e))?;

		file.write_all(line.as_bytes())
			.await
			.map_err(|e| anyhow::anyhow!("Failed to append to block archive: {}", e))?;
		file.flush()
			.await
			.map_err(|e| anyhow::anyhow!("Failed to flush block archive: {}", e))?;
		Ok(())
	}
}
