//! Watermark persistence.
//!
//! The watermark is the last shard block whose catch-up batch completed. It is the only state the
//! scanner needs to resume after a restart.
//! - File-based storage, one JSON document per scanner
//! - In-memory storage for tests and dry runs

use async_trait::async_trait;
use std::{collections::HashMap, path::PathBuf, sync::Arc};
use tokio::sync::RwLock;

use crate::models::BlockRef;

/// Interface for watermark storage implementations
#[async_trait]
pub trait WatermarkStore: Send + Sync {
	/// Retrieves the watermark of a scanner
	///
	/// # Arguments
	/// * `scanner_slug` - Unique identifier of the scanner
	///
	/// # Returns
	/// * `Result<Option<BlockRef>, anyhow::Error>` - The watermark, or None on first run
	async fn load_watermark(&self, scanner_slug: &str) -> Result<Option<BlockRef>, anyhow::Error>;

	/// Replaces the watermark of a scanner
	///
	/// # Arguments
	/// * `scanner_slug` - Unique identifier of the scanner
	/// * `block` - Head block of the batch that just completed
	async fn save_watermark(&self, scanner_slug: &str, block: &BlockRef)
		-> Result<(), anyhow::Error>;
}

/// File-based implementation of watermark storage
///
/// Writes `{storage_path}/{slug}_last_block.json` through a temporary file and a rename, so a
/// crash mid-write leaves the previous watermark intact.
#[derive(Clone)]
pub struct FileWatermarkStore {
	storage_path: PathBuf,
}

impl FileWatermarkStore {
	pub fn new(storage_path: PathBuf) -> Self {
		FileWatermarkStore { storage_path }
	}

	fn watermark_path(&self, scanner_slug: &str) -> PathBuf {
		self.storage_path
			.join(format!("{}_last_block.json", scanner_slug))
	}
}

impl Default for FileWatermarkStore {
	/// Stores watermarks under "data"
	fn default() -> Self {
		FileWatermarkStore::new(PathBuf::from("data"))
	}
}

#[async_trait]
impl WatermarkStore for FileWatermarkStore {
	async fn load_watermark(&self, scanner_slug: &str) -> Result<Option<BlockRef>, anyhow::Error> {
		let file_path = self.watermark_path(scanner_slug);

		let content = match tokio::fs::read_to_string(&file_path).await {
			Ok(content) => content,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
			Err(e) => return Err(anyhow::anyhow!("Failed to read watermark: {}", e)),
		};

		let block = serde_json::from_str::<BlockRef>(&content).map_err(|e| {
			anyhow::anyhow!(
				"Failed to parse watermark {}: {}",
				file_path.display(),
				e
			)
		})?;
		Ok(Some(block))
	}

	async fn save_watermark(
		&self,
		scanner_slug: &str,
		block: &BlockRef,
	) -> Result<(), anyhow::Error> {
		tokio::fs::create_dir_all(&self.storage_path)
			.await
			.map_err(|e| anyhow::anyhow!("Failed to create storage directory: {}", e))?;

		let file_path = self.watermark_path(scanner_slug);
		let tmp_path = file_path.with_extension("json.tmp");

		let json = serde_json::to_string_pretty(block)
			.map_err(|e| anyhow::anyhow!("Failed to serialize watermark: {}", e))?;
		tokio::fs::write(&tmp_path, json)
			.await
			.map_err(|e| anyhow::anyhow!("Failed to write watermark: {}", e))?;
		tokio::fs::rename(&tmp_path, &file_path)
			.await
			.map_err(|e| anyhow::anyhow!("Failed to replace watermark: {}", e))?;
		Ok(())
	}
}

/// In-memory watermark storage
///
/// Clones share the same map.
#[derive(Clone, Default)]
pub struct MemoryWatermarkStore {
	watermarks: Arc<RwLock<HashMap<String, BlockRef>>>,
}

impl MemoryWatermarkStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a store already holding `block` for `scanner_slug`
	pub fn with_watermark(scanner_slug: &str, block: BlockRef) -> Self {
		Self {
			watermarks: Arc::new(RwLock::new(HashMap::from([(
				scanner_slug.to_string(),
				block,
			)]))),
		}
	}
}

#[async_trait]
impl WatermarkStore for MemoryWatermarkStore {
	async fn load_watermark(&self, scanner_slug: &str) -> Result<Option<BlockRef>, anyhow::Error> {
		Ok(self.watermarks.read().await.get(scanner_slug).cloned())
	}

	async fn save_watermark(
		&self,
		scanner_slug: &str,
		block: &BlockRef,
	) -> Result<(), anyhow::Error> {
		self.watermarks
			.write()
			.await
			.insert(scanner_slug.to_string(), block.clone());
		Ok(())
	}
}
