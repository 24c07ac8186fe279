//! Bootstrap module for wiring the scanner together.
//!
//! Loads the configuration, connects the TON client, restores the watermark and builds the event
//! pipeline. Every failure here is a startup error: the process exits before the scanner runs.
//!
//! # Components
//! - `TonClient`: sticky client the scanner reads the chain through
//! - `FileWatermarkStore`: watermark persistence under `storage_path`
//! - `EventBus` and `DispatchWorker`: deferred delivery to block handlers

use std::{error::Error, path::Path, path::PathBuf, sync::Arc};

use crate::{
	models::{ConfigLoader, MasterchainHead, ScannerConfig, DEFAULT_CONFIG_PATH},
	services::{
		blockchain::{ChainHeadClient, TonClient, TonTransportClient},
		bus::{
			BlockArchiveHandler, DispatchWorker, EventBus, EventSink, LoggingBlockHandler,
			BLOCK_FOUND_TOPIC,
		},
		scanner::{FileWatermarkStore, ScannerSettings, ShardScanner, WatermarkStore},
	},
};

/// Type alias for handling ServiceResult
pub type Result<T> = std::result::Result<T, Box<dyn Error>>;

/// Scanner as run by the binary
pub type TonShardScanner =
	ShardScanner<TonClient<TonTransportClient>, FileWatermarkStore, EventBus>;

/// Loads and validates the scanner configuration
///
/// # Arguments
/// * `path` - Configuration file, `config/scanner.json` when `None`
/// * `shard_selector` - Optional override of the configured shard selector
pub async fn load_config(path: Option<&Path>, shard_selector: Option<u8>) -> Result<ScannerConfig> {
	let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));
	let mut config = ScannerConfig::load_from_path(path).await?;

	if let Some(selector) = shard_selector {
		tracing::info!(
			"Shard selector overridden from {:#04x} to {:#04x}",
			config.shard_selector,
			selector
		);
		config.shard_selector = selector;
	}

	Ok(config)
}

/// Creates the event bus and subscribes the configured handlers
///
/// Blocks are always logged; they are also archived when `store_blocks` is set.
pub fn create_event_pipeline(config: &ScannerConfig) -> (Arc<EventBus>, DispatchWorker) {
	let (bus, mut worker) = EventBus::new(config.dispatch_delay());

	worker.subscribe(
		BLOCK_FOUND_TOPIC,
		Arc::new(LoggingBlockHandler::new(config.block_ttl())),
	);

	if config.store_blocks {
		let archive = BlockArchiveHandler::new(PathBuf::from(&config.storage_path), &config.slug);
		tracing::info!("Archiving found blocks to {}", archive.file_path().display());
		worker.subscribe(BLOCK_FOUND_TOPIC, Arc::new(archive));
	}

	(Arc::new(bus), worker)
}

/// Builds a scanner from injected dependencies, restoring the watermark from `store`
pub async fn create_scanner<C, W, S>(
	config: &ScannerConfig,
	client: C,
	store: Arc<W>,
	sink: Arc<S>,
) -> Result<ShardScanner<C, W, S>>
where
	C: ChainHeadClient,
	W: WatermarkStore + ?Sized,
	S: EventSink + ?Sized,
{
	let scanner = ShardScanner::resume(client, store, sink, ScannerSettings::from(config)).await?;
	Ok(scanner)
}

/// Connects to the configured gateways and builds the production scanner
///
/// # Returns
/// The scanner, pinned to one gateway, and the dispatch worker still to be spawned.
///
/// # Errors
/// Returns an error if no gateway answers or the stored watermark cannot be read.
pub async fn initialize_scanner(config: &ScannerConfig) -> Result<(TonShardScanner, DispatchWorker)> {
	let client = TonClient::new(config).await.map_err(|e| {
		anyhow::anyhow!(
			"Failed to connect to any RPC URL of '{}': {}",
			config.slug,
			e
		)
	})?;
	let client = client.sticky().await;
	tracing::info!(
		"Scanner '{}' pinned to {}",
		config.slug,
		client.current_url().await
	);

	let store = Arc::new(FileWatermarkStore::new(PathBuf::from(&config.storage_path)));
	let (bus, worker) = create_event_pipeline(config);

	let scanner = create_scanner(config, client, store, bus).await?;
	Ok((scanner, worker))
}

/// Connects to the configured gateways and reads the masterchain head once
pub async fn check_connectivity(config: &ScannerConfig) -> Result<MasterchainHead> {
	let client = TonClient::new(config).await?;
	let head = client.get_current_head().await?;
	Ok(head)
}
