use async_trait::async_trait;
use std::{
	sync::{Arc, Mutex},
	time::Duration,
};
use tempfile::TempDir;
use tokio::sync::watch;

use ton_shard_scanner::{
	bootstrap::create_event_pipeline,
	services::{
		bus::{BlockEvent, BlockHandler, EventBus, EventSink, BLOCK_FOUND_TOPIC},
		scanner::{MemoryWatermarkStore, ScannerSettings, ShardScanner},
	},
	utils::tests::builders::block::{shard_block, BlockHeaderBuilder},
};

use crate::integration::mocks::{create_test_config, FakeChain};

#[derive(Default)]
struct CollectingHandler {
	seqnos: Mutex<Vec<u32>>,
}

#[async_trait]
impl BlockHandler for CollectingHandler {
	fn name(&self) -> &str {
		"collecting"
	}

	async fn handle(&self, event: &BlockEvent) -> Result<(), anyhow::Error> {
		self.seqnos.lock().unwrap().push(event.header.seqno());
		Ok(())
	}
}

#[tokio::test]
async fn test_scanner_events_reach_archive_in_emission_order() {
	let temp_dir = TempDir::new().unwrap();
	let mut config = create_test_config("ton_archive", temp_dir.path().to_str().unwrap());
	config.store_blocks = true;

	let (bus, mut worker) = create_event_pipeline(&config);
	let collector = Arc::new(CollectingHandler::default());
	worker.subscribe(BLOCK_FOUND_TOPIC, collector.clone());
	let (_tx, rx) = watch::channel(false);
	let worker_handle = worker.spawn(rx.clone());

	let chain = FakeChain::new().with_blocks(100, 103);
	chain.push_master(10, 103);
	let mut scanner = ShardScanner::new(
		chain,
		Arc::new(MemoryWatermarkStore::new()),
		bus.clone(),
		ScannerSettings::from(&config),
		Some(shard_block(100)),
	);

	let mut shutdown = rx;
	scanner.run_cycle(&mut shutdown).await.unwrap();
	drop(scanner);
	drop(bus);

	// Every sender is gone, so the worker drains the queue and stops
	let dispatched = tokio::time::timeout(Duration::from_secs(5), worker_handle)
		.await
		.expect("dispatch worker did not stop")
		.unwrap();
	assert_eq!(dispatched, 3);
	assert_eq!(*collector.seqnos.lock().unwrap(), vec![103, 102, 101]);

	let archive = tokio::fs::read_to_string(temp_dir.path().join("ton_archive_blocks.jsonl"))
		.await
		.unwrap();
	let archived: Vec<u32> = archive
		.lines()
		.map(|line| serde_json::from_str::<BlockEvent>(line).unwrap().header.seqno())
		.collect();
	assert_eq!(archived, vec![103, 102, 101]);
}

#[tokio::test(start_paused = true)]
async fn test_delivery_waits_for_dispatch_delay() {
	let (bus, mut worker) = EventBus::new(Duration::from_secs(5));
	let collector = Arc::new(CollectingHandler::default());
	worker.subscribe(BLOCK_FOUND_TOPIC, collector.clone());

	let (tx, rx) = watch::channel(false);
	let handle = worker.spawn(rx);

	bus.emit_block_found(BlockHeaderBuilder::new().seqno(1).build())
		.unwrap();

	tokio::time::sleep(Duration::from_secs(4)).await;
	assert!(collector.seqnos.lock().unwrap().is_empty());

	tokio::time::sleep(Duration::from_secs(2)).await;
	assert_eq!(*collector.seqnos.lock().unwrap(), vec![1]);

	tx.send(true).unwrap();
	assert_eq!(handle.await.unwrap(), 1);
}

#[tokio::test]
async fn test_events_without_subscribers_are_consumed() {
	let (bus, worker) = EventBus::new(Duration::from_millis(1));
	let (_tx, rx) = watch::channel(false);
	let handle = worker.spawn(rx);

	bus.emit_block_found(BlockHeaderBuilder::new().seqno(9).build())
		.unwrap();
	drop(bus);

	assert_eq!(handle.await.unwrap(), 1);
}
