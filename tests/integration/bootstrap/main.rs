use mockito::Server;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::sync::watch;

use ton_shard_scanner::{
	bootstrap::{check_connectivity, initialize_scanner, load_config},
	models::{ScannerConfig, SecretString, SecretValue},
	services::{
		bus::BLOCK_FOUND_TOPIC,
		scanner::{CycleOutcome, FileWatermarkStore, WatermarkStore},
	},
	utils::tests::builders::block::shard_block,
};

use crate::integration::mocks::{
	block_id_json, create_test_config, create_ton_method_mock,
	create_ton_valid_server_mock_probe_response, shards_response, FULL_SHARD_STR,
};

fn write_config(dir: &Path, rpc_url: &str, storage_path: &Path) -> PathBuf {
	let path = dir.join("scanner.json");
	let config = serde_json::json!({
		"name": "TON basechain",
		"slug": "ton_bootstrap",
		"rpc_urls": [{
			"type_": "rpc",
			"url": {"type": "plain", "value": rpc_url},
			"weight": 100
		}],
		"workchain": 0,
		"shard_selector": 0,
		"master_poll_interval_ms": 1000,
		"storage_path": storage_path.to_str().unwrap(),
		"store_blocks": true
	});
	std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
	path
}

fn config_for_server(slug: &str, server: &Server, storage_path: &Path) -> ScannerConfig {
	let mut config = create_test_config(slug, storage_path.to_str().unwrap());
	config.rpc_urls[0].url = SecretValue::Plain(SecretString::new(server.url()));
	config
}

#[tokio::test]
async fn test_initialize_scanner_first_run() {
	let mut server = Server::new_async().await;
	let _probe = create_ton_valid_server_mock_probe_response(&mut server, 10);
	let _shards = create_ton_method_mock(
		&mut server,
		"shards",
		shards_response(vec![block_id_json(0, FULL_SHARD_STR, 500)]),
	);

	let temp_dir = TempDir::new().unwrap();
	let config_path = write_config(temp_dir.path(), &server.url(), &temp_dir.path().join("data"));
	let config = load_config(Some(&config_path), None).await.unwrap();

	let (mut scanner, worker) = initialize_scanner(&config).await.unwrap();
	assert_eq!(worker.handler_count(BLOCK_FOUND_TOPIC), 2);
	assert!(scanner.last_known_shard_block().is_none());

	let (_tx, mut rx) = watch::channel(false);
	let outcome = scanner.run_cycle(&mut rx).await.unwrap();
	assert_eq!(
		outcome,
		CycleOutcome::Initialized {
			watermark: shard_block(500)
		}
	);

	let store = FileWatermarkStore::new(temp_dir.path().join("data"));
	let stored = store.load_watermark("ton_bootstrap").await.unwrap().unwrap();
	assert_eq!(stored.seqno, 500);
	assert_eq!(stored.root_hash, "root-500");
}

#[tokio::test]
async fn test_initialize_scanner_resumes_watermark() {
	let mut server = Server::new_async().await;
	let _probe = create_ton_valid_server_mock_probe_response(&mut server, 10);

	let temp_dir = TempDir::new().unwrap();
	let config = config_for_server("ton_resume", &server, temp_dir.path());

	FileWatermarkStore::new(temp_dir.path().to_path_buf())
		.save_watermark("ton_resume", &shard_block(321))
		.await
		.unwrap();

	let (scanner, worker) = initialize_scanner(&config).await.unwrap();
	assert_eq!(scanner.last_known_shard_block(), Some(&shard_block(321)));
	assert_eq!(scanner.settings().slug, "ton_resume");
	assert_eq!(worker.handler_count(BLOCK_FOUND_TOPIC), 1);
}

#[tokio::test]
async fn test_initialize_scanner_without_gateway() {
	let mut server = Server::new_async().await;
	let _down = server.mock("POST", "/").with_status(404).create();

	let temp_dir = TempDir::new().unwrap();
	let config = config_for_server("ton_down", &server, temp_dir.path());

	let err = initialize_scanner(&config).await.err().unwrap();
	assert!(err.to_string().contains("Failed to connect to any RPC URL"));
}

#[tokio::test]
async fn test_check_connectivity_reads_head() {
	let mut server = Server::new_async().await;
	let _probe = create_ton_valid_server_mock_probe_response(&mut server, 7);

	let temp_dir = TempDir::new().unwrap();
	let config_path = write_config(temp_dir.path(), &server.url(), temp_dir.path());
	let config = load_config(Some(&config_path), None).await.unwrap();

	let head = check_connectivity(&config).await.unwrap();
	assert_eq!(head.seqno(), 7);
}

#[tokio::test]
async fn test_load_config_rejects_invalid_file() {
	let temp_dir = TempDir::new().unwrap();
	let path = temp_dir.path().join("scanner.json");
	std::fs::write(
		&path,
		r#"{"name": "", "slug": "ton", "rpc_urls": [], "unknown_field": 1}"#,
	)
	.unwrap();

	assert!(load_config(Some(&path), None).await.is_err());
}
