use std::sync::Mutex;
use std::{env, fs};
use tempfile::TempDir;
use zeroize::Zeroize;

use ton_shard_scanner::{
	bootstrap::load_config,
	models::{RpcUrl, SecretString, SecretValue},
	utils::tests::builders::scanner::ScannerConfigBuilder,
};

// Serializes tests touching the process environment
static TEST_LOCK: Mutex<()> = Mutex::new(());

#[tokio::test]
#[allow(clippy::await_holding_lock)]
async fn test_secret_resolution_from_scanner_config() {
	let _lock = TEST_LOCK.lock().unwrap();

	let temp_dir = TempDir::new().unwrap();
	let config_path = temp_dir.path().join("scanner.json");

	const RPC_URL_ENV: &str = "TEST_TON_RPC_URL";
	const RPC_URL_VALUE: &str = "https://toncenter.test/api/v2/jsonRPC?api_key=secret";
	env::set_var(RPC_URL_ENV, RPC_URL_VALUE);

	let config = ScannerConfigBuilder::new()
		.name("TON mainnet")
		.slug("ton_mainnet")
		.rpc_urls(vec![
			RpcUrl {
				type_: "rpc".to_string(),
				url: SecretValue::Plain(SecretString::new(
					"https://toncenter.com/api/v2/jsonRPC".to_string(),
				)),
				weight: 100,
			},
			RpcUrl {
				type_: "rpc".to_string(),
				url: SecretValue::Environment(RPC_URL_ENV.to_string()),
				weight: 90,
			},
		])
		.build();
	fs::write(&config_path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

	// Loading resolves every secret into a plain value
	let loaded = load_config(Some(&config_path), None).await.unwrap();

	assert_eq!(
		loaded.rpc_urls[0].url.resolve().unwrap().as_str(),
		"https://toncenter.com/api/v2/jsonRPC"
	);
	assert!(matches!(loaded.rpc_urls[1].url, SecretValue::Plain(_)));
	assert_eq!(loaded.rpc_urls[1].url.as_str(), RPC_URL_VALUE);

	env::remove_var(RPC_URL_ENV);
}

#[tokio::test]
#[allow(clippy::await_holding_lock)]
async fn test_missing_environment_secret_fails_loading() {
	let _lock = TEST_LOCK.lock().unwrap();

	let temp_dir = TempDir::new().unwrap();
	let config_path = temp_dir.path().join("scanner.json");
	env::remove_var("TEST_TON_MISSING_RPC_URL");

	let config = ScannerConfigBuilder::new()
		.rpc_urls(vec![RpcUrl {
			type_: "rpc".to_string(),
			url: SecretValue::Environment("TEST_TON_MISSING_RPC_URL".to_string()),
			weight: 100,
		}])
		.build();
	fs::write(&config_path, serde_json::to_string(&config).unwrap()).unwrap();

	let err = load_config(Some(&config_path), None).await.err().unwrap();
	assert!(err.to_string().contains("failed to resolve RPC URL"));
}

#[test]
fn test_secret_zeroization() {
	let mut secret = SecretValue::Plain(SecretString::new("sensitive_api_key".to_string()));
	assert_eq!(secret.resolve().unwrap().as_str(), "sensitive_api_key");

	secret.zeroize();

	if let SecretValue::Plain(ref secret_string) = secret {
		assert_eq!(secret_string.as_str(), "");
	}
}

#[test]
fn test_secret_serialization_deserialization() {
	let plain_secret = SecretValue::Plain(SecretString::new("test_plain".to_string()));
	let env_secret = SecretValue::Environment("TEST_ENV_VAR".to_string());

	let plain_json = serde_json::to_string(&plain_secret).unwrap();
	let env_json = serde_json::to_string(&env_secret).unwrap();
	assert_eq!(plain_json, r#"{"type":"plain","value":"test_plain"}"#);

	let deserialized_plain: SecretValue = serde_json::from_str(&plain_json).unwrap();
	let deserialized_env: SecretValue = serde_json::from_str(&env_json).unwrap();

	assert_eq!(deserialized_plain, plain_secret);
	assert_eq!(deserialized_env, env_secret);
}
