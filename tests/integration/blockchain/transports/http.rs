use mockito::Server;
use serde_json::{json, Value};
use ton_shard_scanner::{
	models::{RpcUrl, SecretString, SecretValue},
	services::blockchain::{BlockchainTransport, HttpTransportClient, RotatingTransport},
	utils::{tests::builders::scanner::ScannerConfigBuilder, RetryConfig},
};

use crate::integration::mocks::{
	create_ton_test_config_with_urls, create_ton_valid_server_mock_probe_response,
};

#[tokio::test]
async fn test_client_creation() {
	let mut server = Server::new_async().await;
	let mock = create_ton_valid_server_mock_probe_response(&mut server, 1);
	let config = create_ton_test_config_with_urls(vec![&server.url()]);

	match HttpTransportClient::new(&config, None).await {
		Ok(transport) => {
			assert_eq!(transport.get_current_url().await, server.url());
			assert!(!transport.is_pinned());
			mock.assert();
		}
		Err(e) => panic!("Transport creation failed: {:?}", e),
	}

	let config = create_ton_test_config_with_urls(vec!["invalid-url"]);
	match HttpTransportClient::new(&config, None).await {
		Err(error) => assert!(error.to_string().contains("All RPC URLs failed to connect")),
		_ => panic!("Transport creation should fail"),
	}
}

#[tokio::test]
async fn test_client_creation_prefers_highest_weight() {
	let mut low = Server::new_async().await;
	let mut high = Server::new_async().await;
	let low_mock = low.mock("POST", "/").expect(0).create();
	let high_mock = create_ton_valid_server_mock_probe_response(&mut high, 1);

	let config = ScannerConfigBuilder::new()
		.rpc_url_with_weight(&low.url(), 10)
		.add_rpc_url(&high.url(), 90)
		.add_rpc_url("https://disabled.test/api/v2/jsonRPC", 0)
		.build();

	let transport = HttpTransportClient::new(&config, None).await.unwrap();
	assert_eq!(transport.get_current_url().await, high.url());
	low_mock.assert();
	high_mock.assert();
}

#[tokio::test]
async fn test_client_creation_skips_non_rpc_entries() {
	let mut server = Server::new_async().await;
	let mock = server.mock("POST", "/").expect(0).create();

	let config = ScannerConfigBuilder::new()
		.rpc_urls(vec![RpcUrl {
			type_: "ws".to_string(),
			url: SecretValue::Plain(SecretString::new(server.url())),
			weight: 100,
		}])
		.build();

	assert!(HttpTransportClient::new(&config, None).await.is_err());
	mock.assert();
}

#[tokio::test]
async fn test_client_creation_with_fallback() {
	let mut server = Server::new_async().await;
	let mut server2 = Server::new_async().await;

	let expected_attempts = 1 + RetryConfig::default().max_retries;

	let failing = server
		.mock("POST", "/")
		.with_status(500)
		.expect(expected_attempts as usize)
		.create();
	let healthy = create_ton_valid_server_mock_probe_response(&mut server2, 1);

	let config = create_ton_test_config_with_urls(vec![&server.url(), &server2.url()]);

	let transport = HttpTransportClient::new(&config, None).await.unwrap();
	assert_eq!(transport.get_current_url().await, server2.url());
	failing.assert();
	healthy.assert();
}

#[tokio::test]
async fn test_client_creation_with_custom_probe() {
	let mut server = Server::new_async().await;
	const PROBE: &str = r#"{"id":1,"jsonrpc":"2.0","method":"getConsensusBlock","params":{}}"#;
	let mock = server
		.mock("POST", "/")
		.match_body(PROBE)
		.with_header("content-type", "application/json")
		.with_status(200)
		.with_body(r#"{"ok":true,"result":{"consensus_block":100}}"#)
		.expect(2)
		.create();

	let config = create_ton_test_config_with_urls(vec![&server.url()]);
	let transport = HttpTransportClient::new(&config, Some(PROBE.to_string()))
		.await
		.unwrap();

	assert!(transport.try_connect(&server.url()).await.is_ok());
	mock.assert();
}

#[tokio::test]
async fn test_client_update_client() {
	let mut server = Server::new_async().await;
	let server2 = Server::new_async().await;
	let mock = create_ton_valid_server_mock_probe_response(&mut server, 1);

	let config = create_ton_test_config_with_urls(vec![&server.url()]);
	let client = HttpTransportClient::new(&config, None).await.unwrap();

	assert!(client.update_client(&server2.url()).await.is_ok());
	assert_eq!(client.get_current_url().await, server2.url());

	let e = client.update_client("invalid-url").await.unwrap_err();
	assert!(e.to_string().contains("Invalid URL: invalid-url"));
	mock.assert();
}

#[tokio::test]
async fn test_client_try_connect() {
	let mut server = Server::new_async().await;
	let mut server2 = Server::new_async().await;
	let mock = create_ton_valid_server_mock_probe_response(&mut server, 1);
	let mock2 = create_ton_valid_server_mock_probe_response(&mut server2, 1);

	let config = create_ton_test_config_with_urls(vec![&server.url()]);
	let client = HttpTransportClient::new(&config, None).await.unwrap();

	assert!(client.try_connect(&server2.url()).await.is_ok());

	let e = client.try_connect("invalid-url").await.unwrap_err();
	assert!(e.to_string().contains("Invalid URL"));

	let e = client
		.try_connect("http://non-existent-url-localhost:8081")
		.await
		.unwrap_err();
	assert!(e.to_string().contains("Failed to connect"));

	mock.assert();
	mock2.assert();
}

#[tokio::test]
async fn test_send_raw_request() {
	let mut server = Server::new_async().await;
	let probe = create_ton_valid_server_mock_probe_response(&mut server, 1);

	let with_params = server
		.mock("POST", "/")
		.match_body(r#"{"id":1,"jsonrpc":"2.0","method":"shards","params":{"seqno":10}}"#)
		.with_header("content-type", "application/json")
		.with_status(200)
		.with_body(r#"{"ok":true,"result":{"shards":[]}}"#)
		.create();

	let config = create_ton_test_config_with_urls(vec![&server.url()]);
	let client = HttpTransportClient::new(&config, None).await.unwrap();

	let response = client
		.send_raw_request("shards", Some(json!({"seqno": 10})))
		.await
		.unwrap();
	assert_eq!(response["result"]["shards"], json!([]));
	probe.assert();
	with_params.assert();

	// The generic transport leaves absent params as null
	let without_params = server
		.mock("POST", "/")
		.match_body(r#"{"id":1,"jsonrpc":"2.0","method":"getConsensusBlock","params":null}"#)
		.with_header("content-type", "application/json")
		.with_status(200)
		.with_body(r#"{"ok":true,"result":{"consensus_block":5}}"#)
		.create();

	let response = client
		.send_raw_request::<Value>("getConsensusBlock", None)
		.await
		.unwrap();
	assert_eq!(response["result"]["consensus_block"], 5);
	without_params.assert();
}

#[tokio::test]
async fn test_sticky_copy_ignores_rotation_of_original() {
	let mut server = Server::new_async().await;
	let server2 = Server::new_async().await;
	let _probe = create_ton_valid_server_mock_probe_response(&mut server, 1);

	let config = create_ton_test_config_with_urls(vec![&server.url(), &server2.url()]);
	let client = HttpTransportClient::new(&config, None).await.unwrap();
	let sticky = client.sticky().await;

	assert!(sticky.is_pinned());
	assert_eq!(sticky.get_current_url().await, server.url());

	client.update_client(&server2.url()).await.unwrap();
	assert_eq!(client.get_current_url().await, server2.url());
	assert_eq!(sticky.get_current_url().await, server.url());
}
