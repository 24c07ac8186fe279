//! HTTP transport for JSON-RPC gateways.
//!
//! Probes the configured RPC URLs by descending weight, keeps the first one that answers the test
//! payload as the active endpoint, and hands the rest to the [`EndpointManager`] as fallbacks.

use anyhow::Context;
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;
use url::Url;

use crate::{
	models::ScannerConfig,
	services::blockchain::transports::{
		BlockchainTransport, EndpointManager, RotatingTransport, TransientErrorRetryStrategy,
		TransportError,
	},
	utils::http::{create_retryable_http_client, RetryConfig},
};

/// Basic HTTP transport client
///
/// Cloning is cheap and clones share the endpoint state, so a rotation made through one clone is
/// seen by all of them. Use [`HttpTransportClient::sticky`] for a copy with its own endpoint.
#[derive(Clone, Debug)]
pub struct HttpTransportClient {
	/// Retryable HTTP client for making requests
	pub client: ClientWithMiddleware,
	endpoint_manager: EndpointManager,
	/// Stringified JSON-RPC payload used to probe endpoints
	test_connection_payload: Option<String>,
}

fn default_test_request() -> Value {
	json!({
		"jsonrpc": "2.0",
		"id": 1,
		"method": "getMasterchainInfo",
		"params": {}
	})
}

impl HttpTransportClient {
	/// Creates a new HTTP transport client connected to the best reachable endpoint
	///
	/// # Arguments
	/// * `config` - Scanner configuration holding the RPC URLs and their weights
	/// * `test_connection_payload` - Optional JSON-RPC payload used to probe each endpoint
	///
	/// # Returns
	/// * `Result<Self, anyhow::Error>` - New client instance or connection error
	pub async fn new(
		config: &ScannerConfig,
		test_connection_payload: Option<String>,
	) -> Result<Self, anyhow::Error> {
		let mut rpc_urls: Vec<_> = config
			.rpc_urls
			.iter()
			.filter(|rpc_url| rpc_url.type_ == "rpc" && rpc_url.weight > 0)
			.collect();

		rpc_urls.sort_by(|a, b| b.weight.cmp(&a.weight));

		let base_http_client = reqwest::ClientBuilder::new()
			.pool_idle_timeout(Duration::from_secs(90))
			.pool_max_idle_per_host(32)
			.timeout(Duration::from_secs(30))
			.connect_timeout(Duration::from_secs(20))
			.build()
			.context("Failed to create base HTTP client")?;

		// Shared by the endpoint manager and the connection probes
		let retryable_client = create_retryable_http_client(
			&RetryConfig::default(),
			base_http_client,
			Some(TransientErrorRetryStrategy),
		);

		let test_request = match &test_connection_payload {
			Some(payload) => {
				serde_json::from_str(payload).context("Failed to parse test payload as JSON")?
			}
			None => default_test_request(),
		};

		for rpc_url in rpc_urls.iter() {
			let Ok(url) = Url::parse(rpc_url.url.as_ref()) else {
				tracing::warn!("Skipping unparsable RPC URL for '{}'", config.slug);
				continue;
			};

			match retryable_client.post(url).json(&test_request).send().await {
				Ok(response) if response.status().is_success() => {
					let fallback_urls: Vec<String> = rpc_urls
						.iter()
						.filter(|url| url.url != rpc_url.url)
						.map(|url| url.url.as_ref().to_string())
						.collect();

					return Ok(Self {
						client: retryable_client.clone(),
						endpoint_manager: EndpointManager::new(
							retryable_client,
							rpc_url.url.as_ref(),
							fallback_urls,
						),
						test_connection_payload,
					});
				}
				Ok(response) => {
					tracing::debug!(
						"RPC endpoint probe for '{}' answered {}",
						config.slug,
						response.status()
					);
				}
				Err(e) => {
					tracing::debug!("RPC endpoint probe for '{}' failed: {}", config.slug, e);
				}
			}
		}

		Err(anyhow::anyhow!("All RPC URLs failed to connect"))
	}

	/// Returns a copy pinned to the currently active endpoint
	///
	/// The copy shares the connection pool but never rotates, and rotations made by the original
	/// do not move it.
	pub async fn sticky(&self) -> Self {
		let active_url = self.get_current_url().await;
		Self {
			client: self.client.clone(),
			endpoint_manager: EndpointManager::pinned(self.client.clone(), &active_url),
			test_connection_payload: self.test_connection_payload.clone(),
		}
	}

	pub fn is_pinned(&self) -> bool {
		self.endpoint_manager.is_pinned()
	}
}

#[async_trait]
impl BlockchainTransport for HttpTransportClient {
	async fn get_current_url(&self) -> String {
		self.endpoint_manager.active_url.read().await.clone()
	}

	async fn send_raw_request<P>(
		&self,
		method: &str,
		params: Option<P>,
	) -> Result<Value, TransportError>
	where
		P: Into<Value> + Send + Clone + Serialize,
	{
		self.endpoint_manager
			.send_raw_request(self, method, params)
			.await
	}

	fn update_endpoint_manager_client(
		&mut self,
		client: ClientWithMiddleware,
	) -> Result<(), anyhow::Error> {
		self.endpoint_manager.update_client(client);
		Ok(())
	}
}

#[async_trait]
impl RotatingTransport for HttpTransportClient {
	/// Sends the test payload to `url` and fails unless it answers with a success status
	async fn try_connect(&self, url: &str) -> Result<(), anyhow::Error> {
		let url = Url::parse(url).map_err(|_| anyhow::anyhow!("Invalid URL: {}", url))?;

		let test_request = match &self.test_connection_payload {
			Some(payload) => {
				serde_json::from_str(payload).context("Failed to parse test payload as JSON")?
			}
			None => default_test_request(),
		};

		let response = self
			.client
			.post(url.clone())
			.json(&test_request)
			.send()
			.await
			.map_err(|e| anyhow::anyhow!("Failed to connect to {}: {}", url, e))?;

		let status = response.status();
		if !status.is_success() {
			return Err(anyhow::anyhow!(
				"Failed to connect to {}: {}",
				url,
				status.as_u16()
			));
		}
		Ok(())
	}

	async fn update_client(&self, url: &str) -> Result<(), anyhow::Error> {
		let parsed_url = Url::parse(url).map_err(|_| anyhow::anyhow!("Invalid URL: {}", url))?;
		let normalized_url = parsed_url.as_str().trim_end_matches('/');

		// Only the active URL changes; the HTTP client is endpoint agnostic
		let mut active_url = self.endpoint_manager.active_url.write().await;
		*active_url = normalized_url.to_string();
		Ok(())
	}
}
