use reqwest_middleware::ClientWithMiddleware;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::RwLock;

use ton_shard_scanner::services::blockchain::{
	BlockchainTransport, RotatingTransport, TransportError,
};

// Transport whose client update always fails.
// Used to check that a failed rotation leaves the endpoint manager untouched.
#[derive(Clone)]
pub struct AlwaysFailsToUpdateClientTransport {
	pub current_url: Arc<RwLock<String>>,
}

#[async_trait::async_trait]
impl BlockchainTransport for AlwaysFailsToUpdateClientTransport {
	async fn get_current_url(&self) -> String {
		self.current_url.read().await.clone()
	}

	async fn send_raw_request<P>(
		&self,
		_method: &str,
		_params: Option<P>,
	) -> Result<Value, TransportError>
	where
		P: Into<Value> + Send + Clone + Serialize,
	{
		Ok(json!({}))
	}

	fn update_endpoint_manager_client(
		&mut self,
		_client: ClientWithMiddleware,
	) -> Result<(), anyhow::Error> {
		Ok(())
	}
}

#[async_trait::async_trait]
impl RotatingTransport for AlwaysFailsToUpdateClientTransport {
	async fn try_connect(&self, _url: &str) -> Result<(), anyhow::Error> {
		Ok(())
	}

	async fn update_client(&self, _url: &str) -> Result<(), anyhow::Error> {
		Err(anyhow::anyhow!("Simulated client update failure"))
	}
}

// Transport probing candidate URLs with a plain GET.
// Request bodies are built the way TON gateways expect them: named parameters, `{}` when absent.
#[derive(Clone)]
pub struct MockTransport {
	client: reqwest::Client,
	current_url: Arc<RwLock<String>>,
}

impl MockTransport {
	pub fn new() -> Self {
		Self {
			client: reqwest::Client::new(),
			current_url: Arc::new(RwLock::new(String::new())),
		}
	}
}

#[async_trait::async_trait]
impl BlockchainTransport for MockTransport {
	async fn get_current_url(&self) -> String {
		self.current_url.read().await.clone()
	}

	async fn send_raw_request<P: Into<Value> + Send + Clone + Serialize>(
		&self,
		_method: &str,
		_params: Option<P>,
	) -> Result<Value, TransportError> {
		Ok(json!({
			"jsonrpc": "2.0",
			"result": "mocked_response",
			"id": 1
		}))
	}

	async fn customize_request<P: Into<Value> + Send + Clone + Serialize>(
		&self,
		method: &str,
		params: Option<P>,
	) -> Value {
		json!({
			"jsonrpc": "2.0",
			"id": 1,
			"method": method,
			"params": params.map(Into::into).unwrap_or_else(|| json!({}))
		})
	}

	fn update_endpoint_manager_client(
		&mut self,
		_client: ClientWithMiddleware,
	) -> Result<(), anyhow::Error> {
		Ok(())
	}
}

#[async_trait::async_trait]
impl RotatingTransport for MockTransport {
	async fn try_connect(&self, url: &str) -> Result<(), anyhow::Error> {
		match self.client.get(url).send().await {
			Ok(response) if response.status().is_success() => Ok(()),
			Ok(response) => Err(anyhow::anyhow!(
				"Failed to connect to {}: {}",
				url,
				response.status()
			)),
			Err(e) => Err(anyhow::anyhow!("Failed to connect to {}: {}", url, e)),
		}
	}

	async fn update_client(&self, url: &str) -> Result<(), anyhow::Error> {
		*self.current_url.write().await = url.to_string();
		Ok(())
	}
}
