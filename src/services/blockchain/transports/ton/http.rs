//! TON gateway transport.
//!
//! Wraps [`HttpTransportClient`] with the probe payload toncenter-compatible gateways understand.
//! Every TON v2 JSON-RPC method takes an object of named parameters, so requests without
//! parameters send `{}` rather than `null`.

use reqwest_middleware::ClientWithMiddleware;
use serde::Serialize;
use serde_json::{json, Value};

use crate::{
	models::ScannerConfig,
	services::blockchain::transports::{
		BlockchainTransport, HttpTransportClient, RotatingTransport, TransportError,
	},
};

/// Probe sent to every candidate endpoint
pub const TON_TEST_CONNECTION_PAYLOAD: &str =
	r#"{"id":1,"jsonrpc":"2.0","method":"getMasterchainInfo","params":{}}"#;

/// Transport for toncenter v2 compatible JSON-RPC gateways
#[derive(Clone, Debug)]
pub struct TonTransportClient {
	http_client: HttpTransportClient,
}

impl TonTransportClient {
	/// Connects to the highest weighted gateway that answers `getMasterchainInfo`
	pub async fn new(config: &ScannerConfig) -> Result<Self, anyhow::Error> {
		let http_client =
			HttpTransportClient::new(config, Some(TON_TEST_CONNECTION_PAYLOAD.to_string())).await?;
		Ok(Self { http_client })
	}

	/// Returns a copy pinned to the current gateway
	///
	/// Different lite servers may be at different heights; one catch-up walk should not mix them.
	pub async fn sticky(&self) -> Self {
		Self {
			http_client: self.http_client.sticky().await,
		}
	}

	pub fn is_pinned(&self) -> bool {
		self.http_client.is_pinned()
	}
}

#[async_trait::async_trait]
impl BlockchainTransport for TonTransportClient {
	async fn get_current_url(&self) -> String {
		self.http_client.get_current_url().await
	}

	async fn send_raw_request<P>(
		&self,
		method: &str,
		params: Option<P>,
	) -> Result<Value, TransportError>
	where
		P: Into<Value> + Send + Clone + Serialize,
	{
		let params: Value = params.map(Into::into).unwrap_or_else(|| json!({}));
		self.http_client.send_raw_request(method, Some(params)).await
	}

	fn update_endpoint_manager_client(
		&mut self,
		client: ClientWithMiddleware,
	) -> Result<(), anyhow::Error> {
		self.http_client.update_endpoint_manager_client(client)
	}
}

#[async_trait::async_trait]
impl RotatingTransport for TonTransportClient {
	async fn try_connect(&self, url: &str) -> Result<(), anyhow::Error> {
		self.http_client.try_connect(url).await
	}

	async fn update_client(&self, url: &str) -> Result<(), anyhow::Error> {
		self.http_client.update_client(url).await
	}
}
