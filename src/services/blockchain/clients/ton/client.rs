//! TON client over a toncenter v2 compatible JSON-RPC gateway.
//!
//! Implements [`ChainHeadClient`] with three calls:
//! - `getMasterchainInfo` for the masterchain head
//! - `shards` for the shard blocks referenced by a masterchain block
//! - `getBlockHeader` for a shard block header and its parent candidates

use anyhow::Context;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::instrument;

use crate::{
	models::{BlockRef, MasterchainHead, ScannerConfig, ShardBlockInfo},
	services::blockchain::{
		client::ChainHeadClient,
		transports::{BlockchainTransport, TonTransportClient, TransportError},
	},
	utils::parsing::format_shard_id,
};

use super::error::TonClientError;

const RPC_METHOD_GET_MASTERCHAIN_INFO: &str = "getMasterchainInfo";
const RPC_METHOD_SHARDS: &str = "shards";
const RPC_METHOD_GET_BLOCK_HEADER: &str = "getBlockHeader";

/// Client for TON gateways
#[derive(Clone)]
pub struct TonClient<T: Send + Sync + Clone> {
	http_client: T,
}

fn method_metadata(method: &str) -> Option<HashMap<String, String>> {
	Some(HashMap::from([("method".to_string(), method.to_string())]))
}

/// Extracts a message from an `error` field, which gateways send either as a string or as a
/// JSON-RPC error object
fn error_message(error: &Value) -> String {
	match error {
		Value::String(message) => message.clone(),
		other => other
			.get("message")
			.and_then(Value::as_str)
			.map(str::to_string)
			.unwrap_or_else(|| other.to_string()),
	}
}

impl<T: Send + Sync + Clone> TonClient<T> {
	/// Creates a new TON client with a specific transport client
	pub fn new_with_transport(http_client: T) -> Self {
		Self { http_client }
	}
}

impl<T: Send + Sync + Clone + BlockchainTransport> TonClient<T> {
	/// Calls `method` and returns its `result` field
	///
	/// Gateway errors mentioning a not-applied block map to [`TonClientError::NotApplied`],
	/// whether they arrive as an HTTP error body, a JSON-RPC `error` or an `ok: false` envelope.
	async fn call(&self, method: &'static str, params: Value) -> Result<Value, TonClientError> {
		let response = match self.http_client.send_raw_request(method, Some(params)).await {
			Ok(response) => response,
			Err(err @ TransportError::Http { .. })
				if err
					.body()
					.is_some_and(TonClientError::message_is_not_applied) =>
			{
				return Err(TonClientError::not_applied(
					format!("'{}' refers to a block that is not applied yet", method),
					Some(Box::new(err)),
					method_metadata(method),
				));
			}
			Err(err) => {
				return Err(TonClientError::rpc_error(
					format!("Transport failure for method '{}'", method),
					Some(Box::new(err)),
					method_metadata(method),
				));
			}
		};

		if let Some(error) = response.get("error").filter(|e| !e.is_null()) {
			let message = error_message(error);
			if TonClientError::message_is_not_applied(&message) {
				return Err(TonClientError::not_applied(
					format!("'{}': {}", method, message),
					None,
					method_metadata(method),
				));
			}
			return Err(TonClientError::rpc_error(
				format!("TON RPC request failed for method '{}': {}", method, message),
				None,
				method_metadata(method),
			));
		}

		if response.get("ok").and_then(Value::as_bool) == Some(false) {
			return Err(TonClientError::rpc_error(
				format!("Gateway answered ok=false for method '{}'", method),
				None,
				method_metadata(method),
			));
		}

		response.get("result").cloned().ok_or_else(|| {
			TonClientError::unexpected_response_structure(
				format!("Missing 'result' field in '{}' response", method),
				None,
				method_metadata(method),
			)
		})
	}
}

/// Decodes `field` of an RPC result
fn decode_field<R: DeserializeOwned>(
	result: &Value,
	field: &str,
	method: &str,
) -> Result<R, TonClientError> {
	let value = result.get(field).ok_or_else(|| {
		TonClientError::unexpected_response_structure(
			format!("Missing '{}' field in '{}' result", field, method),
			None,
			method_metadata(method),
		)
	})?;

	serde_json::from_value(value.clone()).map_err(|e| {
		TonClientError::response_parse_error(
			format!("Failed to decode '{}' of '{}' result", field, method),
			Some(Box::new(e)),
			method_metadata(method),
		)
	})
}

impl TonClient<TonTransportClient> {
	/// Creates a new TON client connected to the best reachable gateway
	///
	/// # Arguments
	/// * `config` - Scanner configuration containing the RPC endpoints
	///
	/// # Returns
	/// * `Result<Self, anyhow::Error>` - New client instance or connection error
	pub async fn new(config: &ScannerConfig) -> Result<Self, anyhow::Error> {
		let http_client = TonTransportClient::new(config).await?;
		Ok(Self::new_with_transport(http_client))
	}

	/// Returns a client pinned to the currently active gateway, with rotation disabled
	pub async fn sticky(&self) -> Self {
		Self::new_with_transport(self.http_client.sticky().await)
	}

	pub fn is_pinned(&self) -> bool {
		self.http_client.is_pinned()
	}

	pub async fn current_url(&self) -> String {
		self.http_client.get_current_url().await
	}
}

#[async_trait]
impl<T: Send + Sync + Clone + BlockchainTransport> ChainHeadClient for TonClient<T> {
	#[instrument(skip(self))]
	async fn get_current_head(&self) -> Result<MasterchainHead, anyhow::Error> {
		let result = self
			.call(RPC_METHOD_GET_MASTERCHAIN_INFO, json!({}))
			.await
			.context("Failed to get masterchain info")?;

		let last: BlockRef = decode_field(&result, "last", RPC_METHOD_GET_MASTERCHAIN_INFO)
			.context("Failed to decode masterchain head")?;

		Ok(MasterchainHead::new(last))
	}

	#[instrument(skip(self, head), fields(master_seqno = head.seqno()))]
	async fn get_shard_block_refs(
		&self,
		head: &MasterchainHead,
	) -> Result<Vec<BlockRef>, anyhow::Error> {
		let result = self
			.call(RPC_METHOD_SHARDS, json!({ "seqno": head.seqno() }))
			.await
			.with_context(|| format!("Failed to get shards of master block {}", head.seqno()))?;

		let shards: Vec<BlockRef> = decode_field(&result, "shards", RPC_METHOD_SHARDS)
			.context("Failed to decode shard list")?;

		Ok(shards)
	}

	#[instrument(skip(self, block), fields(shard = %format_shard_id(block.shard), seqno = block.seqno))]
	async fn get_block_header(&self, block: &BlockRef) -> Result<ShardBlockInfo, anyhow::Error> {
		let params = json!({
			"workchain": block.workchain,
			"shard": block.shard,
			"seqno": block.seqno,
			"root_hash": block.root_hash,
			"file_hash": block.file_hash,
		});

		let result = self
			.call(RPC_METHOD_GET_BLOCK_HEADER, params)
			.await
			.with_context(|| format!("Failed to get header of block {}", block))?;

		let info: ShardBlockInfo = serde_json::from_value(result).map_err(|e| {
			TonClientError::response_parse_error(
				format!("Failed to decode header of block {}", block),
				Some(Box::new(e)),
				method_metadata(RPC_METHOD_GET_BLOCK_HEADER),
			)
		})?;

		Ok(info)
	}
}
