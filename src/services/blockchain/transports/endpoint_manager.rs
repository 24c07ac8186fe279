//! Active RPC endpoint selection.
//!
//! Sends requests to the active endpoint and, for shared clients, rotates to a fallback endpoint on
//! rate limiting or network failure. A pinned manager has no fallbacks and never rotates; the
//! scanner reads through a pinned manager so a catch-up walk sees one node's view of the chain.

use reqwest_middleware::ClientWithMiddleware;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::services::blockchain::transports::{
	RotatingTransport, TransportError, ROTATE_ON_ERROR_CODES,
};

/// Active endpoint plus the fallbacks it can rotate to
#[derive(Clone, Debug)]
pub struct EndpointManager {
	pub active_url: Arc<RwLock<String>>,
	pub fallback_urls: Arc<RwLock<Vec<String>>>,
	client: ClientWithMiddleware,
	rotation_lock: Arc<Mutex<()>>,
	pinned: bool,
}

/// Outcome of a single request on one URL
#[derive(Debug)]
enum SingleRequestAttemptOutcome {
	/// Got a response; the status may still be an error
	Success(reqwest::Response),
	/// Connection, timeout or other send failure
	NetworkError(reqwest_middleware::Error),
	/// The request body could not be serialized
	SerializationError(TransportError),
}

impl EndpointManager {
	/// Creates a manager that may rotate through `fallback_urls`
	pub fn new(client: ClientWithMiddleware, active_url: &str, fallback_urls: Vec<String>) -> Self {
		Self {
			active_url: Arc::new(RwLock::new(active_url.to_string())),
			fallback_urls: Arc::new(RwLock::new(fallback_urls)),
			rotation_lock: Arc::new(Mutex::new(())),
			client,
			pinned: false,
		}
	}

	/// Creates a manager bound to `url` for its whole lifetime
	///
	/// State is not shared with any other manager, so rotations elsewhere do not move it.
	pub fn pinned(client: ClientWithMiddleware, url: &str) -> Self {
		Self {
			pinned: true,
			..Self::new(client, url, Vec::new())
		}
	}

	pub fn is_pinned(&self) -> bool {
		self.pinned
	}

	/// Replaces the HTTP client, e.g. to change the retry policy
	pub fn update_client(&mut self, client: ClientWithMiddleware) {
		self.client = client;
	}

	/// Rotates to the first fallback that accepts a connection.
	///
	/// The previous active URL is appended to the fallbacks. Returns the new active URL.
	pub async fn try_rotate_url<T: RotatingTransport>(
		&self,
		transport: &T,
	) -> Result<String, TransportError> {
		if self.pinned {
			let active = self.active_url.read().await.clone();
			return Err(TransportError::url_rotation(
				format!("Endpoint '{}' is pinned, rotation disabled", active),
				None,
				None,
			));
		}

		let _guard = self.rotation_lock.lock().await;
		let initial_active_url = self.active_url.read().await.clone();
		let fallbacks = self.fallback_urls.read().await.clone();

		let Some(new_url) = fallbacks
			.iter()
			.find(|url| **url != initial_active_url)
			.cloned()
		else {
			return Err(TransportError::url_rotation(
				format!(
					"No fallback URLs available. Current active: '{}'",
					initial_active_url
				),
				None,
				None,
			));
		};

		transport.try_connect(&new_url).await.map_err(|e| {
			TransportError::url_rotation(
				format!("Failed to connect to new URL '{}'", new_url),
				Some(e.into()),
				None,
			)
		})?;

		transport.update_client(&new_url).await.map_err(|e| {
			TransportError::url_rotation(
				format!(
					"Failed to update transport client with new URL '{}'",
					new_url
				),
				Some(e.into()),
				None,
			)
		})?;

		{
			let mut active_url_guard = self.active_url.write().await;
			let mut fallback_urls_guard = self.fallback_urls.write().await;

			let mut next_fallback_urls: Vec<String> = fallback_urls_guard
				.iter()
				.filter(|url| **url != new_url)
				.cloned()
				.collect();
			next_fallback_urls.push(initial_active_url.clone());

			tracing::info!(
				"Rotated RPC endpoint from '{}' to '{}'",
				initial_active_url,
				new_url
			);

			*fallback_urls_guard = next_fallback_urls;
			*active_url_guard = new_url.clone();
		}
		Ok(new_url)
	}

	async fn try_request_on_url<P>(
		&self,
		url: &str,
		transport: &impl RotatingTransport,
		method: &str,
		params: Option<P>,
	) -> SingleRequestAttemptOutcome
	where
		P: Into<Value> + Send + Clone + Serialize,
	{
		let request_body = transport.customize_request(method, params).await;

		let request_body_str = match serde_json::to_string(&request_body) {
			Ok(body) => body,
			Err(e) => {
				return SingleRequestAttemptOutcome::SerializationError(
					TransportError::request_serialization(
						"Failed to serialize request JSON",
						Some(Box::new(e)),
						None,
					),
				);
			}
		};

		match self
			.client
			.post(url)
			.header("Content-Type", "application/json")
			.body(request_body_str)
			.send()
			.await
		{
			Ok(response) => SingleRequestAttemptOutcome::Success(response),
			Err(network_error) => SingleRequestAttemptOutcome::NetworkError(network_error),
		}
	}

	/// Sends a JSON-RPC request to the active endpoint.
	///
	/// Rate limiting (429) and network errors trigger a rotation and a retry on the new endpoint.
	/// Other HTTP error statuses fail immediately with the response body attached.
	pub async fn send_raw_request<
		T: RotatingTransport,
		P: Into<Value> + Send + Clone + Serialize,
	>(
		&self,
		transport: &T,
		method: &str,
		params: Option<P>,
	) -> Result<Value, TransportError> {
		loop {
			let current_url = self.active_url.read().await.clone();

			match self
				.try_request_on_url(&current_url, transport, method, params.clone())
				.await
			{
				SingleRequestAttemptOutcome::Success(response) => {
					let status = response.status();
					if status.is_success() {
						return response.json().await.map_err(|e| {
							TransportError::response_parse(
								format!("Failed to parse JSON response for '{}'", method),
								Some(Box::new(e)),
								None,
							)
						});
					}

					let error_body = response.text().await.unwrap_or_default();
					tracing::debug!(
						"{} on {} failed with status {}: {}",
						method,
						current_url,
						status,
						error_body
					);

					if !ROTATE_ON_ERROR_CODES.contains(&status.as_u16()) {
						return Err(TransportError::http(
							status,
							current_url,
							error_body,
							None,
							None,
						));
					}

					match self.try_rotate_url(transport).await {
						Ok(_) => continue,
						Err(rotation_error) => {
							return Err(TransportError::http(
								status,
								current_url,
								error_body,
								Some(Box::new(rotation_error)),
								None,
							));
						}
					}
				}
				SingleRequestAttemptOutcome::NetworkError(network_error) => {
					tracing::warn!("Network error for {}: {}", current_url, network_error);

					match self.try_rotate_url(transport).await {
						Ok(_) => continue,
						Err(rotation_error) => {
							return Err(TransportError::network(
								network_error.to_string(),
								Some(Box::new(rotation_error)),
								None,
							));
						}
					}
				}
				SingleRequestAttemptOutcome::SerializationError(serialization_error) => {
					return Err(serialization_error);
				}
			}
		}
	}
}
