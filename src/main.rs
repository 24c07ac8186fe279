//! TON shard scanner entry point.
//!
//! Tracks one shard of a TON workchain: every new masterchain block is inspected for the tracked
//! shard's block, and the shard chain is walked back to the last processed block so that every
//! block in between is emitted exactly in the order the walk visits it.
//!
//! # Flow
//! 1. Loads the configuration (`config/scanner.json` by default)
//! 2. Connects to the highest weighted reachable gateway and pins the scanner to it
//! 3. Restores the watermark and starts the event dispatch worker
//! 4. Runs the scanner until Ctrl+C, then stops the scanner and the worker

pub mod bootstrap;
pub mod models;
pub mod services;
pub mod utils;

use crate::{
	bootstrap::{check_connectivity, initialize_scanner, load_config, Result},
	models::ScannerConfig,
	utils::{
		logging::setup_logging,
		metrics::server::create_metrics_server,
		parsing::{format_shard_id, parse_shard_selector, parse_string_to_bytes_size},
	},
};

use clap::Parser;
use dotenvy::dotenv_override;
use std::env::{set_var, var};
use std::path::PathBuf;
use tokio::sync::watch;
use tracing::{error, info};

#[derive(Parser)]
#[command(
	name = "ton-shard-scanner",
	about = "Follows one TON shard chain and emits an event for every shard block it discovers.",
	version
)]
struct Cli {
	/// Path to the scanner configuration (default: config/scanner.json)
	#[arg(long, value_name = "PATH")]
	config: Option<PathBuf>,

	/// Shard selector byte overriding the configuration (e.g. 0, 128, 0x80)
	#[arg(long, value_name = "SELECTOR", value_parser = parse_shard_selector)]
	shard: Option<u8>,

	/// Write logs to file instead of stdout
	#[arg(long)]
	log_file: bool,

	/// Set log level (trace, debug, info, warn, error)
	#[arg(long, value_name = "LEVEL")]
	log_level: Option<String>,

	/// Path to store log files (default: logs/)
	#[arg(long, value_name = "PATH")]
	log_path: Option<String>,

	/// Maximum log file size before rolling (e.g., "1GB", "500MB", "1024KB")
	#[arg(long, value_name = "SIZE", value_parser = parse_string_to_bytes_size)]
	log_max_size: Option<u64>,

	/// Address to start the metrics server on (default: 127.0.0.1:8081)
	#[arg(long, value_name = "HOST:PORT")]
	metrics_address: Option<String>,

	/// Enable metrics server
	#[arg(long)]
	metrics: bool,

	/// Validate the configuration and gateway connectivity without starting the scanner
	#[arg(long)]
	check: bool,
}

impl Cli {
	/// Apply CLI options to environment variables, overriding any existing values
	fn apply_to_env(&self) {
		// Values from .env override the inherited environment
		dotenv_override().ok();

		if self.log_file {
			set_var("LOG_MODE", "file");
		}

		if let Ok(level) = var("RUST_LOG") {
			set_var("LOG_LEVEL", level);
		}

		if let Some(level) = &self.log_level {
			set_var("LOG_LEVEL", level);
			set_var("RUST_LOG", level);
		}

		if let Some(path) = &self.log_path {
			set_var("LOG_DATA_DIR", path);
		}

		if let Some(max_size) = &self.log_max_size {
			set_var("LOG_MAX_SIZE", max_size.to_string());
		}

		if self.metrics {
			set_var("METRICS_ENABLED", "true");
		}

		if let Some(address) = &self.metrics_address {
			if let Some(port) = address.split(':').nth(1) {
				set_var("METRICS_PORT", port);
			}
		}
	}
}

/// Main entry point for the shard scanner.
///
/// # Errors
/// Returns an error if the configuration is invalid, no gateway is reachable or the stored
/// watermark cannot be read.
#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();

	cli.apply_to_env();

	setup_logging().unwrap_or_else(|e| {
		error!("Failed to setup logging: {}", e);
	});

	let config = load_config(cli.config.as_deref(), cli.shard)
		.await
		.map_err(|e| anyhow::anyhow!("Failed to load scanner configuration: {}", e))?;

	if cli.check {
		return validate_configuration(&config).await;
	}

	let (scanner, worker) = initialize_scanner(&config).await?;

	let metrics_enabled =
		cli.metrics || var("METRICS_ENABLED").map(|v| v == "true").unwrap_or(false);

	let metrics_address = if var("IN_DOCKER").unwrap_or_default() == "true" {
		var("METRICS_PORT")
			.map(|port| format!("0.0.0.0:{}", port))
			.unwrap_or_else(|_| "0.0.0.0:8081".to_string())
	} else {
		cli.metrics_address
			.unwrap_or_else(|| "127.0.0.1:8081".to_string())
	};

	let metrics_server = if metrics_enabled {
		info!("Metrics server enabled, starting on {}", metrics_address);
		match create_metrics_server(metrics_address) {
			Ok(server) => Some(server),
			Err(e) => {
				error!("Failed to create metrics server: {}", e);
				None
			}
		}
	} else {
		info!("Metrics server disabled. Use --metrics flag or METRICS_ENABLED=true to enable");
		None
	};

	let (shutdown_tx, shutdown_rx) = watch::channel(false);
	let worker_handle = worker.spawn(shutdown_rx.clone());
	let scanner_handle = tokio::spawn(scanner.run(shutdown_rx));

	info!(
		"Scanner '{}' started for shard selector {:#04x}. Press Ctrl+C to shutdown",
		config.slug, config.shard_selector
	);

	let ctrl_c = tokio::signal::ctrl_c();

	if let Some(metrics_future) = metrics_server {
		tokio::select! {
			result = ctrl_c => {
				if let Err(e) = result {
					error!("Error waiting for Ctrl+C: {}", e);
				}
				info!("Shutdown signal received, stopping services...");
			}
			result = metrics_future => {
				if let Err(e) = result {
					error!("Metrics server error: {}", e);
				}
				info!("Metrics server stopped, shutting down services...");
			}
		}
	} else {
		let _ = ctrl_c.await;
		info!("Shutdown signal received, stopping services...");
	}

	let _ = shutdown_tx.send(true);

	if let Err(e) = scanner_handle.await {
		error!("Scanner task failed: {}", e);
	}
	match worker_handle.await {
		Ok(dispatched) => info!("Dispatch worker stopped after {} events", dispatched),
		Err(e) => error!("Dispatch worker failed: {}", e),
	}

	info!("Shutdown complete");
	Ok(())
}

/// Validates the loaded configuration and reads the masterchain head once
async fn validate_configuration(config: &ScannerConfig) -> Result<()> {
	info!("Validating scanner configuration...");
	info!(
		"✓ Configuration '{}' loaded, tracking workchain {} shard selector {:#04x}",
		config.slug, config.workchain, config.shard_selector
	);

	match check_connectivity(config).await {
		Ok(head) => {
			info!(
				"✓ Gateway reachable, masterchain head {} in shard {}",
				head.seqno(),
				format_shard_id(head.block.shard)
			);
			info!("Configuration validation completed successfully!");
			Ok(())
		}
		Err(e) => {
			error!("Gateway connectivity check failed: {}", e);
			Err(e)
		}
	}
}
