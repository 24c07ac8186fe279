//! ## Sets up logging by reading configuration from environment variables.
//!
//! Environment variables used:
//! - LOG_MODE: "stdout" (default) or "file"
//! - LOG_LEVEL: log level ("trace", "debug", "info", "warn", "error"); default is "info"
//! - LOG_DATA_DIR: directory for log files; default is "logs/"
//! - LOG_MAX_SIZE: maximum size of a log file in bytes before a new one is started; default is 1GB
//! - IN_DOCKER: "true" if running in Docker; forces the log directory to "logs/"

pub mod error;

use chrono::Utc;
use lazy_static::lazy_static;
use regex::Regex;
use std::{
	env,
	fs::{create_dir_all, metadata},
	path::Path,
};
use tracing::{info, Subscriber};
use tracing_subscriber::{
	filter::EnvFilter,
	fmt::{self, format::Writer, FmtContext, FormatEvent, FormatFields},
	prelude::*,
	registry::LookupSpan,
};

const DEFAULT_LOG_MAX_SIZE: u64 = 1_073_741_824;
const LOG_FILE_NAME: &str = "scanner.log";

lazy_static! {
	static ref ANSI_ESCAPE: Regex = Regex::new(r"\x1b\[[0-9;]*[a-zA-Z]").unwrap();
}

/// Logging settings resolved from the environment
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
	pub to_file: bool,
	pub level: tracing::Level,
	pub log_dir: String,
	pub max_size: u64,
}

impl LoggingSettings {
	/// Reads the `LOG_*` variables. Fails only on a malformed `LOG_MAX_SIZE`.
	pub fn from_env() -> Result<Self, String> {
		let to_file = env::var("LOG_MODE")
			.map(|mode| mode.eq_ignore_ascii_case("file"))
			.unwrap_or(false);

		let level = match env::var("LOG_LEVEL")
			.unwrap_or_default()
			.to_lowercase()
			.as_str()
		{
			"trace" => tracing::Level::TRACE,
			"debug" => tracing::Level::DEBUG,
			"warn" => tracing::Level::WARN,
			"error" => tracing::Level::ERROR,
			_ => tracing::Level::INFO,
		};

		let in_docker = env::var("IN_DOCKER").map(|v| v == "true").unwrap_or(false);
		let log_dir = if in_docker {
			"logs/".to_string()
		} else {
			env::var("LOG_DATA_DIR").unwrap_or_else(|_| "logs/".to_string())
		};

		let max_size = match env::var("LOG_MAX_SIZE") {
			Ok(raw) => raw
				.parse::<u64>()
				.map_err(|e| format!("LOG_MAX_SIZE must be a valid u64 if set: {}", e))?,
			Err(_) => DEFAULT_LOG_MAX_SIZE,
		};

		Ok(Self {
			to_file,
			level,
			log_dir: format!("{}/", log_dir.trim_end_matches('/')),
			max_size,
		})
	}
}

/// Strips ANSI escape codes before events reach a log file
struct StripAnsiFormatter<T> {
	inner: T,
}

impl<S, N, T> FormatEvent<S, N> for StripAnsiFormatter<T>
where
	S: Subscriber + for<'a> LookupSpan<'a>,
	N: for<'a> FormatFields<'a> + 'static,
	T: FormatEvent<S, N>,
{
	fn format_event(
		&self,
		ctx: &FmtContext<'_, S, N>,
		mut writer: Writer<'_>,
		event: &tracing::Event<'_>,
	) -> std::fmt::Result {
		let mut buf = String::new();
		self.inner.format_event(ctx, Writer::new(&mut buf), event)?;
		write!(writer, "{}", strip_ansi_escapes(&buf))
	}
}

fn strip_ansi_escapes(s: &str) -> String {
	ANSI_ESCAPE.replace_all(s, "").to_string()
}

/// Computes the path of the rolled log file given the base file path and the date string.
pub fn compute_rolled_file_path(base_file_path: &str, date_str: &str, index: u32) -> String {
	let trimmed = base_file_path
		.strip_suffix(".log")
		.unwrap_or(base_file_path);
	format!("{}-{}.{}.log", trimmed, date_str, index)
}

/// Returns the first rolled path for `date_str` whose file is missing or still below `max_size`.
pub fn space_based_rolling(
	file_path: &str,
	base_file_path: &str,
	date_str: &str,
	max_size: u64,
) -> String {
	let mut final_path = file_path.to_string();
	let mut index = 1;
	while let Ok(metadata) = metadata(&final_path) {
		if metadata.len() <= max_size {
			break;
		}
		index += 1;
		final_path = compute_rolled_file_path(base_file_path, date_str, index);
	}
	final_path
}

fn create_log_format(with_ansi: bool) -> fmt::format::Format<fmt::format::Compact> {
	fmt::format()
		.with_level(true)
		.with_target(true)
		.with_thread_ids(false)
		.with_thread_names(false)
		.with_ansi(with_ansi)
		.compact()
}

/// Sets up logging by reading configuration from environment variables.
pub fn setup_logging() -> Result<(), Box<dyn std::error::Error>> {
	let settings = LoggingSettings::from_env()?;
	let subscriber = tracing_subscriber::registry().with(EnvFilter::new(settings.level.to_string()));

	if settings.to_file {
		let base_file_path = format!("{}{}", settings.log_dir, LOG_FILE_NAME);
		let date_str = Utc::now().format("%Y-%m-%d").to_string();
		let time_based_path = compute_rolled_file_path(&base_file_path, &date_str, 1);

		if let Some(parent) = Path::new(&time_based_path).parent() {
			create_dir_all(parent)?;
		}

		let final_path = space_based_rolling(
			&time_based_path,
			&base_file_path,
			&date_str,
			settings.max_size,
		);

		let final_path = Path::new(&final_path);
		let file_appender = tracing_appender::rolling::never(
			final_path.parent().unwrap_or(Path::new(".")),
			final_path.file_name().unwrap_or_default(),
		);

		subscriber
			.with(
				fmt::layer()
					.event_format(StripAnsiFormatter {
						inner: create_log_format(false),
					})
					.with_writer(file_appender)
					.fmt_fields(fmt::format::PrettyFields::new()),
			)
			.try_init()?;
	} else {
		subscriber
			.with(
				fmt::layer()
					.event_format(create_log_format(true))
					.fmt_fields(fmt::format::PrettyFields::new()),
			)
			.try_init()?;
	}

	info!(
		"Logging is successfully configured (mode: {}, level: {})",
		if settings.to_file { "file" } else { "stdout" },
		settings.level
	);
	Ok(())
}
