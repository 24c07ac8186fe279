//! Parsing utilities
//!
//! CLI value parsers and the textual forms of TON shard identifiers.

use byte_unit::Byte;
use std::str::FromStr;

/// Parses a string argument into a `u64` value representing a file size.
///
/// Accepts human-readable formats like "1GB", "500MB", "1024KB", etc.
pub fn parse_string_to_bytes_size(s: &str) -> Result<u64, String> {
	match Byte::from_str(s) {
		Ok(byte) => Ok(byte.as_u64()),
		Err(e) => Err(format!("Invalid size format: '{}'. Error: {}", s, e)),
	}
}

/// Parses a one-byte shard selector.
///
/// Accepts decimal (`128`) or hex with a `0x` prefix (`0x80`).
pub fn parse_shard_selector(s: &str) -> Result<u8, String> {
	let trimmed = s.trim();
	let parsed = match trimmed
		.strip_prefix("0x")
		.or_else(|| trimmed.strip_prefix("0X"))
	{
		Some(hex) => u8::from_str_radix(hex, 16),
		None => trimmed.parse::<u8>(),
	};
	parsed.map_err(|e| format!("Invalid shard selector '{}': {}", s, e))
}

/// Parses a shard identifier as sent by TON RPC gateways.
///
/// Gateways send the signed 64-bit value as a decimal string (`"-9223372036854775808"`). The
/// unsigned hex form printed by explorers is accepted only with a `0x` prefix
/// (`"0x8000000000000000"`); unprefixed input is always decimal.
pub fn parse_shard_id(s: &str) -> Result<i64, String> {
	let trimmed = s.trim();
	let parsed = match trimmed
		.strip_prefix("0x")
		.or_else(|| trimmed.strip_prefix("0X"))
	{
		Some(hex) => u64::from_str_radix(hex, 16).map(|value| value as i64).ok(),
		None => trimmed.parse::<i64>().ok(),
	};
	parsed.ok_or_else(|| format!("Invalid shard identifier: '{}'", s))
}

/// Formats a shard identifier in the 16-digit hex form used in TON explorers.
pub fn format_shard_id(shard: i64) -> String {
	format!("{:016x}", shard as u64)
}
