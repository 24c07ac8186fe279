//! Secret values referenced from configuration.
//!
//! RPC URLs of commercial TON gateways embed API keys, so they are held in zeroizing wrappers and
//! may be supplied through the environment instead of the config file.

use serde::{Deserialize, Serialize};
use std::{collections::HashMap, env, fmt};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::models::security::error::{SecurityError, SecurityResult};

/// A secret that is either inlined in the configuration or read from an environment variable.
///
/// Serialized as `{"type": "plain", "value": "..."}` or `{"type": "environment", "value": "VAR"}`.
#[derive(Debug, Clone, Serialize, Deserialize, ZeroizeOnDrop)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
#[serde(deny_unknown_fields)]
pub enum SecretValue {
	/// A plain text secret value
	#[serde(alias = "Plain")]
	Plain(SecretString),
	/// Name of an environment variable holding the secret
	#[serde(alias = "Environment")]
	Environment(String),
}

impl PartialEq for SecretValue {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Plain(l0), Self::Plain(r0)) => l0.as_str() == r0.as_str(),
			(Self::Environment(l0), Self::Environment(r0)) => l0 == r0,
			_ => false,
		}
	}
}

/// A string that is zeroized when dropped.
#[derive(Debug, Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct SecretString(String);

impl PartialEq for SecretString {
	fn eq(&self, other: &Self) -> bool {
		self.0 == other.0
	}
}

impl SecretValue {
	/// Resolves the secret from its source.
	///
	/// # Errors
	///
	/// Returns a `SecurityError` if the referenced environment variable is not set.
	pub fn resolve(&self) -> SecurityResult<SecretString> {
		match self {
			SecretValue::Plain(secret) => Ok(secret.clone()),
			SecretValue::Environment(env_var) => {
				env::var(env_var).map(SecretString::new).map_err(|e| {
					Box::new(SecurityError::parse_error(
						format!("Failed to get environment variable {}", env_var),
						Some(e.into()),
						Some(HashMap::from([(
							"variable".to_string(),
							env_var.clone(),
						)])),
					))
				})
			}
		}
	}

	/// Checks if the secret value starts with a given prefix
	pub fn starts_with(&self, prefix: &str) -> bool {
		self.as_str().starts_with(prefix)
	}

	/// Checks if the secret value is empty
	pub fn is_empty(&self) -> bool {
		self.as_str().trim().is_empty()
	}

	/// Returns the secret value (or the variable name) as a string
	pub fn as_str(&self) -> &str {
		match self {
			SecretValue::Plain(secret) => secret.as_str(),
			SecretValue::Environment(env_var) => env_var,
		}
	}
}

impl Zeroize for SecretValue {
	fn zeroize(&mut self) {
		match self {
			SecretValue::Plain(secret) => secret.zeroize(),
			SecretValue::Environment(env_var) => env_var.zeroize(),
		}
	}
}

impl SecretString {
	/// Creates a new `SecretString` with the given value.
	pub fn new(value: String) -> Self {
		Self(value)
	}

	/// Gets a reference to the underlying string.
	///
	/// The reference should be used immediately and not stored.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl From<String> for SecretString {
	fn from(value: String) -> Self {
		Self::new(value)
	}
}

impl AsRef<str> for SecretString {
	fn as_ref(&self) -> &str {
		self.as_str()
	}
}

impl fmt::Display for SecretValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.as_str())
	}
}

impl AsRef<str> for SecretValue {
	fn as_ref(&self) -> &str {
		self.as_str()
	}
}
