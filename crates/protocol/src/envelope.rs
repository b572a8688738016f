//! W3C response envelopes.
//!
//! Every response body is `{"value": ...}`. Errors carry
//! `{"value": {"error": "...", "message": "...", "stacktrace": "..."}}`.

use serde::Deserialize;
use serde_json::Value;

use crate::types::CapabilityValue;

/// Error payload of a failed command.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WireError {
	/// W3C error code such as `no such element`.
	pub error: String,
	#[serde(default)]
	pub message: String,
	#[serde(default)]
	pub stacktrace: Option<String>,
}

impl WireError {
	/// Extracts an error payload from a response body, if it is one.
	pub fn from_body(body: &Value) -> Option<Self> {
		let value = body.get("value")?;
		value.get("error")?.as_str()?;
		serde_json::from_value(value.clone()).ok()
	}
}

/// Successful new-session response value.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSessionValue {
	pub session_id: String,
	#[serde(default)]
	pub capabilities: serde_json::Map<String, Value>,
}

impl NewSessionValue {
	/// Capability echoed back by the server, with or without the `appium:` prefix.
	pub fn capability(&self, name: &str) -> Option<CapabilityValue> {
		self.capabilities
			.get(name)
			.or_else(|| self.capabilities.get(&format!("appium:{name}")))
			.and_then(|v| serde_json::from_value(v.clone()).ok())
	}
}

/// Unwraps the `value` member of a response body; missing means `null`.
pub fn into_value(body: Value) -> Value {
	match body {
		Value::Object(mut map) => map.remove("value").unwrap_or(Value::Null),
		_ => Value::Null,
	}
}
