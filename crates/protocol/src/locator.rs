//! Element location strategies.

use serde::{Deserialize, Serialize};

/// Location strategy understood by the automation server.
///
/// The serialized names are the `using` values of the find-element endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strategy {
	/// Accessibility identifier (content-description on Android, accessibilityIdentifier on iOS).
	#[serde(rename = "accessibility id")]
	AccessibilityId,
	/// Native resource id.
	#[serde(rename = "id")]
	Id,
	/// XPath over the native view hierarchy.
	#[serde(rename = "xpath")]
	XPath,
	/// Native widget class name.
	#[serde(rename = "class name")]
	ClassName,
	/// UiAutomator selector expression (Android only).
	#[serde(rename = "-android uiautomator")]
	AndroidUiAutomator,
	/// NSPredicate string (iOS only).
	#[serde(rename = "-ios predicate string")]
	IosPredicate,
	/// XCUITest class chain (iOS only).
	#[serde(rename = "-ios class chain")]
	IosClassChain,
}

impl Strategy {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::AccessibilityId => "accessibility id",
			Self::Id => "id",
			Self::XPath => "xpath",
			Self::ClassName => "class name",
			Self::AndroidUiAutomator => "-android uiautomator",
			Self::IosPredicate => "-ios predicate string",
			Self::IosClassChain => "-ios class chain",
		}
	}
}

impl std::fmt::Display for Strategy {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A strategy/value pair identifying an element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
	#[serde(rename = "using")]
	pub strategy: Strategy,
	pub value: String,
}

impl Locator {
	pub fn new(strategy: Strategy, value: impl Into<String>) -> Self {
		Self {
			strategy,
			value: value.into(),
		}
	}

	pub fn accessibility_id(value: impl Into<String>) -> Self {
		Self::new(Strategy::AccessibilityId, value)
	}

	pub fn id(value: impl Into<String>) -> Self {
		Self::new(Strategy::Id, value)
	}

	pub fn xpath(value: impl Into<String>) -> Self {
		Self::new(Strategy::XPath, value)
	}

	pub fn class_name(value: impl Into<String>) -> Self {
		Self::new(Strategy::ClassName, value)
	}

	pub fn android_uiautomator(value: impl Into<String>) -> Self {
		Self::new(Strategy::AndroidUiAutomator, value)
	}

	pub fn ios_predicate(value: impl Into<String>) -> Self {
		Self::new(Strategy::IosPredicate, value)
	}

	pub fn ios_class_chain(value: impl Into<String>) -> Self {
		Self::new(Strategy::IosClassChain, value)
	}
}

impl std::fmt::Display for Locator {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}={:?}", self.strategy, self.value)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn locator_serializes_with_w3c_field_names() {
		let locator = Locator::accessibility_id("Log in");
		let json = serde_json::to_value(&locator).unwrap();
		assert_eq!(json, serde_json::json!({ "using": "accessibility id", "value": "Log in" }));
	}

	#[test]
	fn vendor_strategies_keep_their_prefix() {
		let json = serde_json::to_value(Locator::android_uiautomator("new UiSelector()")).unwrap();
		assert_eq!(json["using"], "-android uiautomator");
		assert_eq!(Strategy::IosClassChain.to_string(), "-ios class chain");
	}

	#[test]
	fn display_quotes_value() {
		assert_eq!(Locator::id("login").to_string(), "id=\"login\"");
	}
}
