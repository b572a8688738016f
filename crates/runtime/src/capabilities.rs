//! Capability set construction.

use std::collections::BTreeMap;

use mobdrive_protocol::CapabilityValue;
use serde_json::{Map, Value};

use crate::config::TestConfig;
use crate::error::{Error, Result};
use crate::platform::{CapabilityBinding, Platform, ValueKind};

/// Capabilities defined by W3C itself; everything else needs a vendor prefix.
const W3C_STANDARD: &[&str] = &[
	"browserName",
	"browserVersion",
	"platformName",
	"acceptInsecureCerts",
	"pageLoadStrategy",
	"proxy",
	"setWindowRect",
	"timeouts",
	"strictFileInteractability",
	"unhandledPromptBehavior",
];

const VENDOR_PREFIX: &str = "appium:";

/// Immutable description of how to start a session on one platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilitySet {
	platform: Platform,
	values: BTreeMap<String, CapabilityValue>,
}

impl CapabilitySet {
	/// Builds the capability set for `platform` from `config`.
	///
	/// Every mandatory binding of the platform profile must resolve to a
	/// non-empty configuration value; the first missing one is reported by key.
	pub fn build(platform: Platform, config: &TestConfig) -> Result<Self> {
		let profile = platform.profile();
		let mut values = BTreeMap::new();

		values.insert("automationName".to_string(), CapabilityValue::from(profile.automation_name));
		values.insert("platformName".to_string(), CapabilityValue::from(profile.platform_name));

		for binding in profile.required {
			let value = resolve(binding, config)?
				.ok_or_else(|| Error::config(binding.key, format!("required for {platform} capability '{}'", binding.capability)))?;
			values.insert(binding.capability.to_string(), value);
		}

		for binding in profile.optional {
			if let Some(value) = resolve(binding, config)? {
				values.insert(binding.capability.to_string(), value);
			}
		}

		for (name, value) in profile.policy {
			values.insert((*name).to_string(), CapabilityValue::from(*value));
		}

		Ok(Self { platform, values })
	}

	/// Builds capabilities for the platform named in `config`.
	pub fn for_config(config: &TestConfig) -> Result<Self> {
		Self::build(config.platform()?, config)
	}

	pub fn platform(&self) -> Platform {
		self.platform
	}

	pub fn get(&self, name: &str) -> Option<&CapabilityValue> {
		self.values.get(name)
	}

	pub fn contains(&self, name: &str) -> bool {
		self.values.contains_key(name)
	}

	pub fn len(&self) -> usize {
		self.values.len()
	}

	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &CapabilityValue)> {
		self.values.iter().map(|(k, v)| (k.as_str(), v))
	}

	/// W3C `alwaysMatch` object, with non-standard names vendor-prefixed.
	pub fn to_w3c(&self) -> Value {
		let map: Map<String, Value> = self
			.values
			.iter()
			.map(|(name, value)| {
				let key = if W3C_STANDARD.contains(&name.as_str()) || name.contains(':') {
					name.clone()
				} else {
					format!("{VENDOR_PREFIX}{name}")
				};
				(key, serde_json::to_value(value).unwrap_or(Value::Null))
			})
			.collect();
		Value::Object(map)
	}
}

fn resolve(binding: &CapabilityBinding, config: &TestConfig) -> Result<Option<CapabilityValue>> {
	match binding.kind {
		ValueKind::Str => Ok(config.get(binding.key).map(CapabilityValue::from)),
		ValueKind::Int => config
			.get_u64(binding.key)?
			.map(|n| {
				i64::try_from(n)
					.map(CapabilityValue::Int)
					.map_err(|_| Error::config(binding.key, format!("value {n} is out of range")))
			})
			.transpose(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::keys;

	fn full_config() -> TestConfig {
		TestConfig::from_pairs([
			(keys::ANDROID_PLATFORM_VERSION, "14"),
			(keys::ANDROID_DEVICE_NAME, "Pixel 8"),
			(keys::ANDROID_APP, "/apps/app.apk"),
			(keys::IOS_PLATFORM_VERSION, "18.6"),
			(keys::IOS_DEVICE_NAME, "iPhone 16 Pro"),
			(keys::IOS_BUNDLE_ID, "com.example.app"),
		])
	}

	#[test]
	fn every_platform_gets_every_mandatory_capability() {
		let config = full_config();
		for platform in Platform::ALL {
			let caps = CapabilitySet::build(platform, &config).unwrap();
			for name in platform.profile().mandatory_capabilities() {
				assert!(caps.contains(name), "{platform} missing {name}");
			}
		}
	}

	#[test]
	fn removing_any_required_key_fails_with_that_key() {
		for platform in Platform::ALL {
			for binding in platform.profile().required {
				let config = full_config().without(binding.key);
				match CapabilitySet::build(platform, &config) {
					Err(Error::Configuration { key, .. }) => assert_eq!(key, binding.key),
					other => panic!("{platform} without {}: unexpected {other:?}", binding.key),
				}
			}
		}
	}

	#[test]
	fn policy_defaults_are_applied_per_platform() {
		let config = full_config();
		let android = CapabilitySet::build(Platform::Android, &config).unwrap();
		assert_eq!(android.get("autoGrantPermissions"), Some(&CapabilityValue::Bool(true)));
		assert!(android.get("autoDismissAlerts").is_none());

		let ios = CapabilitySet::build(Platform::Ios, &config).unwrap();
		assert_eq!(ios.get("autoDismissAlerts"), Some(&CapabilityValue::Bool(true)));
		assert_eq!(ios.get("automationName"), Some(&CapabilityValue::from("XCUITest")));
	}

	#[test]
	fn optional_keys_are_copied_when_present() {
		let config = full_config().with(keys::IOS_APP, "/apps/Runner.app").with(keys::NEW_COMMAND_TIMEOUT, "300");
		let ios = CapabilitySet::build(Platform::Ios, &config).unwrap();
		assert_eq!(ios.get("app"), Some(&CapabilityValue::from("/apps/Runner.app")));
		assert_eq!(ios.get("newCommandTimeout"), Some(&CapabilityValue::Int(300)));

		let bare = CapabilitySet::build(Platform::Ios, &full_config()).unwrap();
		assert!(!bare.contains("app"));
	}

	#[test]
	fn malformed_optional_integer_fails() {
		let config = full_config().with(keys::NEW_COMMAND_TIMEOUT, "soon");
		assert!(matches!(
			CapabilitySet::build(Platform::Android, &config),
			Err(Error::Configuration { ref key, .. }) if key == keys::NEW_COMMAND_TIMEOUT
		));
	}

	#[test]
	fn integer_beyond_i64_is_rejected_not_wrapped() {
		let config = full_config().with(keys::NEW_COMMAND_TIMEOUT, u64::MAX.to_string());
		let err = CapabilitySet::build(Platform::Android, &config).unwrap_err();
		assert!(matches!(err, Error::Configuration { ref key, .. } if key == keys::NEW_COMMAND_TIMEOUT));
		assert!(err.to_string().contains("out of range"));
	}

	#[test]
	fn build_is_deterministic() {
		let config = full_config();
		assert_eq!(
			CapabilitySet::build(Platform::Android, &config).unwrap(),
			CapabilitySet::build(Platform::Android, &config).unwrap()
		);
	}

	#[test]
	fn w3c_payload_prefixes_vendor_capabilities() {
		let caps = CapabilitySet::build(Platform::Android, &full_config()).unwrap();
		let w3c = caps.to_w3c();
		assert_eq!(w3c["platformName"], "Android");
		assert_eq!(w3c["appium:deviceName"], "Pixel 8");
		assert_eq!(w3c["appium:automationName"], "UiAutomator2");
		assert_eq!(w3c["appium:autoGrantPermissions"], true);
		assert!(w3c.get("deviceName").is_none());
	}

	#[test]
	fn for_config_reads_platform() {
		let config = full_config().with(keys::PLATFORM, "ios");
		assert_eq!(CapabilitySet::for_config(&config).unwrap().platform(), Platform::Ios);

		let unsupported = full_config().with(keys::PLATFORM, "windows");
		assert!(matches!(CapabilitySet::for_config(&unsupported), Err(Error::UnsupportedPlatform(_))));
	}
}
