//! Supported platforms and their per-platform session table.
//!
//! Everything that differs between Android and iOS lives in one
//! [`PlatformProfile`] row: which config keys map onto which capabilities,
//! which policy defaults apply, and how the new-session response is
//! confirmed. The capability builder and the driver factory both read the
//! same row, so there is no second platform switch to drift out of sync.

use std::str::FromStr;

use mobdrive_protocol::{CapabilityValue, NewSessionValue};

use crate::config::keys;
use crate::error::{Error, Result};

/// Mobile platform targeted by a test run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
	Android,
	Ios,
}

impl Platform {
	pub const ALL: [Platform; 2] = [Platform::Android, Platform::Ios];

	/// Lowercase configuration name.
	pub fn as_str(&self) -> &'static str {
		match self {
			Platform::Android => "android",
			Platform::Ios => "ios",
		}
	}

	/// Session table row for this platform.
	pub fn profile(&self) -> &'static PlatformProfile {
		match self {
			Platform::Android => &ANDROID,
			Platform::Ios => &IOS,
		}
	}
}

impl std::fmt::Display for Platform {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Platform {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		match s.trim().to_ascii_lowercase().as_str() {
			"android" => Ok(Platform::Android),
			"ios" => Ok(Platform::Ios),
			_ => Err(Error::UnsupportedPlatform(s.trim().to_string())),
		}
	}
}

/// How a configuration string is converted into a capability value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
	Str,
	Int,
}

/// Maps one configuration key onto one capability.
#[derive(Debug, Clone, Copy)]
pub struct CapabilityBinding {
	pub capability: &'static str,
	pub key: &'static str,
	pub kind: ValueKind,
}

const fn bind(capability: &'static str, key: &'static str) -> CapabilityBinding {
	CapabilityBinding {
		capability,
		key,
		kind: ValueKind::Str,
	}
}

const fn bind_int(capability: &'static str, key: &'static str) -> CapabilityBinding {
	CapabilityBinding {
		capability,
		key,
		kind: ValueKind::Int,
	}
}

/// Documented default capability applied regardless of configuration.
#[derive(Debug, Clone, Copy)]
pub enum PolicyValue {
	Bool(bool),
	Int(i64),
	Str(&'static str),
}

impl From<PolicyValue> for CapabilityValue {
	fn from(value: PolicyValue) -> Self {
		match value {
			PolicyValue::Bool(b) => CapabilityValue::Bool(b),
			PolicyValue::Int(i) => CapabilityValue::Int(i),
			PolicyValue::Str(s) => CapabilityValue::Str(s.to_string()),
		}
	}
}

/// Confirms a freshly opened session belongs to the requested platform.
pub type Handshake = fn(&NewSessionValue) -> Result<()>;

/// Per-platform session table row.
pub struct PlatformProfile {
	pub platform: Platform,
	/// Value of the `automationName` capability.
	pub automation_name: &'static str,
	/// Value of the W3C `platformName` capability.
	pub platform_name: &'static str,
	/// Bindings that must resolve or capability construction fails.
	pub required: &'static [CapabilityBinding],
	/// Bindings copied only when the key is configured.
	pub optional: &'static [CapabilityBinding],
	/// Platform policy defaults.
	pub policy: &'static [(&'static str, PolicyValue)],
	/// Confirmation routine run on the new-session response.
	pub handshake: Handshake,
}

impl PlatformProfile {
	/// Capability names every built set must contain.
	pub fn mandatory_capabilities(&self) -> impl Iterator<Item = &'static str> + '_ {
		["automationName", "platformName"]
			.into_iter()
			.chain(self.required.iter().map(|b| b.capability))
	}
}

static ANDROID: PlatformProfile = PlatformProfile {
	platform: Platform::Android,
	automation_name: "UiAutomator2",
	platform_name: "Android",
	required: &[
		bind("platformVersion", keys::ANDROID_PLATFORM_VERSION),
		bind("deviceName", keys::ANDROID_DEVICE_NAME),
		bind("app", keys::ANDROID_APP),
	],
	optional: &[bind_int("newCommandTimeout", keys::NEW_COMMAND_TIMEOUT)],
	// Runtime permission dialogs would otherwise block the first screen.
	policy: &[("autoGrantPermissions", PolicyValue::Bool(true))],
	handshake: confirm_android,
};

static IOS: PlatformProfile = PlatformProfile {
	platform: Platform::Ios,
	automation_name: "XCUITest",
	platform_name: "iOS",
	required: &[
		bind("platformVersion", keys::IOS_PLATFORM_VERSION),
		bind("deviceName", keys::IOS_DEVICE_NAME),
		bind("bundleId", keys::IOS_BUNDLE_ID),
	],
	optional: &[
		bind("app", keys::IOS_APP),
		bind_int("newCommandTimeout", keys::NEW_COMMAND_TIMEOUT),
	],
	// System alerts (notifications, tracking) are dismissed instead of blocking.
	policy: &[("autoDismissAlerts", PolicyValue::Bool(true))],
	handshake: confirm_ios,
};

fn confirm_android(session: &NewSessionValue) -> Result<()> {
	confirm_platform_name(ANDROID.platform_name, session)
}

fn confirm_ios(session: &NewSessionValue) -> Result<()> {
	confirm_platform_name(IOS.platform_name, session)
}

/// Servers that echo `platformName` must echo the requested one.
fn confirm_platform_name(expected: &str, session: &NewSessionValue) -> Result<()> {
	match session.capability("platformName") {
		Some(CapabilityValue::Str(reported)) if !reported.eq_ignore_ascii_case(expected) => Err(Error::Protocol(format!(
			"server opened a '{reported}' session (id {}), expected '{expected}'",
			session.session_id
		))),
		_ => Ok(()),
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	fn session(caps: serde_json::Value) -> NewSessionValue {
		serde_json::from_value(json!({ "sessionId": "s", "capabilities": caps })).unwrap()
	}

	#[test]
	fn parses_known_platforms() {
		assert_eq!("android".parse::<Platform>().unwrap(), Platform::Android);
		assert_eq!(" iOS ".parse::<Platform>().unwrap(), Platform::Ios);
	}

	#[test]
	fn rejects_unknown_platforms() {
		let err = "windows".parse::<Platform>().unwrap_err();
		assert!(matches!(err, Error::UnsupportedPlatform(ref p) if p == "windows"));
	}

	#[test]
	fn every_profile_belongs_to_its_platform() {
		for platform in Platform::ALL {
			assert_eq!(platform.profile().platform, platform);
		}
	}

	#[test]
	fn mandatory_capabilities_cover_app_identity() {
		let android: Vec<_> = Platform::Android.profile().mandatory_capabilities().collect();
		assert!(android.contains(&"app"));
		let ios: Vec<_> = Platform::Ios.profile().mandatory_capabilities().collect();
		assert!(ios.contains(&"bundleId"));
		assert!(ios.contains(&"deviceName"));
	}

	#[test]
	fn handshake_accepts_matching_or_absent_platform() {
		let handshake = Platform::Android.profile().handshake;
		assert!(handshake(&session(json!({ "platformName": "android" }))).is_ok());
		assert!(handshake(&session(json!({}))).is_ok());
	}

	#[test]
	fn handshake_rejects_other_platform() {
		let handshake = Platform::Ios.profile().handshake;
		let err = handshake(&session(json!({ "platformName": "Android" }))).unwrap_err();
		assert!(matches!(err, Error::Protocol(_)));
	}
}
