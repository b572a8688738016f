//! Test-run configuration.
//!
//! Configuration is a flat map of dotted keys (`appium.serverUrl`,
//! `android.deviceName`, ...). JSON files are flattened into that shape, so
//! `{"android": {"deviceName": "Pixel"}}` and `{"android.deviceName": "Pixel"}`
//! are equivalent. Accessors fail with [`Error::Configuration`] naming the
//! offending key.
//!
//! The process-wide instance is loaded lazily by [`TestConfig::global`] and is
//! immutable afterwards.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::platform::Platform;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "MOBDRIVE_CONFIG";
/// Configuration file used when neither a path nor [`CONFIG_ENV`] is given.
pub const DEFAULT_CONFIG_FILE: &str = "test-config.json";

/// Well-known configuration keys.
pub mod keys {
	pub const PLATFORM: &str = "platform";
	pub const SERVER_URL: &str = "appium.serverUrl";
	pub const IMPLICIT_WAIT: &str = "appium.implicitWait";
	pub const NEW_COMMAND_TIMEOUT: &str = "appium.newCommandTimeout";

	pub const ANDROID_PLATFORM_VERSION: &str = "android.platformVersion";
	pub const ANDROID_DEVICE_NAME: &str = "android.deviceName";
	pub const ANDROID_APP: &str = "android.app";

	pub const IOS_PLATFORM_VERSION: &str = "ios.platformVersion";
	pub const IOS_DEVICE_NAME: &str = "ios.deviceName";
	pub const IOS_BUNDLE_ID: &str = "ios.bundleId";
	pub const IOS_APP: &str = "ios.app";

	pub const TEST_USERNAME: &str = "test.username";
	pub const TEST_PASSWORD: &str = "test.password";

	pub const VIDEOS_DIR: &str = "artifacts.videosDir";
	pub const SCREENSHOTS_DIR: &str = "artifacts.screenshotsDir";
}

static GLOBAL: OnceLock<TestConfig> = OnceLock::new();
static GLOBAL_INIT: Mutex<()> = Mutex::new(());

/// Validated-on-access configuration for one test run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestConfig {
	values: BTreeMap<String, String>,
	source: Option<PathBuf>,
}

/// Login credentials for the application under test.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
	pub username: String,
	pub password: String,
}

impl std::fmt::Debug for Credentials {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Credentials")
			.field("username", &self.username)
			.field("password", &"<redacted>")
			.finish()
	}
}

impl TestConfig {
	/// Builds a configuration from explicit key/value pairs.
	pub fn from_pairs<I, K, V>(pairs: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		Self {
			values: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
			source: None,
		}
	}

	/// Parses a JSON document, flattening nested objects into dotted keys.
	pub fn from_json_str(content: &str) -> Result<Self> {
		let root: Value = serde_json::from_str(content)?;
		let Value::Object(map) = root else {
			return Err(Error::config("<root>", "configuration must be a JSON object"));
		};

		let mut values = BTreeMap::new();
		for (key, value) in map {
			flatten_into(&mut values, key, value)?;
		}

		Ok(Self { values, source: None })
	}

	/// Loads a JSON configuration file.
	pub fn load(path: &Path) -> Result<Self> {
		let content = match std::fs::read_to_string(path) {
			Ok(c) => c,
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
				return Err(Error::config("<file>", format!("configuration file '{}' not found", path.display())));
			}
			Err(err) => return Err(Error::Io(err)),
		};

		let mut config = Self::from_json_str(&content)?;
		config.source = Some(path.to_path_buf());
		debug!(target = "mobdrive.config", path = %path.display(), keys = config.values.len(), "configuration loaded");
		Ok(config)
	}

	/// Resolves the configuration path: explicit, then [`CONFIG_ENV`], then [`DEFAULT_CONFIG_FILE`].
	pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
		explicit
			.map(Path::to_path_buf)
			.or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
			.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
	}

	/// Returns the process-wide configuration, loading it on first use.
	pub fn global() -> Result<&'static TestConfig> {
		if let Some(config) = GLOBAL.get() {
			return Ok(config);
		}

		let _guard = GLOBAL_INIT.lock();
		if let Some(config) = GLOBAL.get() {
			return Ok(config);
		}

		let config = Self::load(&Self::resolve_path(None))?;
		Ok(GLOBAL.get_or_init(|| config))
	}

	/// Installs `config` as the process-wide configuration.
	///
	/// The first installed (or lazily loaded) configuration wins; later calls
	/// return the existing instance.
	pub fn install(config: TestConfig) -> &'static TestConfig {
		let _guard = GLOBAL_INIT.lock();
		if let Some(existing) = GLOBAL.get() {
			warn!(target = "mobdrive.config", "configuration already loaded; ignoring replacement");
			return existing;
		}
		GLOBAL.get_or_init(|| config)
	}

	/// Returns a copy with `key` set to `value`.
	pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.values.insert(key.into(), value.into());
		self
	}

	/// Returns a copy without `key`.
	pub fn without(mut self, key: &str) -> Self {
		self.values.remove(key);
		self
	}

	/// File this configuration was loaded from, if any.
	pub fn source(&self) -> Option<&Path> {
		self.source.as_deref()
	}

	/// Returns a non-empty value for `key`.
	pub fn get(&self, key: &str) -> Option<&str> {
		self.values.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
	}

	/// Returns the value for `key` or a configuration error naming it.
	pub fn require(&self, key: &str) -> Result<&str> {
		self.get(key)
			.ok_or_else(|| Error::config(key, "property not found in configuration"))
	}

	/// Parses an optional unsigned integer value.
	pub fn get_u64(&self, key: &str) -> Result<Option<u64>> {
		self.get(key)
			.map(|raw| {
				raw.parse::<u64>()
					.map_err(|_| Error::config(key, format!("expected a non-negative integer, got '{raw}'")))
			})
			.transpose()
	}

	/// Parses a mandatory unsigned integer value.
	pub fn require_u64(&self, key: &str) -> Result<u64> {
		self.get_u64(key)?
			.ok_or_else(|| Error::config(key, "property not found in configuration"))
	}

	/// Target platform. Unknown values fail with [`Error::UnsupportedPlatform`].
	pub fn platform(&self) -> Result<Platform> {
		self.require(keys::PLATFORM)?.parse()
	}

	/// Automation server endpoint, unvalidated.
	pub fn server_url(&self) -> Result<&str> {
		self.require(keys::SERVER_URL)
	}

	/// Session-wide implicit wait.
	pub fn implicit_wait(&self) -> Result<Duration> {
		self.require_u64(keys::IMPLICIT_WAIT).map(Duration::from_secs)
	}

	/// Test account for the application under test.
	pub fn credentials(&self) -> Result<Credentials> {
		Ok(Credentials {
			username: self.require(keys::TEST_USERNAME)?.to_string(),
			password: self.require(keys::TEST_PASSWORD)?.to_string(),
		})
	}

	/// Iterates over all keys and values in key order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}
}

fn flatten_into(out: &mut BTreeMap<String, String>, key: String, value: Value) -> Result<()> {
	match value {
		Value::Object(map) => {
			for (child, value) in map {
				flatten_into(out, format!("{key}.{child}"), value)?;
			}
		}
		Value::String(s) => {
			out.insert(key, s);
		}
		Value::Number(n) => {
			out.insert(key, n.to_string());
		}
		Value::Bool(b) => {
			out.insert(key, b.to_string());
		}
		Value::Null => {}
		Value::Array(_) => {
			return Err(Error::config(key, "arrays are not supported in configuration"));
		}
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use std::io::Write;

	use super::*;

	#[test]
	fn nested_and_dotted_keys_are_equivalent() {
		let nested = TestConfig::from_json_str(r#"{"android": {"deviceName": "Pixel"}, "appium": {"implicitWait": 10}}"#).unwrap();
		let dotted = TestConfig::from_json_str(r#"{"android.deviceName": "Pixel", "appium.implicitWait": 10}"#).unwrap();
		assert_eq!(nested, dotted);
		assert_eq!(nested.get(keys::ANDROID_DEVICE_NAME), Some("Pixel"));
		assert_eq!(nested.implicit_wait().unwrap(), Duration::from_secs(10));
	}

	#[test]
	fn missing_key_error_names_key() {
		let config = TestConfig::default();
		let err = config.require(keys::SERVER_URL).unwrap_err();
		match err {
			Error::Configuration { key, .. } => assert_eq!(key, "appium.serverUrl"),
			other => panic!("unexpected error: {other:?}"),
		}
	}

	#[test]
	fn blank_values_count_as_missing() {
		let config = TestConfig::from_pairs([(keys::TEST_USERNAME, "  ")]);
		assert!(config.get(keys::TEST_USERNAME).is_none());
		assert!(config.credentials().is_err());
	}

	#[test]
	fn malformed_integer_is_configuration_error() {
		let config = TestConfig::from_pairs([(keys::IMPLICIT_WAIT, "ten")]);
		assert!(matches!(config.implicit_wait(), Err(Error::Configuration { .. })));
	}

	#[test]
	fn unknown_platform_is_unsupported() {
		let config = TestConfig::from_pairs([(keys::PLATFORM, "windows")]);
		assert!(matches!(config.platform(), Err(Error::UnsupportedPlatform(p)) if p == "windows"));
	}

	#[test]
	fn platform_parses_case_insensitively() {
		let config = TestConfig::from_pairs([(keys::PLATFORM, "ANDROID")]);
		assert_eq!(config.platform().unwrap(), Platform::Android);
	}

	#[test]
	fn arrays_are_rejected() {
		let err = TestConfig::from_json_str(r#"{"devices": ["a", "b"]}"#).unwrap_err();
		assert!(err.to_string().contains("devices"));
	}

	#[test]
	fn load_reads_file_and_records_source() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		write!(file, r#"{{"platform": "ios", "ios": {{"bundleId": "com.example"}}}}"#).unwrap();

		let config = TestConfig::load(file.path()).unwrap();
		assert_eq!(config.platform().unwrap(), Platform::Ios);
		assert_eq!(config.get(keys::IOS_BUNDLE_ID), Some("com.example"));
		assert_eq!(config.source(), Some(file.path()));
	}

	#[test]
	fn load_missing_file_is_configuration_error() {
		let dir = tempfile::tempdir().unwrap();
		let err = TestConfig::load(&dir.path().join("nope.json")).unwrap_err();
		assert!(matches!(err, Error::Configuration { .. }));
	}

	#[test]
	fn credentials_debug_redacts_password() {
		let config = TestConfig::from_pairs([(keys::TEST_USERNAME, "qa@example.com"), (keys::TEST_PASSWORD, "hunter2")]);
		let rendered = format!("{:?}", config.credentials().unwrap());
		assert!(rendered.contains("qa@example.com"));
		assert!(!rendered.contains("hunter2"));
	}

	#[test]
	fn resolve_path_prefers_explicit() {
		let explicit = Path::new("custom.json");
		assert_eq!(TestConfig::resolve_path(Some(explicit)), PathBuf::from("custom.json"));
	}
}
