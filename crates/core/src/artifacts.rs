//! Test artifacts: where they go and what writes them.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::Engine;
use mobdrive_runtime::{TestConfig, keys};
use parking_lot::Mutex;
use tracing::debug;

use crate::error::{Error, Result};

pub const DEFAULT_VIDEOS_DIR: &str = "build/videos";
pub const DEFAULT_SCREENSHOTS_DIR: &str = "screenshots";

/// Timestamp format embedded in screenshot names.
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Byte sink for artifacts.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
	async fn create_dir_all(&self, dir: &Path) -> io::Result<()>;
	async fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<()>;
}

/// Writes artifacts below a root directory.
#[derive(Debug, Clone)]
pub struct FsSink {
	root: PathBuf,
}

impl FsSink {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	/// Sink rooted at the working directory.
	pub fn cwd() -> Self {
		Self::new(".")
	}

	pub fn root(&self) -> &Path {
		&self.root
	}
}

#[async_trait]
impl ArtifactSink for FsSink {
	async fn create_dir_all(&self, dir: &Path) -> io::Result<()> {
		tokio::fs::create_dir_all(self.root.join(dir)).await
	}

	async fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
		tokio::fs::write(self.root.join(path), bytes).await
	}
}

/// Keeps artifacts in memory, for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemorySink {
	files: Mutex<BTreeMap<PathBuf, Vec<u8>>>,
	read_only: bool,
}

impl MemorySink {
	pub fn new() -> Self {
		Self::default()
	}

	/// A sink whose every operation fails with permission denied.
	pub fn read_only() -> Self {
		Self {
			read_only: true,
			..Self::default()
		}
	}

	pub fn get(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
		self.files.lock().get(path.as_ref()).cloned()
	}

	pub fn paths(&self) -> Vec<PathBuf> {
		self.files.lock().keys().cloned().collect()
	}

	fn check(&self) -> io::Result<()> {
		if self.read_only {
			return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only artifact sink"));
		}
		Ok(())
	}
}

#[async_trait]
impl ArtifactSink for MemorySink {
	async fn create_dir_all(&self, _dir: &Path) -> io::Result<()> {
		self.check()
	}

	async fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
		self.check()?;
		self.files.lock().insert(path.to_path_buf(), bytes.to_vec());
		Ok(())
	}
}

/// Artifact directories and file naming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLayout {
	pub videos_dir: PathBuf,
	pub screenshots_dir: PathBuf,
}

impl Default for ArtifactLayout {
	fn default() -> Self {
		Self {
			videos_dir: PathBuf::from(DEFAULT_VIDEOS_DIR),
			screenshots_dir: PathBuf::from(DEFAULT_SCREENSHOTS_DIR),
		}
	}
}

impl ArtifactLayout {
	/// Layout with directories overridden by `artifacts.*` keys.
	pub fn from_config(config: &TestConfig) -> Self {
		let defaults = Self::default();
		Self {
			videos_dir: config.get(keys::VIDEOS_DIR).map(PathBuf::from).unwrap_or(defaults.videos_dir),
			screenshots_dir: config
				.get(keys::SCREENSHOTS_DIR)
				.map(PathBuf::from)
				.unwrap_or(defaults.screenshots_dir),
		}
	}

	/// `<videos>/<test>_PASSED.mp4` or `<videos>/<test>_FAILED.mp4`.
	pub fn video_path(&self, test_name: &str, passed: bool) -> PathBuf {
		let outcome = if passed { "PASSED" } else { "FAILED" };
		self.videos_dir.join(format!("{}_{outcome}.mp4", file_stem(test_name)))
	}

	/// `<screenshots>/<test>_<yyyyMMdd_HHmmss>.png` for the current local time.
	pub fn screenshot_path(&self, test_name: &str) -> PathBuf {
		let stamp = chrono::Local::now().format(TIMESTAMP_FORMAT);
		self.screenshots_dir.join(format!("{}_{stamp}.png", file_stem(test_name)))
	}
}

/// Replaces characters that would escape or break a file name.
fn file_stem(name: &str) -> String {
	name.chars()
		.map(|c| if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
		.collect()
}

/// Creates the parent directory of `path` and writes `bytes` to it.
pub async fn store(sink: &dyn ArtifactSink, path: &Path, bytes: &[u8]) -> Result<PathBuf> {
	let artifact_error = |source| Error::Artifact {
		path: path.display().to_string(),
		source,
	};
	if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
		sink.create_dir_all(dir).await.map_err(artifact_error)?;
	}
	sink.write(path, bytes).await.map_err(artifact_error)?;
	debug!(target = "mobdrive.artifacts", path = %path.display(), bytes = bytes.len(), "artifact written");
	Ok(path.to_path_buf())
}

/// Decodes a base64 payload returned by the server.
pub fn decode_base64(what: &'static str, payload: &str) -> Result<Vec<u8>> {
	// Some servers wrap long payloads with newlines.
	let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
	base64::prelude::BASE64_STANDARD
		.decode(compact)
		.map_err(|e| Error::Decode {
			what,
			message: e.to_string(),
		})
}
