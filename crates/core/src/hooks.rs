//! Test lifecycle hooks.
//!
//! [`HookManager::run`] wraps one test body:
//!
//! ```text
//! Idle ─► Running ─► Passed
//!                 └► Failed
//! ```
//!
//! Entering `Running`, every registered hook whose [`Marker`] the test
//! declares runs its `before` step. After the body (returned, failed or
//! panicked) each hook whose `before` succeeded runs its `after` step with the
//! outcome. Hook failures are logged and recorded on the [`TestInvocation`];
//! they never change whether the test passed.

use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Local};
use futures_util::FutureExt;
use mobdrive_runtime::DriverHandle;
use tracing::{debug, error, info, warn};

use crate::actions;
use crate::artifacts::{self, ArtifactLayout, ArtifactSink};
use crate::error::Result;

/// Opt-in behaviours a test can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
	/// Record the screen for the whole test.
	RecordScreen,
	/// Save a screenshot when the test fails.
	ScreenshotOnFailure,
}

/// A test's name and the markers it declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
	pub name: String,
	pub markers: Vec<Marker>,
}

impl TestCase {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			markers: Vec::new(),
		}
	}

	pub fn with_marker(mut self, marker: Marker) -> Self {
		if !self.markers.contains(&marker) {
			self.markers.push(marker);
		}
		self
	}

	pub fn has(&self, marker: Marker) -> bool {
		self.markers.contains(&marker)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestState {
	Idle,
	Running,
	Passed,
	Failed,
}

impl fmt::Display for TestState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			TestState::Idle => "idle",
			TestState::Running => "running",
			TestState::Passed => "passed",
			TestState::Failed => "failed",
		})
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPhase {
	Before,
	After,
}

/// A hook step that failed without affecting the outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookFailure {
	pub hook: String,
	pub phase: HookPhase,
	pub message: String,
}

/// Report of one wrapped test.
#[derive(Debug, Clone)]
pub struct TestInvocation {
	pub name: String,
	pub started_at: DateTime<Local>,
	pub duration: Duration,
	pub state: TestState,
	/// Error or panic message of a failed body.
	pub failure: Option<String>,
	/// Artifacts written by hooks.
	pub artifacts: Vec<PathBuf>,
	pub hook_failures: Vec<HookFailure>,
}

impl TestInvocation {
	fn new(name: &str) -> Self {
		Self {
			name: name.to_string(),
			started_at: Local::now(),
			duration: Duration::ZERO,
			state: TestState::Idle,
			failure: None,
			artifacts: Vec::new(),
			hook_failures: Vec::new(),
		}
	}

	pub fn passed(&self) -> bool {
		self.state == TestState::Passed
	}
}

/// What a hook can reach while it runs.
pub struct HookContext<'a> {
	pub driver: &'a DriverHandle,
	pub test: &'a TestCase,
	pub layout: &'a ArtifactLayout,
	pub sink: &'a dyn ArtifactSink,
}

/// Behaviour attached around tests that declare its marker.
#[async_trait]
pub trait TestHook: Send + Sync {
	fn name(&self) -> &str;

	fn marker(&self) -> Marker;

	async fn before(&self, ctx: &HookContext<'_>) -> Result<()>;

	/// Runs after the body; returns the artifacts it wrote.
	async fn after(&self, ctx: &HookContext<'_>, passed: bool) -> Result<Vec<PathBuf>>;
}

/// Records the screen and keeps the video named after the outcome.
#[derive(Debug, Default)]
pub struct ScreenRecordingHook;

#[async_trait]
impl TestHook for ScreenRecordingHook {
	fn name(&self) -> &str {
		"screen-recording"
	}

	fn marker(&self) -> Marker {
		Marker::RecordScreen
	}

	async fn before(&self, ctx: &HookContext<'_>) -> Result<()> {
		actions::start_recording(ctx.driver).await?;
		debug!(target = "mobdrive.hooks", test = %ctx.test.name, "screen recording started");
		Ok(())
	}

	async fn after(&self, ctx: &HookContext<'_>, passed: bool) -> Result<Vec<PathBuf>> {
		let Some(video) = actions::stop_recording(ctx.driver).await? else {
			warn!(target = "mobdrive.hooks", test = %ctx.test.name, "server returned an empty recording");
			return Ok(Vec::new());
		};
		let path = ctx.layout.video_path(&ctx.test.name, passed);
		let path = artifacts::store(ctx.sink, &path, &video).await?;
		info!(target = "mobdrive.hooks", test = %ctx.test.name, path = %path.display(), "recording saved");
		Ok(vec![path])
	}
}

/// Saves a timestamped screenshot when a test fails.
#[derive(Debug, Default)]
pub struct FailureScreenshotHook;

#[async_trait]
impl TestHook for FailureScreenshotHook {
	fn name(&self) -> &str {
		"failure-screenshot"
	}

	fn marker(&self) -> Marker {
		Marker::ScreenshotOnFailure
	}

	async fn before(&self, _ctx: &HookContext<'_>) -> Result<()> {
		Ok(())
	}

	async fn after(&self, ctx: &HookContext<'_>, passed: bool) -> Result<Vec<PathBuf>> {
		if passed {
			return Ok(Vec::new());
		}
		let png = actions::capture_screenshot(ctx.driver).await?;
		let path = ctx.layout.screenshot_path(&ctx.test.name);
		let path = artifacts::store(ctx.sink, &path, &png).await?;
		info!(target = "mobdrive.hooks", test = %ctx.test.name, path = %path.display(), "failure screenshot saved");
		Ok(vec![path])
	}
}

/// Runs test bodies inside their declared hooks.
pub struct HookManager {
	layout: ArtifactLayout,
	sink: Arc<dyn ArtifactSink>,
	hooks: Vec<Arc<dyn TestHook>>,
}

impl HookManager {
	/// Manager without hooks.
	pub fn new(layout: ArtifactLayout, sink: Arc<dyn ArtifactSink>) -> Self {
		Self {
			layout,
			sink,
			hooks: Vec::new(),
		}
	}

	/// Manager with screen recording and failure screenshots registered.
	pub fn with_default_hooks(layout: ArtifactLayout, sink: Arc<dyn ArtifactSink>) -> Self {
		Self::new(layout, sink)
			.with_hook(ScreenRecordingHook)
			.with_hook(FailureScreenshotHook)
	}

	pub fn with_hook(mut self, hook: impl TestHook + 'static) -> Self {
		self.hooks.push(Arc::new(hook));
		self
	}

	pub fn layout(&self) -> &ArtifactLayout {
		&self.layout
	}

	/// Runs `body` for `test` and reports the outcome.
	///
	/// An `Err` from the body or a panic fails the test. Never fails itself.
	pub async fn run<F, Fut, E>(&self, driver: &DriverHandle, test: &TestCase, body: F) -> TestInvocation
	where
		F: FnOnce(DriverHandle) -> Fut,
		Fut: Future<Output = std::result::Result<(), E>>,
		E: fmt::Display,
	{
		let mut invocation = TestInvocation::new(&test.name);
		let started = Instant::now();
		let ctx = HookContext {
			driver,
			test,
			layout: &self.layout,
			sink: self.sink.as_ref(),
		};

		invocation.state = TestState::Running;
		info!(target = "mobdrive.hooks", test = %test.name, markers = ?test.markers, "test started");

		let mut armed = Vec::new();
		for hook in self.hooks.iter().filter(|h| test.has(h.marker())) {
			match hook.before(&ctx).await {
				Ok(()) => armed.push(hook),
				Err(e) => {
					warn!(target = "mobdrive.hooks", test = %test.name, hook = hook.name(), error = %e, "before hook failed; skipping its after step");
					invocation.hook_failures.push(HookFailure {
						hook: hook.name().to_string(),
						phase: HookPhase::Before,
						message: e.to_string(),
					});
				}
			}
		}

		let outcome = AssertUnwindSafe(body(driver.clone())).catch_unwind().await;
		match outcome {
			Ok(Ok(())) => invocation.state = TestState::Passed,
			Ok(Err(e)) => {
				invocation.state = TestState::Failed;
				invocation.failure = Some(e.to_string());
			}
			Err(panic) => {
				invocation.state = TestState::Failed;
				invocation.failure = Some(format!("panicked: {}", panic_message(panic.as_ref())));
			}
		}
		let passed = invocation.passed();

		for hook in armed {
			match hook.after(&ctx, passed).await {
				Ok(paths) => invocation.artifacts.extend(paths),
				Err(e) => {
					warn!(target = "mobdrive.hooks", test = %test.name, hook = hook.name(), error = %e, "after hook failed");
					invocation.hook_failures.push(HookFailure {
						hook: hook.name().to_string(),
						phase: HookPhase::After,
						message: e.to_string(),
					});
				}
			}
		}

		invocation.duration = started.elapsed();
		match &invocation.failure {
			None => info!(target = "mobdrive.hooks", test = %test.name, duration_ms = invocation.duration.as_millis() as u64, "test passed"),
			Some(reason) => error!(target = "mobdrive.hooks", test = %test.name, reason = %reason, "test failed"),
		}
		invocation
	}
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
	if let Some(s) = payload.downcast_ref::<&str>() {
		(*s).to_string()
	} else if let Some(s) = payload.downcast_ref::<String>() {
		s.clone()
	} else {
		"non-string panic payload".to_string()
	}
}
