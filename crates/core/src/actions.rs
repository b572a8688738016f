//! Element interactions.
//!
//! Every interaction first waits for its element to be ready, then acts.
//! Failures are wrapped in [`Error::ActionFailed`] naming the logical element,
//! so a report reads "Failed to click 'Login Button'" rather than quoting a
//! locator.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use mobdrive_protocol::{ActionSequence, Command, Point};
use mobdrive_runtime::{DriverHandle, Platform};
use tracing::{debug, info};

use crate::artifacts::{self, ArtifactLayout, ArtifactSink, FsSink};
use crate::element::{self, UiElement};
use crate::error::{Error, Result};
use crate::wait::{Wait, WaitOptions};

/// How long a tap holds the pointer down.
pub const TAP_HOLD: Duration = Duration::from_millis(200);

/// Interactions against one session.
#[derive(Clone)]
pub struct Actions {
	driver: DriverHandle,
	visible: WaitOptions,
	clickable: WaitOptions,
	layout: ArtifactLayout,
	sink: Arc<dyn ArtifactSink>,
}

impl Actions {
	pub fn new(driver: DriverHandle) -> Self {
		Self {
			driver,
			visible: WaitOptions::visible(),
			clickable: WaitOptions::clickable(),
			layout: ArtifactLayout::default(),
			sink: Arc::new(FsSink::cwd()),
		}
	}

	pub fn with_artifacts(mut self, layout: ArtifactLayout, sink: Arc<dyn ArtifactSink>) -> Self {
		self.layout = layout;
		self.sink = sink;
		self
	}

	pub fn with_visible_wait(mut self, options: WaitOptions) -> Self {
		self.visible = options;
		self
	}

	pub fn with_clickable_wait(mut self, options: WaitOptions) -> Self {
		self.clickable = options;
		self
	}

	pub fn driver(&self) -> &DriverHandle {
		&self.driver
	}

	/// Waits for `element` to be clickable, then clicks it.
	pub async fn click(&self, element: &UiElement) -> Result<()> {
		async {
			let el = Wait::new(&self.driver, self.clickable).clickable(&element.locator).await?;
			self.driver.execute(&Command::ElementClick(el)).await?;
			Ok::<_, Error>(())
		}
		.await
		.map_err(failed(element, "click"))?;
		info!(target = "mobdrive.actions", element = %element, "clicked");
		Ok(())
	}

	/// Waits for `element` to be visible, focuses it, clears it and types `text`.
	pub async fn send_keys(&self, element: &UiElement, text: &str) -> Result<()> {
		async {
			let el = Wait::new(&self.driver, self.visible).visible(&element.locator).await?;
			self.driver.execute(&Command::ElementClick(el.clone())).await?;
			self.driver.execute(&Command::ElementClear(el.clone())).await?;
			self.driver
				.execute(&Command::ElementSendKeys {
					element: el,
					text: text.to_string(),
				})
				.await?;
			Ok::<_, Error>(())
		}
		.await
		.map_err(failed(element, "type into"))?;
		info!(target = "mobdrive.actions", element = %element, chars = text.chars().count(), "typed");
		Ok(())
	}

	/// Taps the centre of `element`'s bounding box.
	///
	/// For widgets that swallow a plain element click.
	pub async fn tap(&self, element: &UiElement) -> Result<()> {
		let point = async {
			let el = Wait::new(&self.driver, self.visible).visible(&element.locator).await?;
			let rect = element::rect(&self.driver, &el).await?;
			if rect.is_empty() {
				return Err(Error::ConditionNotMet(format!("element has an empty bounding box {rect:?}")));
			}
			let point = rect.center();
			self.perform_tap(point).await?;
			Ok::<_, Error>(point)
		}
		.await
		.map_err(failed(element, "tap"))?;
		info!(target = "mobdrive.actions", element = %element, x = point.x, y = point.y, "tapped");
		Ok(())
	}

	/// Taps explicit screen coordinates.
	///
	/// `name` identifies the target in logs and failures. Coordinates should
	/// come from configuration, never from literals in page code.
	pub async fn tap_at(&self, name: &str, point: Point) -> Result<()> {
		self.perform_tap(point).await.map_err(|source| Error::ActionFailed {
			element: name.to_string(),
			action: "tap",
			source: Box::new(source),
		})?;
		info!(target = "mobdrive.actions", target_name = name, x = point.x, y = point.y, "tapped");
		Ok(())
	}

	async fn perform_tap(&self, point: Point) -> Result<()> {
		self.driver
			.execute(&Command::PerformActions(vec![ActionSequence::tap(point, TAP_HOLD)]))
			.await?;
		Ok(())
	}

	/// Hides the Android soft keyboard if it is showing.
	///
	/// Does nothing on iOS. Never fails; problems are logged.
	pub async fn hide_keyboard(&self) {
		if self.driver.platform() != Platform::Android {
			return;
		}
		let shown = match self.driver.execute_as::<bool>(&Command::IsKeyboardShown).await {
			Ok(shown) => shown,
			Err(e) => {
				debug!(target = "mobdrive.actions", error = %e, "keyboard state unavailable");
				return;
			}
		};
		if shown {
			if let Err(e) = self.driver.execute(&Command::HideKeyboard).await {
				debug!(target = "mobdrive.actions", error = %e, "could not hide keyboard");
			}
		}
	}

	/// Writes a timestamped screenshot for `test_name` and returns its path.
	pub async fn take_screenshot(&self, test_name: &str) -> Result<PathBuf> {
		let bytes = capture_screenshot(&self.driver).await?;
		let path = self.layout.screenshot_path(test_name);
		let path = artifacts::store(self.sink.as_ref(), &path, &bytes).await?;
		info!(target = "mobdrive.actions", path = %path.display(), "screenshot saved");
		Ok(path)
	}
}

fn failed(element: &UiElement, action: &'static str) -> impl FnOnce(Error) -> Error {
	let name = element.name.clone();
	move |source| Error::ActionFailed {
		element: name,
		action,
		source: Box::new(source),
	}
}

/// Captures the current screen as PNG bytes.
pub async fn capture_screenshot(driver: &DriverHandle) -> Result<Vec<u8>> {
	let payload: String = driver.execute_as(&Command::Screenshot).await?;
	artifacts::decode_base64("screenshot", &payload)
}

/// Stops screen recording and returns the decoded video, if any was produced.
pub async fn stop_recording(driver: &DriverHandle) -> Result<Option<Vec<u8>>> {
	let payload: Option<String> = driver.execute_as(&Command::StopRecordingScreen).await?;
	match payload {
		Some(text) if !text.trim().is_empty() => artifacts::decode_base64("recording", &text).map(Some),
		_ => Ok(None),
	}
}

pub async fn start_recording(driver: &DriverHandle) -> Result<()> {
	driver.execute(&Command::StartRecordingScreen).await?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use base64::Engine;
	use mobdrive_protocol::{ELEMENT_KEY, Locator, Method, PointerAction};
	use mobdrive_runtime::WorkerId;
	use mobdrive_runtime::testing::{FakeServer, config_for};
	use serde_json::json;

	use super::*;
	use crate::artifacts::MemorySink;

	async fn actions(server: &FakeServer, platform: &str) -> Actions {
		let registry = server.registry(config_for(platform));
		let driver = registry.initialize(&WorkerId::new("actions")).await.unwrap();
		let quick = WaitOptions::new(Duration::from_secs(1)).with_poll_interval(Duration::from_millis(100));
		Actions::new(driver).with_visible_wait(quick).with_clickable_wait(quick)
	}

	fn visible_element(server: &FakeServer) {
		server.respond(Method::Post, "element", json!({ ELEMENT_KEY: "el-1" }));
		server.respond(Method::Get, "displayed", json!(true));
		server.respond(Method::Get, "enabled", json!(true));
	}

	#[tokio::test(start_paused = true)]
	async fn tap_hits_rect_centre() {
		let server = FakeServer::new();
		visible_element(&server);
		server.respond(Method::Get, "rect", json!({ "x": 40.0, "y": 100.0, "width": 201.0, "height": 50.0 }));
		server.respond(Method::Post, "actions", json!(null));
		let actions = actions(&server, "android").await;

		actions.tap(&UiElement::accessibility_id("Book")).await.unwrap();

		let request = server.requests().into_iter().find(|r| r.path.ends_with("/actions")).unwrap();
		let sequences: Vec<ActionSequence> = serde_json::from_value(request.body.unwrap()["actions"].clone()).unwrap();
		match &sequences[0].actions[0] {
			PointerAction::PointerMove { x, y, .. } => assert_eq!((*x, *y), (140, 125)),
			other => panic!("unexpected first action {other:?}"),
		}
		assert_eq!(sequences[0].actions[2], PointerAction::Pause { duration: 200 });
	}

	#[tokio::test(start_paused = true)]
	async fn failed_click_names_the_element() {
		let server = FakeServer::new();
		server.fail(Method::Post, "element", "no such element", "absent");
		let actions = actions(&server, "android").await;

		let button = UiElement::new("Login Button", Locator::accessibility_id("login_btn"));
		let err = actions.click(&button).await.unwrap_err();
		assert!(err.to_string().contains("'Login Button'"));
		assert!(err.is_timeout());
		assert!(matches!(err, Error::ActionFailed { action: "click", .. }));
	}

	#[tokio::test(start_paused = true)]
	async fn send_keys_focuses_clears_then_types() {
		let server = FakeServer::new();
		visible_element(&server);
		for suffix in ["click", "clear", "value"] {
			server.respond(Method::Post, suffix, json!(null));
		}
		let actions = actions(&server, "ios").await;

		actions.send_keys(&UiElement::accessibility_id("Username"), "alice").await.unwrap();

		let tails: Vec<String> = server
			.requests()
			.iter()
			.filter(|r| r.path.contains("/element/el-1/") && r.method == Method::Post)
			.map(|r| r.path.rsplit('/').next().unwrap_or_default().to_string())
			.collect();
		assert_eq!(tails, ["click", "clear", "value"]);
		let typed = server.requests().into_iter().find(|r| r.path.ends_with("/value")).unwrap();
		assert_eq!(typed.body.unwrap()["text"], "alice");
	}

	#[tokio::test]
	async fn hide_keyboard_only_on_android_and_never_fails() {
		let server = FakeServer::new();
		server.respond(Method::Get, "is_keyboard_shown", json!(true));
		server.fail(Method::Post, "hide_keyboard", "unknown error", "no keyboard");
		actions(&server, "android").await.hide_keyboard().await;
		assert_eq!(server.count(Method::Post, "hide_keyboard"), 1);

		let ios = FakeServer::new();
		actions(&ios, "ios").await.hide_keyboard().await;
		assert_eq!(ios.count(Method::Get, "is_keyboard_shown"), 0);
	}

	#[tokio::test]
	async fn screenshot_is_written_through_sink() {
		let server = FakeServer::new();
		let png = base64::prelude::BASE64_STANDARD.encode(b"\x89PNG");
		server.respond(Method::Get, "screenshot", json!(png));
		let sink = Arc::new(MemorySink::new());
		let actions = actions(&server, "android").await.with_artifacts(ArtifactLayout::default(), sink.clone());

		let path = actions.take_screenshot("login").await.unwrap();
		assert!(path.starts_with("screenshots"));
		assert_eq!(sink.get(&path).unwrap(), b"\x89PNG");
	}

	#[tokio::test]
	async fn tap_at_uses_given_point() {
		let server = FakeServer::new();
		server.respond(Method::Post, "actions", json!(null));
		let actions = actions(&server, "android").await;

		actions.tap_at("Appointment slot", Point::new(500, 1200)).await.unwrap();
		let body = server.requests().into_iter().find(|r| r.path.ends_with("/actions")).unwrap().body.unwrap();
		assert_eq!(body["actions"][0]["actions"][0]["x"], 500);
		assert_eq!(body["actions"][0]["actions"][0]["y"], 1200);
	}
}
