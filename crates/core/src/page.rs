//! Page objects.
//!
//! A page is any value implementing [`PageObject`]: it names itself and knows
//! how to wait until it is on screen. [`PageDescriptor`] covers the common
//! case of a page identified by one anchor element; concrete pages usually
//! hold a descriptor plus the [`UiElement`]s they act on.

use async_trait::async_trait;
use mobdrive_runtime::DriverHandle;
use tracing::{debug, info};

use crate::actions::Actions;
use crate::element::UiElement;
use crate::error::Result;
use crate::wait::{Wait, WaitOptions};

/// Session, waits and actions shared by the pages of one test.
#[derive(Clone)]
pub struct PageContext {
	driver: DriverHandle,
	page_load: WaitOptions,
	actions: Actions,
}

impl PageContext {
	pub fn new(driver: DriverHandle) -> Self {
		let actions = Actions::new(driver.clone());
		Self {
			driver,
			page_load: WaitOptions::page_load(),
			actions,
		}
	}

	pub fn with_actions(mut self, actions: Actions) -> Self {
		self.actions = actions;
		self
	}

	pub fn with_page_load(mut self, options: WaitOptions) -> Self {
		self.page_load = options;
		self
	}

	pub fn driver(&self) -> &DriverHandle {
		&self.driver
	}

	pub fn actions(&self) -> &Actions {
		&self.actions
	}

	pub fn page_load(&self) -> WaitOptions {
		self.page_load
	}

	/// Wait using the page-load options.
	pub fn wait(&self) -> Wait<'_> {
		Wait::new(&self.driver, self.page_load)
	}
}

#[async_trait]
pub trait PageObject: Send + Sync {
	/// Name used in logs and diagnostics.
	fn page_name(&self) -> &str;

	/// Waits until the page is on screen; fails with a wait timeout otherwise.
	async fn wait_for_load(&self, ctx: &PageContext) -> Result<()>;

	/// Probes whether the page is on screen. Never fails.
	async fn is_displayed(&self, ctx: &PageContext) -> bool {
		match self.wait_for_load(ctx).await {
			Ok(()) => {
				debug!(target = "mobdrive.page", page = self.page_name(), "page displayed");
				true
			}
			Err(e) => {
				info!(target = "mobdrive.page", page = self.page_name(), error = %e, "page not displayed");
				false
			}
		}
	}
}

/// A page identified by a single anchor element.
#[derive(Debug, Clone)]
pub struct PageDescriptor {
	pub name: String,
	pub anchor: UiElement,
}

impl PageDescriptor {
	pub fn new(name: impl Into<String>, anchor: UiElement) -> Self {
		Self { name: name.into(), anchor }
	}
}

#[async_trait]
impl PageObject for PageDescriptor {
	fn page_name(&self) -> &str {
		&self.name
	}

	async fn wait_for_load(&self, ctx: &PageContext) -> Result<()> {
		ctx.wait().visible(&self.anchor.locator).await?;
		debug!(target = "mobdrive.page", page = %self.name, anchor = %self.anchor, "page loaded");
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use std::time::Duration;

	use mobdrive_protocol::{ELEMENT_KEY, Method};
	use mobdrive_runtime::WorkerId;
	use mobdrive_runtime::testing::{FakeServer, config_for};
	use serde_json::json;
	use tokio::time::Instant;

	use super::*;
	use crate::error::Error;

	async fn context(server: &FakeServer) -> PageContext {
		let registry = server.registry(config_for("android"));
		let driver = registry.initialize(&WorkerId::new("pages")).await.unwrap();
		PageContext::new(driver)
	}

	fn home() -> PageDescriptor {
		PageDescriptor::new("Home", UiElement::accessibility_id("Virtual Consultation"))
	}

	#[tokio::test(start_paused = true)]
	async fn absent_page_is_not_displayed_and_does_not_fail() {
		let server = FakeServer::new();
		server.fail(Method::Post, "element", "no such element", "absent");
		let ctx = context(&server).await;

		let err = home().wait_for_load(&ctx).await.unwrap_err();
		assert!(matches!(err, Error::WaitTimeout { .. }));

		let started = Instant::now();
		assert!(!home().is_displayed(&ctx).await);
		assert!(started.elapsed() >= Duration::from_secs(20));
	}

	#[tokio::test(start_paused = true)]
	async fn present_page_is_displayed() {
		let server = FakeServer::new();
		server.respond(Method::Post, "element", json!({ ELEMENT_KEY: "anchor" }));
		server.respond(Method::Get, "displayed", json!(true));
		let ctx = context(&server).await;

		assert!(home().is_displayed(&ctx).await);
		assert_eq!(home().page_name(), "Home");
	}

	#[tokio::test(start_paused = true)]
	async fn page_load_timeout_is_configurable() {
		let server = FakeServer::new();
		server.fail(Method::Post, "element", "no such element", "absent");
		let ctx = context(&server)
			.await
			.with_page_load(WaitOptions::new(Duration::from_secs(2)));

		let started = Instant::now();
		assert!(!home().is_displayed(&ctx).await);
		assert!(started.elapsed() < Duration::from_secs(3));
	}
}
