//! Polling waits.
//!
//! [`Wait::until`] evaluates a predicate immediately and then every poll
//! interval until it succeeds or the timeout passes. Predicate failures that
//! describe transient UI state (element missing, stale, not yet interactable,
//! [`Error::ConditionNotMet`]) are retried; anything else, such as a transport
//! failure or a closed session, ends the wait at once. A [`Error::WaitTimeout`]
//! therefore always means the condition never became true.
//!
//! Timing uses `tokio::time`, so tests can run waits under paused time.

use std::future::Future;
use std::time::Duration;

use mobdrive_protocol::{ElementRef, Locator};
use mobdrive_runtime::DriverHandle;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::element;
use crate::error::{Error, Result};

/// Default timeout of [`Wait::visible`].
pub const VISIBLE_TIMEOUT: Duration = Duration::from_secs(20);
/// Default timeout of [`Wait::clickable`].
pub const CLICKABLE_TIMEOUT: Duration = Duration::from_secs(30);
/// Default timeout for a page's identifying element.
pub const PAGE_LOAD_TIMEOUT: Duration = Duration::from_secs(20);
/// Default interval between predicate evaluations.
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Timeout and poll interval of one wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
	pub timeout: Duration,
	pub poll_interval: Duration,
}

impl Default for WaitOptions {
	fn default() -> Self {
		Self::new(VISIBLE_TIMEOUT)
	}
}

impl WaitOptions {
	pub fn new(timeout: Duration) -> Self {
		Self {
			timeout,
			poll_interval: POLL_INTERVAL,
		}
	}

	pub fn visible() -> Self {
		Self::new(VISIBLE_TIMEOUT)
	}

	pub fn clickable() -> Self {
		Self::new(CLICKABLE_TIMEOUT)
	}

	pub fn page_load() -> Self {
		Self::new(PAGE_LOAD_TIMEOUT)
	}

	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;
		self
	}

	pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
		self.poll_interval = poll_interval;
		self
	}
}

/// A wait bound to one session.
pub struct Wait<'a> {
	driver: &'a DriverHandle,
	options: WaitOptions,
}

impl<'a> Wait<'a> {
	pub fn new(driver: &'a DriverHandle, options: WaitOptions) -> Self {
		Self { driver, options }
	}

	pub fn options(&self) -> WaitOptions {
		self.options
	}

	/// Polls `predicate` until it returns `Ok`.
	///
	/// `description` names the condition in logs and in the timeout error.
	/// Returns within `[timeout, timeout + poll_interval)` when the predicate
	/// never succeeds.
	pub async fn until<T, F, Fut>(&self, description: &str, mut predicate: F) -> Result<T>
	where
		F: FnMut(DriverHandle) -> Fut,
		Fut: Future<Output = Result<T>>,
	{
		let WaitOptions { timeout, poll_interval } = self.options;
		let poll_interval = poll_interval.max(MIN_POLL_INTERVAL);
		let started = Instant::now();
		// An unrepresentable deadline means the wait never expires.
		let deadline = started.checked_add(timeout);
		let mut attempts = 0u32;
		let mut last_failure = None;

		loop {
			attempts += 1;
			match predicate(self.driver.clone()).await {
				Ok(value) => {
					debug!(
						target = "mobdrive.wait",
						condition = description,
						attempts,
						elapsed_ms = started.elapsed().as_millis() as u64,
						"condition met"
					);
					return Ok(value);
				}
				Err(e) if e.is_retryable() => {
					trace!(target = "mobdrive.wait", condition = description, attempts, error = %e, "not yet");
					last_failure = Some(e.to_string());
				}
				Err(e) => return Err(e),
			}

			let now = Instant::now();
			let Some(deadline) = deadline else {
				tokio::time::sleep(poll_interval).await;
				continue;
			};
			if now >= deadline {
				let elapsed = now - started;
				debug!(
					target = "mobdrive.wait",
					condition = description,
					attempts,
					elapsed_ms = elapsed.as_millis() as u64,
					"timed out"
				);
				return Err(Error::WaitTimeout {
					condition: description.to_string(),
					timeout,
					elapsed,
					last_failure,
				});
			}
			tokio::time::sleep(poll_interval.min(deadline - now)).await;
		}
	}

	/// Waits until `locator` is present and displayed.
	pub async fn visible(&self, locator: &Locator) -> Result<ElementRef> {
		let description = format!("{locator} to be visible");
		self.until(&description, |driver| {
			let locator = locator.clone();
			async move {
				let el = element::find(&driver, &locator).await?;
				if element::is_displayed(&driver, &el).await? {
					Ok(el)
				} else {
					Err(Error::ConditionNotMet(format!("{locator} is not displayed")))
				}
			}
		})
		.await
	}

	/// Waits until `locator` is present, displayed and enabled.
	pub async fn clickable(&self, locator: &Locator) -> Result<ElementRef> {
		let description = format!("{locator} to be clickable");
		self.until(&description, |driver| {
			let locator = locator.clone();
			async move {
				let el = element::find(&driver, &locator).await?;
				if !element::is_displayed(&driver, &el).await? {
					return Err(Error::ConditionNotMet(format!("{locator} is not displayed")));
				}
				if !element::is_enabled(&driver, &el).await? {
					return Err(Error::ConditionNotMet(format!("{locator} is not enabled")));
				}
				Ok(el)
			}
		})
		.await
	}
}

/// Polls `predicate` against `driver` with an explicit timeout and interval.
pub async fn wait_until<T, F, Fut>(driver: &DriverHandle, predicate: F, timeout: Duration, poll_interval: Duration) -> Result<T>
where
	F: FnMut(DriverHandle) -> Fut,
	Fut: Future<Output = Result<T>>,
{
	Wait::new(driver, WaitOptions::new(timeout).with_poll_interval(poll_interval))
		.until("custom condition", predicate)
		.await
}

/// [`Wait::visible`] with the default 20 s timeout.
pub async fn wait_for_visible(driver: &DriverHandle, locator: &Locator) -> Result<ElementRef> {
	Wait::new(driver, WaitOptions::visible()).visible(locator).await
}

/// [`Wait::clickable`] with the default 30 s timeout.
pub async fn wait_for_clickable(driver: &DriverHandle, locator: &Locator) -> Result<ElementRef> {
	Wait::new(driver, WaitOptions::clickable()).clickable(locator).await
}
