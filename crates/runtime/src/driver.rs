//! Live session handles.
//!
//! A [`DriverHandle`] is a cheap, cloneable reference to one remote
//! automation session. All clones share the same lifecycle state, so once any
//! clone quits the session every other clone sees it closed.

use std::fmt;
use std::sync::Arc;

use mobdrive_protocol::{Command, into_value};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::capabilities::CapabilitySet;
use crate::error::{Error, Result};
use crate::platform::Platform;
use crate::transport::Transport;

/// Lifecycle state of a session handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
	/// No session has been created yet.
	Absent,
	/// The session accepts commands.
	Live,
	/// Deletion has been requested and is in flight.
	Quitting,
	/// The session is gone; no further commands are sent.
	Closed,
}

impl DriverState {
	pub fn as_str(&self) -> &'static str {
		match self {
			DriverState::Absent => "absent",
			DriverState::Live => "live",
			DriverState::Quitting => "quitting",
			DriverState::Closed => "closed",
		}
	}
}

impl fmt::Display for DriverState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

struct Inner {
	session_id: String,
	platform: Platform,
	endpoint: Url,
	capabilities: CapabilitySet,
	transport: Arc<dyn Transport>,
	state: Mutex<DriverState>,
}

/// Handle to one remote automation session.
#[derive(Clone)]
pub struct DriverHandle {
	inner: Arc<Inner>,
}

impl fmt::Debug for DriverHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("DriverHandle")
			.field("session_id", &self.inner.session_id)
			.field("platform", &self.inner.platform)
			.field("endpoint", &self.inner.endpoint.as_str())
			.field("state", &self.state())
			.finish()
	}
}

impl DriverHandle {
	/// Wraps a session the server has already created.
	pub(crate) fn live(
		session_id: String,
		platform: Platform,
		endpoint: Url,
		capabilities: CapabilitySet,
		transport: Arc<dyn Transport>,
	) -> Self {
		Self {
			inner: Arc::new(Inner {
				session_id,
				platform,
				endpoint,
				capabilities,
				transport,
				state: Mutex::new(DriverState::Live),
			}),
		}
	}

	pub fn session_id(&self) -> &str {
		&self.inner.session_id
	}

	pub fn platform(&self) -> Platform {
		self.inner.platform
	}

	pub fn endpoint(&self) -> &Url {
		&self.inner.endpoint
	}

	/// Capabilities the session was opened with.
	pub fn capabilities(&self) -> &CapabilitySet {
		&self.inner.capabilities
	}

	pub fn state(&self) -> DriverState {
		*self.inner.state.lock()
	}

	pub fn is_live(&self) -> bool {
		self.state() == DriverState::Live
	}

	/// Returns true if both handles refer to the same session.
	pub fn same_session(&self, other: &DriverHandle) -> bool {
		Arc::ptr_eq(&self.inner, &other.inner)
	}

	/// Sends a command and returns the unwrapped `value` of the response.
	pub async fn execute(&self, command: &Command) -> Result<Value> {
		let state = self.state();
		if state != DriverState::Live {
			return Err(self.closed(state));
		}
		debug!(
			target = "mobdrive.driver",
			session = %self.inner.session_id,
			command = command.name(),
			"execute"
		);
		let body = self.inner.transport.send(command.to_request(&self.inner.session_id)).await?;
		Ok(into_value(body))
	}

	/// Like [`execute`](Self::execute), deserializing the value into `T`.
	pub async fn execute_as<T: DeserializeOwned>(&self, command: &Command) -> Result<T> {
		let value = self.execute(command).await?;
		serde_json::from_value(value)
			.map_err(|e| Error::Protocol(format!("unexpected {} response: {e}", command.name())))
	}

	/// Deletes the remote session.
	///
	/// Idempotent: only the first call sends the delete; later calls (on this
	/// or any clone) return `Ok`. The handle ends `Closed` even when the
	/// server rejects the delete, and that rejection is returned.
	pub async fn quit(&self) -> Result<()> {
		{
			let mut state = self.inner.state.lock();
			if *state != DriverState::Live {
				return Ok(());
			}
			*state = DriverState::Quitting;
		}

		let result = self
			.inner
			.transport
			.send(Command::DeleteSession.to_request(&self.inner.session_id))
			.await;

		*self.inner.state.lock() = DriverState::Closed;

		match result {
			Ok(_) => {
				debug!(target = "mobdrive.driver", session = %self.inner.session_id, "session deleted");
				Ok(())
			}
			Err(e) if e.is_session_gone() => {
				debug!(target = "mobdrive.driver", session = %self.inner.session_id, "session already gone on server");
				Ok(())
			}
			Err(e) => {
				warn!(target = "mobdrive.driver", session = %self.inner.session_id, error = %e, "session delete failed");
				Err(e)
			}
		}
	}

	fn closed(&self, state: DriverState) -> Error {
		Error::SessionClosed {
			session_id: self.inner.session_id.clone(),
			state: state.as_str(),
		}
	}
}

#[cfg(test)]
mod tests {
	use mobdrive_protocol::{Locator, Method};
	use serde_json::json;

	use super::*;
	use crate::testing::{FakeServer, config_for};

	async fn open(server: &FakeServer) -> DriverHandle {
		let config = config_for("android");
		let caps = CapabilitySet::build(Platform::Android, &config).unwrap();
		server
			.factory()
			.open(Platform::Android, "http://127.0.0.1:4723", caps, std::time::Duration::ZERO)
			.await
			.unwrap()
	}

	#[tokio::test]
	async fn execute_unwraps_value() {
		let server = FakeServer::new();
		server.respond(Method::Post, "element", json!({ "element-6066-11e4-a52e-4f735466cecf": "el-1" }));
		let driver = open(&server).await;

		let value = driver.execute(&Command::FindElement(Locator::accessibility_id("Login"))).await.unwrap();
		assert_eq!(value["element-6066-11e4-a52e-4f735466cecf"], "el-1");
	}

	#[tokio::test]
	async fn quit_closes_every_clone_and_deletes_once() {
		let server = FakeServer::new();
		let driver = open(&server).await;
		let clone = driver.clone();

		driver.quit().await.unwrap();
		clone.quit().await.unwrap();

		assert_eq!(clone.state(), DriverState::Closed);
		assert_eq!(server.count(Method::Delete, "session/fake-1"), 1);
		let err = clone.execute(&Command::Screenshot).await.unwrap_err();
		assert!(matches!(err, Error::SessionClosed { state: "closed", .. }));
	}

	#[tokio::test]
	async fn failed_delete_still_closes() {
		let server = FakeServer::new();
		let driver = open(&server).await;
		server.fail(Method::Delete, "session/fake-1", "unknown error", "device offline");

		assert!(driver.quit().await.is_err());
		assert_eq!(driver.state(), DriverState::Closed);
	}

	#[tokio::test]
	async fn execute_as_reports_shape_mismatch() {
		let server = FakeServer::new();
		server.respond(Method::Get, "appium/device/is_keyboard_shown", json!("yes"));
		let driver = open(&server).await;

		let err = driver.execute_as::<bool>(&Command::IsKeyboardShown).await.unwrap_err();
		assert!(matches!(err, Error::Protocol(_)));
	}
}
