//! Opening sessions against an automation server.

use std::sync::Arc;
use std::time::Duration;

use mobdrive_protocol::{Command, NewSessionValue, WireRequest, into_value};
use tracing::{debug, info, warn};
use url::Url;

use crate::capabilities::CapabilitySet;
use crate::driver::DriverHandle;
use crate::error::{Error, Result};
use crate::platform::Platform;
use crate::transport::{Connector, HttpConnector, Transport};

/// Creates live [`DriverHandle`]s.
///
/// One attempt per call; retrying is left to the caller.
#[derive(Clone)]
pub struct DriverFactory {
	connector: Arc<dyn Connector>,
}

impl DriverFactory {
	pub fn new(connector: Arc<dyn Connector>) -> Self {
		Self { connector }
	}

	/// Factory speaking HTTP to real servers.
	pub fn http() -> Result<Self> {
		Ok(Self::new(Arc::new(HttpConnector::new()?)))
	}

	/// Opens a session for a platform named by string.
	///
	/// Unknown names fail with [`Error::UnsupportedPlatform`] before any
	/// connection attempt.
	pub async fn open_named(
		&self,
		platform: &str,
		endpoint: &str,
		capabilities: CapabilitySet,
		implicit_wait: Duration,
	) -> Result<DriverHandle> {
		let platform: Platform = platform.parse()?;
		self.open(platform, endpoint, capabilities, implicit_wait).await
	}

	/// Opens a session on `endpoint` and applies `implicit_wait`.
	///
	/// Any failure is reported as [`Error::SessionStart`]. If the server created
	/// a session before a later step failed, that session is deleted first.
	pub async fn open(
		&self,
		platform: Platform,
		endpoint: &str,
		capabilities: CapabilitySet,
		implicit_wait: Duration,
	) -> Result<DriverHandle> {
		let start_error = |source: Error| Error::SessionStart {
			platform: platform.to_string(),
			endpoint: endpoint.to_string(),
			source: Box::new(source),
		};

		if capabilities.platform() != platform {
			return Err(start_error(Error::config(
				"platform",
				format!("capabilities were built for {}", capabilities.platform()),
			)));
		}

		let url = Url::parse(endpoint.trim())
			.map_err(|e| start_error(Error::Transport(format!("malformed endpoint URL: {e}"))))?;
		let transport = self.connector.connect(&url).map_err(start_error)?;

		info!(target = "mobdrive.factory", %platform, endpoint = %url, "opening session");
		let session = new_session(transport.as_ref(), &capabilities).await.map_err(start_error)?;

		if let Err(e) = (platform.profile().handshake)(&session) {
			discard(transport.as_ref(), &session.session_id).await;
			return Err(start_error(e));
		}

		let handle = DriverHandle::live(session.session_id, platform, url, capabilities, transport);
		if let Err(e) = handle.execute(&Command::SetImplicitWait(implicit_wait)).await {
			warn!(target = "mobdrive.factory", session = handle.session_id(), error = %e, "implicit wait rejected");
			let _ = handle.quit().await;
			return Err(start_error(e));
		}

		info!(
			target = "mobdrive.factory",
			%platform,
			session = handle.session_id(),
			implicit_wait_ms = implicit_wait.as_millis() as u64,
			"session ready"
		);
		Ok(handle)
	}
}

async fn new_session(transport: &dyn Transport, capabilities: &CapabilitySet) -> Result<NewSessionValue> {
	let body = transport.send(WireRequest::new_session(capabilities.to_w3c())).await?;
	serde_json::from_value(into_value(body))
		.map_err(|e| Error::Protocol(format!("malformed new-session response: {e}")))
}

async fn discard(transport: &dyn Transport, session_id: &str) {
	debug!(target = "mobdrive.factory", session = session_id, "discarding rejected session");
	if let Err(e) = transport.send(Command::DeleteSession.to_request(session_id)).await {
		warn!(target = "mobdrive.factory", session = session_id, error = %e, "failed to discard session");
	}
}
