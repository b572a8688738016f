//! Request transport to the automation server.
//!
//! [`Transport`] is the seam between session handles and the wire: the HTTP
//! implementation talks to a real Appium server, while tests plug in an
//! in-process fake through the same trait. [`Connector`] produces a transport
//! for an endpoint and is what the driver factory holds.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mobdrive_protocol::{Method, WireError, WireRequest};
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::error::{Error, Result};

/// Default request timeout. Session creation installs the app and can be slow.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Sends one request and returns the full response body.
///
/// Implementations map W3C error envelopes to [`Error::Remote`] and
/// connection failures to [`Error::Transport`].
#[async_trait]
pub trait Transport: Send + Sync {
	async fn send(&self, request: WireRequest) -> Result<Value>;
}

/// Opens a [`Transport`] for an endpoint.
pub trait Connector: Send + Sync {
	fn connect(&self, endpoint: &Url) -> Result<Arc<dyn Transport>>;
}

/// HTTP connector sharing one connection pool across every session.
#[derive(Clone)]
pub struct HttpConnector {
	client: reqwest::Client,
}

impl HttpConnector {
	pub fn new() -> Result<Self> {
		Self::with_timeout(DEFAULT_REQUEST_TIMEOUT)
	}

	pub fn with_timeout(timeout: Duration) -> Result<Self> {
		let client = reqwest::Client::builder()
			.timeout(timeout)
			.build()
			.map_err(|e| Error::Transport(format!("failed to build HTTP client: {e}")))?;
		Ok(Self { client })
	}
}

impl Connector for HttpConnector {
	fn connect(&self, endpoint: &Url) -> Result<Arc<dyn Transport>> {
		if !matches!(endpoint.scheme(), "http" | "https") {
			return Err(Error::Transport(format!("unsupported endpoint scheme '{}'", endpoint.scheme())));
		}
		Ok(Arc::new(HttpTransport::new(self.client.clone(), endpoint.clone())))
	}
}

/// JSON-over-HTTP transport rooted at a server base URL.
pub struct HttpTransport {
	client: reqwest::Client,
	base: Url,
}

impl HttpTransport {
	pub fn new(client: reqwest::Client, mut base: Url) -> Self {
		if !base.path().ends_with('/') {
			let path = format!("{}/", base.path());
			base.set_path(&path);
		}
		Self { client, base }
	}

	fn url_for(&self, path: &str) -> Result<Url> {
		self.base
			.join(path)
			.map_err(|e| Error::Protocol(format!("invalid request path '{path}': {e}")))
	}
}

#[async_trait]
impl Transport for HttpTransport {
	async fn send(&self, request: WireRequest) -> Result<Value> {
		let url = self.url_for(&request.path)?;
		debug!(target = "mobdrive.transport", method = %request.method, %url, "request");

		let builder = match request.method {
			Method::Get => self.client.get(url),
			Method::Post => self.client.post(url),
			Method::Delete => self.client.delete(url),
		};
		let builder = match &request.body {
			Some(body) => builder.json(body),
			None => builder,
		};

		let response = builder.send().await.map_err(|e| Error::Transport(e.to_string()))?;
		let status = response.status();
		let text = response.text().await.map_err(|e| Error::Transport(e.to_string()))?;
		trace!(target = "mobdrive.transport", %status, body = %text, "response");

		let body: Value = if text.trim().is_empty() {
			Value::Null
		} else {
			match serde_json::from_str(&text) {
				Ok(body) => body,
				Err(_) if !status.is_success() => {
					return Err(Error::Transport(format!("HTTP {status}: {}", text.trim())));
				}
				Err(e) => return Err(Error::Protocol(format!("response is not JSON: {e}"))),
			}
		};

		if let Some(WireError { error, message, stacktrace }) = WireError::from_body(&body) {
			return Err(Error::Remote { error, message, stacktrace });
		}
		if !status.is_success() {
			return Err(Error::Transport(format!("HTTP {status}")));
		}
		Ok(body)
	}
}
