//! In-process fake automation server.
//!
//! [`FakeServer`] implements both [`Connector`] and [`Transport`], records
//! every request and connection attempt, and answers through scriptable
//! routes. Out of the box it creates sessions (`fake-1`, `fake-2`, ...),
//! accepts timeouts and deletes, and rejects everything else with
//! `unknown command`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use mobdrive_protocol::{Method, WireRequest};
use parking_lot::Mutex;
use serde_json::{Value, json};
use url::Url;

use crate::config::{TestConfig, keys};
use crate::error::{Error, Result};
use crate::factory::DriverFactory;
use crate::registry::SessionRegistry;
use crate::transport::{Connector, Transport};

type Handler = Arc<dyn Fn(&WireRequest) -> Result<Value> + Send + Sync>;

struct Route {
	method: Method,
	suffix: String,
	handler: Handler,
}

impl Route {
	fn matches(&self, request: &WireRequest) -> bool {
		self.method == request.method && path_matches(&request.path, &self.suffix)
	}
}

fn path_matches(path: &str, suffix: &str) -> bool {
	let suffix = suffix.trim_start_matches('/');
	path == suffix || path.ends_with(&format!("/{suffix}"))
}

#[derive(Default)]
struct State {
	requests: Mutex<Vec<WireRequest>>,
	routes: Mutex<Vec<Route>>,
	connects: AtomicUsize,
	sessions: AtomicUsize,
	refuse: AtomicBool,
}

/// Scriptable stand-in for an Appium server.
#[derive(Clone, Default)]
pub struct FakeServer {
	state: Arc<State>,
}

impl FakeServer {
	pub fn new() -> Self {
		Self::default()
	}

	/// Driver factory connected to this server.
	pub fn factory(&self) -> DriverFactory {
		DriverFactory::new(Arc::new(self.clone()))
	}

	/// Registry over this server with `config`.
	pub fn registry(&self, config: TestConfig) -> SessionRegistry {
		SessionRegistry::new(self.factory(), config)
	}

	/// Answers `method` requests whose path ends with `suffix`.
	///
	/// The handler returns the unwrapped `value`; routes added later take
	/// precedence over earlier ones and over the defaults.
	pub fn route<F>(&self, method: Method, suffix: &str, handler: F) -> &Self
	where
		F: Fn(&WireRequest) -> Result<Value> + Send + Sync + 'static,
	{
		self.state.routes.lock().push(Route {
			method,
			suffix: suffix.to_string(),
			handler: Arc::new(handler),
		});
		self
	}

	/// Answers with a fixed value.
	pub fn respond(&self, method: Method, suffix: &str, value: Value) -> &Self {
		self.route(method, suffix, move |_| Ok(value.clone()))
	}

	/// Answers with a W3C error.
	pub fn fail(&self, method: Method, suffix: &str, code: &str, message: &str) -> &Self {
		let (code, message) = (code.to_string(), message.to_string());
		self.route(method, suffix, move |_| Err(remote(&code, &message)))
	}

	/// Makes every further `connect` fail with a transport error.
	pub fn refuse_connections(&self) {
		self.state.refuse.store(true, Ordering::SeqCst);
	}

	pub fn requests(&self) -> Vec<WireRequest> {
		self.state.requests.lock().clone()
	}

	/// Number of recorded requests matching `method` and `suffix`.
	pub fn count(&self, method: Method, suffix: &str) -> usize {
		self.state
			.requests
			.lock()
			.iter()
			.filter(|r| r.method == method && path_matches(&r.path, suffix))
			.count()
	}

	/// Number of connection attempts, successful or not.
	pub fn connect_count(&self) -> usize {
		self.state.connects.load(Ordering::SeqCst)
	}

	/// Number of sessions this server has created.
	pub fn sessions_created(&self) -> usize {
		self.state.sessions.load(Ordering::SeqCst)
	}

	fn default_response(&self, request: &WireRequest) -> Result<Value> {
		match (request.method, request.path.as_str()) {
			(Method::Post, "session") => {
				let n = self.state.sessions.fetch_add(1, Ordering::SeqCst) + 1;
				let caps = request
					.body
					.as_ref()
					.and_then(|b| b.pointer("/capabilities/alwaysMatch"))
					.cloned()
					.unwrap_or_else(|| json!({}));
				Ok(json!({ "sessionId": format!("fake-{n}"), "capabilities": caps }))
			}
			(Method::Post, path) if path.ends_with("/timeouts") => Ok(Value::Null),
			(Method::Delete, path) if path.starts_with("session/") && path.matches('/').count() == 1 => Ok(Value::Null),
			_ => Err(remote("unknown command", &format!("{} {}", request.method, request.path))),
		}
	}
}

fn remote(code: &str, message: &str) -> Error {
	Error::Remote {
		error: code.to_string(),
		message: message.to_string(),
		stacktrace: None,
	}
}

impl Connector for FakeServer {
	fn connect(&self, _endpoint: &Url) -> Result<Arc<dyn Transport>> {
		self.state.connects.fetch_add(1, Ordering::SeqCst);
		if self.state.refuse.load(Ordering::SeqCst) {
			return Err(Error::Transport("connection refused".to_string()));
		}
		Ok(Arc::new(self.clone()))
	}
}

#[async_trait]
impl Transport for FakeServer {
	async fn send(&self, request: WireRequest) -> Result<Value> {
		self.state.requests.lock().push(request.clone());
		let handler = self
			.state
			.routes
			.lock()
			.iter()
			.rev()
			.find(|route| route.matches(&request))
			.map(|route| route.handler.clone());
		let value = match handler {
			Some(handler) => handler(&request)?,
			None => self.default_response(&request)?,
		};
		Ok(json!({ "value": value }))
	}
}

/// Configuration with every mandatory key for `platform` filled in.
pub fn config_for(platform: &str) -> TestConfig {
	TestConfig::from_pairs([
		(keys::PLATFORM, platform),
		(keys::SERVER_URL, "http://127.0.0.1:4723"),
		(keys::IMPLICIT_WAIT, "0"),
		(keys::ANDROID_PLATFORM_VERSION, "14"),
		(keys::ANDROID_DEVICE_NAME, "emulator-5554"),
		(keys::ANDROID_APP, "/apps/app-debug.apk"),
		(keys::IOS_PLATFORM_VERSION, "18.6"),
		(keys::IOS_DEVICE_NAME, "iPhone 16"),
		(keys::IOS_BUNDLE_ID, "com.example.app"),
	])
}
