//! Error types for the session runtime.

use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while configuring, opening, using or closing sessions.
#[derive(Debug, Error)]
pub enum Error {
	/// A configuration value is missing or malformed.
	#[error("Configuration error for '{key}': {message}")]
	Configuration { key: String, message: String },

	/// The configured platform is not one of the supported variants.
	#[error("Unsupported platform '{0}'. Supported: android, ios")]
	UnsupportedPlatform(String),

	/// The remote handshake failed or the endpoint is unusable.
	#[error("Failed to start {platform} session at {endpoint}: {source}")]
	SessionStart {
		platform: String,
		endpoint: String,
		#[source]
		source: Box<Error>,
	},

	/// The worker already owns a live session.
	#[error("Session already initialized for worker '{worker}'; quit it before initializing again")]
	AlreadyInitialized { worker: String },

	/// The worker has no session.
	#[error("Session not initialized for worker '{worker}'; call initialize() first")]
	NotInitialized { worker: String },

	/// A command was issued to a session that is quitting or closed.
	#[error("Session {session_id} is {state}; commands are no longer accepted")]
	SessionClosed { session_id: String, state: &'static str },

	/// HTTP-level failure talking to the automation server.
	#[error("Transport error: {0}")]
	Transport(String),

	/// The automation server rejected a command.
	#[error("{error}: {message}")]
	Remote {
		/// W3C error code (e.g. "no such element", "stale element reference").
		error: String,
		message: String,
		stacktrace: Option<String>,
	},

	/// The server answered with something that is not a valid protocol response.
	#[error("Protocol error: {0}")]
	Protocol(String),

	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

impl Error {
	pub(crate) fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
		Error::Configuration {
			key: key.into(),
			message: message.into(),
		}
	}

	/// Returns the W3C error code if this is a remote error.
	pub fn remote_code(&self) -> Option<&str> {
		match self {
			Error::Remote { error, .. } => Some(error),
			_ => None,
		}
	}

	/// Returns true for remote errors that describe transient UI state.
	///
	/// These are the failures a polling wait keeps retrying; everything else
	/// (transport, closed session, invalid selector) is final.
	pub fn is_transient(&self) -> bool {
		matches!(
			self.remote_code(),
			Some("no such element" | "stale element reference" | "element not interactable" | "element click intercepted")
		)
	}

	/// Returns true if the session can no longer accept commands.
	pub fn is_session_gone(&self) -> bool {
		match self {
			Error::SessionClosed { .. } => true,
			Error::Remote { error, .. } => error == "invalid session id",
			_ => false,
		}
	}
}
