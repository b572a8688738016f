//! Error types for waits, actions, pages and hooks.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for mobdrive operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced to test code.
#[derive(Debug, Error)]
pub enum Error {
	/// Session, transport or configuration failure from the runtime.
	#[error(transparent)]
	Runtime(#[from] mobdrive_runtime::Error),

	/// A polled condition never became true.
	///
	/// Only raised when the condition itself kept failing; transport failures
	/// and closed sessions propagate as [`Error::Runtime`] instead.
	#[error("Timed out after {elapsed:?} (limit {timeout:?}) waiting for {condition}{}", last_failure_suffix(.last_failure))]
	WaitTimeout {
		condition: String,
		timeout: Duration,
		elapsed: Duration,
		last_failure: Option<String>,
	},

	/// A predicate evaluated cleanly but its condition does not hold yet.
	#[error("Condition not met: {0}")]
	ConditionNotMet(String),

	/// An interaction with a named element failed.
	#[error("Failed to {action} '{element}': {source}")]
	ActionFailed {
		element: String,
		action: &'static str,
		#[source]
		source: Box<Error>,
	},

	/// Writing a test artifact failed.
	#[error("Failed to write artifact {path}: {source}")]
	Artifact {
		path: String,
		#[source]
		source: std::io::Error,
	},

	/// Base64 payload from the server could not be decoded.
	#[error("Failed to decode {what}: {message}")]
	Decode { what: &'static str, message: String },
}

fn last_failure_suffix(last: &Option<String>) -> String {
	match last {
		Some(reason) => format!(" (last failure: {reason})"),
		None => String::new(),
	}
}

impl Error {
	/// Returns true if a polling wait should keep trying after this error.
	pub fn is_retryable(&self) -> bool {
		match self {
			Error::ConditionNotMet(_) => true,
			Error::Runtime(e) => e.is_transient(),
			_ => false,
		}
	}

	/// Returns true if this is a wait timeout, directly or wrapped by an action.
	pub fn is_timeout(&self) -> bool {
		match self {
			Error::WaitTimeout { .. } => true,
			Error::ActionFailed { source, .. } => source.is_timeout(),
			_ => false,
		}
	}

	/// Underlying runtime error, looking through action wrappers.
	pub fn runtime(&self) -> Option<&mobdrive_runtime::Error> {
		match self {
			Error::Runtime(e) => Some(e),
			Error::ActionFailed { source, .. } => source.runtime(),
			_ => None,
		}
	}
}
