//! Per-worker session ownership.
//!
//! Each test worker owns at most one session. Workers are identified by an
//! explicit [`WorkerId`] passed to every call, so a session stays with its
//! worker even when the worker's async task hops between threads.
//!
//! The registry is backed by a [`DashMap`]; shard locks are never held across
//! an `.await`, so one worker's slow session start never blocks another.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{debug, info, warn};

use crate::capabilities::CapabilitySet;
use crate::config::TestConfig;
use crate::driver::{DriverHandle, DriverState};
use crate::error::{Error, Result};
use crate::factory::DriverFactory;

/// Identity of a test worker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkerId(Arc<str>);

impl WorkerId {
	pub fn new(name: impl AsRef<str>) -> Self {
		Self(Arc::from(name.as_ref()))
	}

	/// Identity derived from the calling OS thread.
	///
	/// Suitable for thread-per-worker runners; async runners should name
	/// their workers explicitly.
	pub fn current_thread() -> Self {
		let thread = std::thread::current();
		match thread.name() {
			Some(name) => Self::new(format!("{name}-{:?}", thread.id())),
			None => Self::new(format!("{:?}", thread.id())),
		}
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for WorkerId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for WorkerId {
	fn from(name: &str) -> Self {
		Self::new(name)
	}
}

/// Maps workers to their live session.
pub struct SessionRegistry {
	sessions: DashMap<WorkerId, DriverHandle>,
	factory: DriverFactory,
	config: TestConfig,
}

impl SessionRegistry {
	pub fn new(factory: DriverFactory, config: TestConfig) -> Self {
		Self {
			sessions: DashMap::new(),
			factory,
			config,
		}
	}

	/// Registry over HTTP using the process-wide configuration.
	pub fn from_global() -> Result<Self> {
		Ok(Self::new(DriverFactory::http()?, TestConfig::global()?.clone()))
	}

	pub fn config(&self) -> &TestConfig {
		&self.config
	}

	/// Opens a session for `worker` from configuration.
	///
	/// The platform is resolved before anything touches the network, so an
	/// unsupported platform fails with no connection attempt. A worker that
	/// already owns a live session gets [`Error::AlreadyInitialized`]; an entry
	/// whose handle was quit directly is replaced.
	pub async fn initialize(&self, worker: &WorkerId) -> Result<DriverHandle> {
		if self.is_initialized(worker) {
			return Err(Error::AlreadyInitialized { worker: worker.to_string() });
		}

		let platform = self.config.platform()?;
		let endpoint = self.config.server_url()?.to_string();
		let implicit_wait = self.config.implicit_wait()?;
		let capabilities = CapabilitySet::build(platform, &self.config)?;

		info!(target = "mobdrive.registry", %worker, %platform, "initializing session");
		let handle = self.factory.open(platform, &endpoint, capabilities, implicit_wait).await?;

		match self.sessions.entry(worker.clone()) {
			Entry::Vacant(slot) => {
				slot.insert(handle.clone());
				return Ok(handle);
			}
			Entry::Occupied(mut slot) if !slot.get().is_live() => {
				debug!(target = "mobdrive.registry", %worker, stale = slot.get().session_id(), "replacing closed session");
				slot.insert(handle.clone());
				return Ok(handle);
			}
			Entry::Occupied(_) => {}
		}

		// Raced with a concurrent initialize for the same worker.
		warn!(target = "mobdrive.registry", %worker, "concurrent initialize; discarding new session");
		let _ = handle.quit().await;
		Err(Error::AlreadyInitialized { worker: worker.to_string() })
	}

	/// Returns the worker's live session.
	pub fn get(&self, worker: &WorkerId) -> Result<DriverHandle> {
		self.sessions
			.get(worker)
			.map(|entry| entry.value().clone())
			.filter(DriverHandle::is_live)
			.ok_or_else(|| Error::NotInitialized { worker: worker.to_string() })
	}

	/// True while the worker holds a session that still accepts commands.
	pub fn is_initialized(&self, worker: &WorkerId) -> bool {
		self.sessions.get(worker).is_some_and(|entry| entry.value().is_live())
	}

	/// Lifecycle state of the worker's session; `Absent` when it has none.
	pub fn state(&self, worker: &WorkerId) -> DriverState {
		self.sessions
			.get(worker)
			.map(|entry| entry.value().state())
			.unwrap_or(DriverState::Absent)
	}

	/// Ends the worker's session.
	///
	/// The entry is removed before the remote delete, so the worker is
	/// uninitialized afterwards whatever the server answers. A worker without a
	/// session is a no-op.
	pub async fn quit(&self, worker: &WorkerId) -> Result<()> {
		let Some((_, handle)) = self.sessions.remove(worker) else {
			debug!(target = "mobdrive.registry", %worker, "quit without session");
			return Ok(());
		};

		info!(target = "mobdrive.registry", %worker, session = handle.session_id(), "quitting session");
		handle.quit().await.inspect_err(|e| {
			warn!(target = "mobdrive.registry", %worker, error = %e, "session quit reported an error");
		})
	}

	/// Quits every registered session, returning the first error.
	pub async fn quit_all(&self) -> Result<()> {
		let workers: Vec<WorkerId> = self.sessions.iter().map(|entry| entry.key().clone()).collect();
		let mut first_error = None;
		for worker in workers {
			if let Err(e) = self.quit(&worker).await {
				first_error.get_or_insert(e);
			}
		}
		first_error.map_or(Ok(()), Err)
	}

	/// Number of workers currently holding a live session.
	pub fn active_sessions(&self) -> usize {
		self.sessions.iter().filter(|entry| entry.value().is_live()).count()
	}
}
