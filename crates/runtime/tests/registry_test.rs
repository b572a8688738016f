use std::sync::Arc;

use mobdrive_runtime::protocol::Method;
use mobdrive_runtime::testing::{FakeServer, config_for};
use mobdrive_runtime::{DriverState, Error, SessionRegistry, WorkerId, keys};

#[tokio::test]
async fn get_before_initialize_fails() {
	let server = FakeServer::new();
	let registry = server.registry(config_for("android"));
	let worker = WorkerId::new("fresh");

	assert!(!registry.is_initialized(&worker));
	assert!(matches!(registry.get(&worker), Err(Error::NotInitialized { .. })));
	assert_eq!(registry.state(&worker), DriverState::Absent);
}

#[tokio::test]
async fn android_lifecycle_end_to_end() {
	let server = FakeServer::new();
	let registry = server.registry(config_for("android"));
	let worker = WorkerId::new("worker-1");

	let opened = registry.initialize(&worker).await.unwrap();
	let driver = registry.get(&worker).unwrap();
	assert!(driver.same_session(&opened));
	assert_eq!(driver.state(), DriverState::Live);
	assert_eq!(driver.capabilities().get("automationName").and_then(|v| v.as_str()), Some("UiAutomator2"));

	registry.quit(&worker).await.unwrap();
	assert_eq!(driver.state(), DriverState::Closed);
	assert!(!registry.is_initialized(&worker));
	assert!(matches!(registry.get(&worker), Err(Error::NotInitialized { .. })));
	assert_eq!(server.count(Method::Delete, "session/fake-1"), 1);
}

#[tokio::test]
async fn quit_is_idempotent_and_safe_without_initialize() {
	let server = FakeServer::new();
	let registry = server.registry(config_for("ios"));
	let worker = WorkerId::new("cleanup");

	registry.quit(&worker).await.unwrap();

	registry.initialize(&worker).await.unwrap();
	registry.quit(&worker).await.unwrap();
	registry.quit(&worker).await.unwrap();
	assert_eq!(server.count(Method::Delete, "session/fake-1"), 1);
}

#[tokio::test]
async fn second_initialize_is_rejected() {
	let server = FakeServer::new();
	let registry = server.registry(config_for("android"));
	let worker = WorkerId::new("w");

	registry.initialize(&worker).await.unwrap();
	let err = registry.initialize(&worker).await.unwrap_err();
	assert!(matches!(err, Error::AlreadyInitialized { ref worker } if worker == "w"));
	assert_eq!(server.sessions_created(), 1);
}

#[tokio::test]
async fn handle_quit_outside_registry_frees_the_worker() {
	let server = FakeServer::new();
	let registry = server.registry(config_for("android"));
	let worker = WorkerId::new("w");

	let first = registry.initialize(&worker).await.unwrap();
	first.quit().await.unwrap();

	assert_eq!(registry.state(&worker), DriverState::Closed);
	assert!(!registry.is_initialized(&worker));
	assert!(matches!(registry.get(&worker), Err(Error::NotInitialized { .. })));
	assert_eq!(registry.active_sessions(), 0);

	let second = registry.initialize(&worker).await.unwrap();
	assert!(!second.same_session(&first));
	assert_eq!(second.session_id(), "fake-2");
	assert!(registry.get(&worker).unwrap().same_session(&second));
	assert_eq!(server.sessions_created(), 2);
}

#[tokio::test]
async fn unsupported_platform_never_touches_the_network() {
	let server = FakeServer::new();
	let registry = server.registry(config_for("windows"));
	let worker = WorkerId::new("w");

	let err = registry.initialize(&worker).await.unwrap_err();
	assert!(matches!(err, Error::UnsupportedPlatform(ref p) if p == "windows"));
	assert_eq!(server.connect_count(), 0);
	assert!(server.requests().is_empty());
	assert!(!registry.is_initialized(&worker));
}

#[tokio::test]
async fn missing_mandatory_key_names_the_key() {
	let server = FakeServer::new();
	let registry = server.registry(config_for("ios").without(keys::IOS_BUNDLE_ID));

	match registry.initialize(&WorkerId::new("w")).await {
		Err(Error::Configuration { key, .. }) => assert_eq!(key, keys::IOS_BUNDLE_ID),
		other => panic!("unexpected {other:?}"),
	}
	assert_eq!(server.connect_count(), 0);
}

#[tokio::test]
async fn failed_start_leaves_worker_uninitialized() {
	let server = FakeServer::new();
	server.fail(Method::Post, "session", "session not created", "no device");
	let registry = server.registry(config_for("android"));
	let worker = WorkerId::new("w");

	let err = registry.initialize(&worker).await.unwrap_err();
	assert!(matches!(err, Error::SessionStart { .. }));
	assert!(!registry.is_initialized(&worker));
	registry.quit(&worker).await.unwrap();
}

#[tokio::test]
async fn failed_remote_quit_still_removes_entry() {
	let server = FakeServer::new();
	let registry = server.registry(config_for("android"));
	let worker = WorkerId::new("w");
	registry.initialize(&worker).await.unwrap();
	server.fail(Method::Delete, "session/fake-1", "unknown error", "device offline");

	assert!(registry.quit(&worker).await.is_err());
	assert!(!registry.is_initialized(&worker));
}

#[test]
fn workers_on_separate_threads_get_separate_sessions() {
	let server = FakeServer::new();
	let registry = Arc::new(server.registry(config_for("android")));

	let handles: Vec<_> = (0..2)
		.map(|_| {
			let registry = Arc::clone(&registry);
			std::thread::spawn(move || {
				let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
				rt.block_on(async {
					let worker = WorkerId::current_thread();
					let driver = registry.initialize(&worker).await.unwrap();
					assert!(registry.get(&worker).unwrap().same_session(&driver));
					(worker, driver.session_id().to_string())
				})
			})
		})
		.collect();

	let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
	assert_ne!(results[0].0, results[1].0);
	assert_ne!(results[0].1, results[1].1);
	assert_eq!(registry.active_sessions(), 2);

	for (worker, session) in &results {
		assert_eq!(registry.get(worker).unwrap().session_id(), session);
	}
}

#[tokio::test]
async fn quit_all_closes_everything() {
	let server = FakeServer::new();
	let registry = server.registry(config_for("android"));
	let a = registry.initialize(&WorkerId::new("a")).await.unwrap();
	let b = registry.initialize(&WorkerId::new("b")).await.unwrap();

	registry.quit_all().await.unwrap();
	assert_eq!(registry.active_sessions(), 0);
	assert_eq!(a.state(), DriverState::Closed);
	assert_eq!(b.state(), DriverState::Closed);
}
