use std::time::Duration;

use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use mobdrive_runtime::protocol::{Command, Locator};
use mobdrive_runtime::testing::config_for;
use mobdrive_runtime::{CapabilitySet, DriverFactory, DriverState, Error, Platform};
use serde_json::{Value, json};

async fn spawn_server() -> String {
	let app = Router::new()
		.route(
			"/wd/hub/session",
			post(|Json(body): Json<Value>| async move {
				let caps = body["capabilities"]["alwaysMatch"].clone();
				Json(json!({ "value": { "sessionId": "http-1", "capabilities": caps } }))
			}),
		)
		.route("/wd/hub/session/{id}/timeouts", post(|| async { Json(json!({ "value": null })) }))
		.route(
			"/wd/hub/session/{id}/element",
			post(|Json(body): Json<Value>| async move {
				if body["value"] == "Login" {
					(StatusCode::OK, Json(json!({ "value": { "element-6066-11e4-a52e-4f735466cecf": "el-7" } })))
				} else {
					(
						StatusCode::NOT_FOUND,
						Json(json!({ "value": { "error": "no such element", "message": "not on screen", "stacktrace": "" } })),
					)
				}
			}),
		)
		.route("/wd/hub/session/{id}/screenshot", get(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }))
		.route(
			"/wd/hub/session/{id}",
			delete(|Path(id): Path<String>| async move { Json(json!({ "value": null, "deleted": id })) }),
		);

	let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();
	tokio::spawn(async move {
		axum::serve(listener, app).await.unwrap();
	});
	format!("http://{addr}/wd/hub")
}

async fn open(endpoint: &str) -> mobdrive_runtime::DriverHandle {
	let caps = CapabilitySet::build(Platform::Android, &config_for("android")).unwrap();
	DriverFactory::http()
		.unwrap()
		.open(Platform::Android, endpoint, caps, Duration::from_secs(5))
		.await
		.unwrap()
}

#[tokio::test]
async fn session_round_trip_over_http() {
	let endpoint = spawn_server().await;
	let driver = open(&endpoint).await;
	assert_eq!(driver.session_id(), "http-1");

	let value = driver.execute(&Command::FindElement(Locator::accessibility_id("Login"))).await.unwrap();
	assert_eq!(value["element-6066-11e4-a52e-4f735466cecf"], "el-7");

	driver.quit().await.unwrap();
	assert_eq!(driver.state(), DriverState::Closed);
}

#[tokio::test]
async fn w3c_error_envelope_becomes_remote_error() {
	let endpoint = spawn_server().await;
	let driver = open(&endpoint).await;

	let err = driver
		.execute(&Command::FindElement(Locator::accessibility_id("Missing")))
		.await
		.unwrap_err();
	assert_eq!(err.remote_code(), Some("no such element"));
	assert!(err.is_transient());
}

#[tokio::test]
async fn non_json_failure_is_transport_error() {
	let endpoint = spawn_server().await;
	let driver = open(&endpoint).await;

	let err = driver.execute(&Command::Screenshot).await.unwrap_err();
	assert!(matches!(err, Error::Transport(ref m) if m.contains("502")));
}

#[tokio::test]
async fn unreachable_server_is_session_start_error() {
	let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
	let addr = listener.local_addr().unwrap();
	drop(listener);

	let caps = CapabilitySet::build(Platform::Android, &config_for("android")).unwrap();
	let err = DriverFactory::http()
		.unwrap()
		.open(Platform::Android, &format!("http://{addr}"), caps, Duration::ZERO)
		.await
		.unwrap_err();
	assert!(matches!(err, Error::SessionStart { .. }));
}
