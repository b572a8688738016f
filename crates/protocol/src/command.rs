//! Session commands and their mapping onto HTTP requests.

use std::time::Duration;

use serde_json::{Value, json};

use crate::locator::Locator;
use crate::types::{ActionSequence, ElementRef};

/// HTTP method of a wire request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
	Get,
	Post,
	Delete,
}

impl std::fmt::Display for Method {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Method::Get => write!(f, "GET"),
			Method::Post => write!(f, "POST"),
			Method::Delete => write!(f, "DELETE"),
		}
	}
}

/// A fully addressed request, relative to the server base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct WireRequest {
	pub method: Method,
	/// Path without a leading slash, e.g. `session/abc/element`.
	pub path: String,
	pub body: Option<Value>,
}

impl WireRequest {
	pub fn get(path: impl Into<String>) -> Self {
		Self {
			method: Method::Get,
			path: path.into(),
			body: None,
		}
	}

	pub fn post(path: impl Into<String>, body: Value) -> Self {
		Self {
			method: Method::Post,
			path: path.into(),
			body: Some(body),
		}
	}

	pub fn delete(path: impl Into<String>) -> Self {
		Self {
			method: Method::Delete,
			path: path.into(),
			body: None,
		}
	}

	/// New-session handshake carrying W3C `alwaysMatch` capabilities.
	pub fn new_session(always_match: Value) -> Self {
		Self::post(
			"session",
			json!({
				"capabilities": {
					"alwaysMatch": always_match,
					"firstMatch": [{}],
				}
			}),
		)
	}
}

/// Commands issued against a live session.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
	SetImplicitWait(Duration),
	FindElement(Locator),
	ElementClick(ElementRef),
	ElementClear(ElementRef),
	ElementSendKeys { element: ElementRef, text: String },
	ElementDisplayed(ElementRef),
	ElementEnabled(ElementRef),
	ElementRect(ElementRef),
	PerformActions(Vec<ActionSequence>),
	Screenshot,
	StartRecordingScreen,
	StopRecordingScreen,
	IsKeyboardShown,
	HideKeyboard,
	DeleteSession,
}

impl Command {
	/// Short name used in logs and error messages.
	pub fn name(&self) -> &'static str {
		match self {
			Command::SetImplicitWait(_) => "setImplicitWait",
			Command::FindElement(_) => "findElement",
			Command::ElementClick(_) => "elementClick",
			Command::ElementClear(_) => "elementClear",
			Command::ElementSendKeys { .. } => "elementSendKeys",
			Command::ElementDisplayed(_) => "elementDisplayed",
			Command::ElementEnabled(_) => "elementEnabled",
			Command::ElementRect(_) => "elementRect",
			Command::PerformActions(_) => "performActions",
			Command::Screenshot => "screenshot",
			Command::StartRecordingScreen => "startRecordingScreen",
			Command::StopRecordingScreen => "stopRecordingScreen",
			Command::IsKeyboardShown => "isKeyboardShown",
			Command::HideKeyboard => "hideKeyboard",
			Command::DeleteSession => "deleteSession",
		}
	}

	/// Builds the wire request for this command within `session_id`.
	pub fn to_request(&self, session_id: &str) -> WireRequest {
		let base = format!("session/{session_id}");
		let element = |el: &ElementRef, tail: &str| format!("{base}/element/{}/{tail}", el.id());

		match self {
			Command::SetImplicitWait(wait) => WireRequest::post(format!("{base}/timeouts"), json!({ "implicit": wait.as_millis() as u64 })),
			Command::FindElement(locator) => WireRequest::post(format!("{base}/element"), json!({ "using": locator.strategy.as_str(), "value": locator.value })),
			Command::ElementClick(el) => WireRequest::post(element(el, "click"), json!({})),
			Command::ElementClear(el) => WireRequest::post(element(el, "clear"), json!({})),
			Command::ElementSendKeys { element: el, text } => WireRequest::post(element(el, "value"), json!({ "text": text })),
			Command::ElementDisplayed(el) => WireRequest::get(element(el, "displayed")),
			Command::ElementEnabled(el) => WireRequest::get(element(el, "enabled")),
			Command::ElementRect(el) => WireRequest::get(element(el, "rect")),
			Command::PerformActions(actions) => WireRequest::post(format!("{base}/actions"), json!({ "actions": actions })),
			Command::Screenshot => WireRequest::get(format!("{base}/screenshot")),
			Command::StartRecordingScreen => WireRequest::post(format!("{base}/appium/start_recording_screen"), json!({ "options": {} })),
			Command::StopRecordingScreen => WireRequest::post(format!("{base}/appium/stop_recording_screen"), json!({ "options": {} })),
			Command::IsKeyboardShown => WireRequest::get(format!("{base}/appium/device/is_keyboard_shown")),
			Command::HideKeyboard => WireRequest::post(format!("{base}/appium/device/hide_keyboard"), json!({})),
			Command::DeleteSession => WireRequest::delete(format!("session/{session_id}")),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::types::Point;

	#[test]
	fn find_element_posts_strategy_and_value() {
		let req = Command::FindElement(Locator::accessibility_id("Log in")).to_request("s1");
		assert_eq!(req.method, Method::Post);
		assert_eq!(req.path, "session/s1/element");
		assert_eq!(req.body, Some(json!({ "using": "accessibility id", "value": "Log in" })));
	}

	#[test]
	fn element_commands_address_the_element() {
		let el = ElementRef("e-7".into());
		assert_eq!(Command::ElementClick(el.clone()).to_request("s").path, "session/s/element/e-7/click");
		assert_eq!(Command::ElementRect(el.clone()).to_request("s").method, Method::Get);
		let keys = Command::ElementSendKeys {
			element: el,
			text: "hi".into(),
		}
		.to_request("s");
		assert_eq!(keys.path, "session/s/element/e-7/value");
		assert_eq!(keys.body, Some(json!({ "text": "hi" })));
	}

	#[test]
	fn implicit_wait_is_sent_in_milliseconds() {
		let req = Command::SetImplicitWait(Duration::from_secs(10)).to_request("s");
		assert_eq!(req.path, "session/s/timeouts");
		assert_eq!(req.body, Some(json!({ "implicit": 10_000 })));
	}

	#[test]
	fn appium_extensions_use_vendor_paths() {
		assert_eq!(Command::StartRecordingScreen.to_request("s").path, "session/s/appium/start_recording_screen");
		assert_eq!(Command::StopRecordingScreen.to_request("s").path, "session/s/appium/stop_recording_screen");
		assert_eq!(Command::IsKeyboardShown.to_request("s").path, "session/s/appium/device/is_keyboard_shown");
	}

	#[test]
	fn delete_session_targets_session_root() {
		let req = Command::DeleteSession.to_request("abc");
		assert_eq!(req.method, Method::Delete);
		assert_eq!(req.path, "session/abc");
		assert!(req.body.is_none());
	}

	#[test]
	fn perform_actions_wraps_sequences() {
		let seq = ActionSequence::tap(Point::new(1, 2), Duration::from_millis(200));
		let req = Command::PerformActions(vec![seq]).to_request("s");
		let body = req.body.unwrap();
		assert_eq!(body["actions"][0]["id"], "finger");
	}

	#[test]
	fn new_session_uses_always_match() {
		let req = WireRequest::new_session(json!({ "platformName": "Android" }));
		assert_eq!(req.path, "session");
		assert_eq!(req.body.unwrap()["capabilities"]["alwaysMatch"]["platformName"], "Android");
	}
}
