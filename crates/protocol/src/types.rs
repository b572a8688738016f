//! Shared value types: capabilities, element references, geometry and pointer input.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// W3C web element identifier key.
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";
/// Legacy JSONWP element key some server versions still return.
const LEGACY_ELEMENT_KEY: &str = "ELEMENT";

/// A single capability value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CapabilityValue {
	Bool(bool),
	Int(i64),
	Str(String),
}

impl CapabilityValue {
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::Str(s) => Some(s),
			_ => None,
		}
	}
}

impl std::fmt::Display for CapabilityValue {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Bool(b) => write!(f, "{b}"),
			Self::Int(i) => write!(f, "{i}"),
			Self::Str(s) => f.write_str(s),
		}
	}
}

impl From<&str> for CapabilityValue {
	fn from(value: &str) -> Self {
		Self::Str(value.to_string())
	}
}

impl From<String> for CapabilityValue {
	fn from(value: String) -> Self {
		Self::Str(value)
	}
}

impl From<bool> for CapabilityValue {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}

impl From<i64> for CapabilityValue {
	fn from(value: i64) -> Self {
		Self::Int(value)
	}
}

/// Opaque reference to an element held by the remote session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementRef(pub String);

impl ElementRef {
	pub fn id(&self) -> &str {
		&self.0
	}
}

impl Serialize for ElementRef {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		let mut map = BTreeMap::new();
		map.insert(ELEMENT_KEY, &self.0);
		map.serialize(serializer)
	}
}

impl<'de> Deserialize<'de> for ElementRef {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let map = BTreeMap::<String, String>::deserialize(deserializer)?;
		map.get(ELEMENT_KEY)
			.or_else(|| map.get(LEGACY_ELEMENT_KEY))
			.cloned()
			.map(ElementRef)
			.ok_or_else(|| serde::de::Error::custom("element reference missing element key"))
	}
}

/// Screen coordinate in device-independent pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
	pub x: i64,
	pub y: i64,
}

impl Point {
	pub fn new(x: i64, y: i64) -> Self {
		Self { x, y }
	}
}

/// Element bounding box as reported by the element-rect endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
	pub x: f64,
	pub y: f64,
	pub width: f64,
	pub height: f64,
}

impl Rect {
	/// Centre point, truncated the same way integer layout coordinates are.
	pub fn center(&self) -> Point {
		Point {
			x: self.x as i64 + (self.width as i64 / 2),
			y: self.y as i64 + (self.height as i64 / 2),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.width <= 0.0 || self.height <= 0.0
	}
}

/// One step of a pointer input source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PointerAction {
	#[serde(rename_all = "camelCase")]
	PointerMove { duration: u64, origin: String, x: i64, y: i64 },
	PointerDown { button: u8 },
	Pause { duration: u64 },
	PointerUp { button: u8 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointerParameters {
	pub pointer_type: String,
}

/// Input source with its ordered actions, as sent to the perform-actions endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionSequence {
	#[serde(rename = "type")]
	pub kind: String,
	pub id: String,
	pub parameters: PointerParameters,
	pub actions: Vec<PointerAction>,
}

impl ActionSequence {
	/// Touch tap at a viewport point: move, press, hold, release.
	pub fn tap(point: Point, hold: Duration) -> Self {
		Self {
			kind: "pointer".to_string(),
			id: "finger".to_string(),
			parameters: PointerParameters {
				pointer_type: "touch".to_string(),
			},
			actions: vec![
				PointerAction::PointerMove {
					duration: 0,
					origin: "viewport".to_string(),
					x: point.x,
					y: point.y,
				},
				PointerAction::PointerDown { button: 0 },
				PointerAction::Pause {
					duration: hold.as_millis() as u64,
				},
				PointerAction::PointerUp { button: 0 },
			],
		}
	}
}
