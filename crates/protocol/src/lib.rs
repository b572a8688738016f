//! Wire types for talking to a W3C WebDriver / Appium automation server.
//!
//! This crate only describes requests and responses. It performs no I/O; the
//! runtime crate owns transports and session state.

pub mod command;
pub mod envelope;
pub mod locator;
pub mod types;

pub use command::{Command, Method, WireRequest};
pub use envelope::{NewSessionValue, WireError, into_value};
pub use locator::{Locator, Strategy};
pub use types::{ActionSequence, CapabilityValue, ELEMENT_KEY, ElementRef, Point, PointerAction, Rect};
