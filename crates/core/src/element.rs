//! Named elements and single-shot element queries.

use std::fmt;

use mobdrive_protocol::{Command, ElementRef, Locator, Rect};
use mobdrive_runtime::DriverHandle;

use crate::error::Result;

/// A locator with the human name used in logs and failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiElement {
	pub name: String,
	pub locator: Locator,
}

impl UiElement {
	pub fn new(name: impl Into<String>, locator: Locator) -> Self {
		Self { name: name.into(), locator }
	}

	/// Element addressed by accessibility id, named after it.
	pub fn accessibility_id(id: impl Into<String>) -> Self {
		let id = id.into();
		Self::new(id.clone(), Locator::accessibility_id(id))
	}
}

impl fmt::Display for UiElement {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.name)
	}
}

/// Finds the first element matching `locator`.
pub async fn find(driver: &DriverHandle, locator: &Locator) -> Result<ElementRef> {
	Ok(driver.execute_as(&Command::FindElement(locator.clone())).await?)
}

pub async fn is_displayed(driver: &DriverHandle, element: &ElementRef) -> Result<bool> {
	Ok(driver.execute_as(&Command::ElementDisplayed(element.clone())).await?)
}

pub async fn is_enabled(driver: &DriverHandle, element: &ElementRef) -> Result<bool> {
	Ok(driver.execute_as(&Command::ElementEnabled(element.clone())).await?)
}

pub async fn rect(driver: &DriverHandle, element: &ElementRef) -> Result<Rect> {
	Ok(driver.execute_as(&Command::ElementRect(element.clone())).await?)
}
