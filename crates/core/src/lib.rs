//! mobdrive - mobile UI test toolkit over Appium
//!
//! Builds on [`mobdrive_runtime`] sessions to give tests:
//!
//! - **Waits**: [`Wait`] polls a predicate with a fixed interval until it
//!   holds or times out
//! - **Actions**: [`Actions`] clicks, types and taps named [`UiElement`]s
//!   after waiting for them
//! - **Pages**: [`PageObject`] / [`PageDescriptor`] identify screens by an
//!   anchor element
//! - **Hooks**: [`HookManager`] wraps test bodies with screen recording and
//!   failure screenshots
//!
//! # Example
//!
//! ```ignore
//! use mobdrive::{HookManager, Marker, PageContext, TestCase};
//! use mobdrive_runtime::{SessionRegistry, WorkerId};
//!
//! let registry = SessionRegistry::from_global()?;
//! let worker = WorkerId::new("worker-1");
//! let driver = registry.initialize(&worker).await?;
//!
//! let hooks = HookManager::with_default_hooks(layout, sink);
//! let test = TestCase::new("loginTest").with_marker(Marker::RecordScreen);
//! let report = hooks
//!     .run(&driver, &test, |driver| async move {
//!         let ctx = PageContext::new(driver);
//!         login_page.wait_for_load(&ctx).await
//!     })
//!     .await;
//!
//! registry.quit(&worker).await?;
//! ```

pub mod actions;
pub mod artifacts;
pub mod element;
pub mod error;
pub mod hooks;
pub mod page;
pub mod wait;

pub use actions::Actions;
pub use artifacts::{ArtifactLayout, ArtifactSink, FsSink, MemorySink};
pub use element::UiElement;
pub use error::{Error, Result};
pub use hooks::{
	FailureScreenshotHook, HookManager, Marker, ScreenRecordingHook, TestCase, TestHook, TestInvocation, TestState,
};
pub use page::{PageContext, PageDescriptor, PageObject};
pub use wait::{Wait, WaitOptions, wait_for_clickable, wait_for_visible, wait_until};

// Re-export the layers below so most callers need one dependency.
pub use mobdrive_protocol::{Locator, Point, Strategy};
pub use mobdrive_runtime::{DriverHandle, SessionRegistry, TestConfig, WorkerId};
