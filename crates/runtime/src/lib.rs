//! mobdrive runtime - configuration, capabilities and session lifecycle
//!
//! This crate owns everything needed to get from a configuration file to a
//! live automation session and back:
//!
//! - **Configuration**: flat dotted-key settings, loaded once per process
//! - **Platform table**: one [`PlatformProfile`] row per supported platform
//! - **Capability Builder**: [`CapabilitySet`] from platform + configuration
//! - **Driver Factory**: W3C new-session handshake over a [`Transport`]
//! - **Session Registry**: one [`DriverHandle`] per [`WorkerId`]
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │ SessionRegistry  │  WorkerId -> DriverHandle (DashMap)
//! └────────┬─────────┘
//!          │ initialize / quit
//! ┌────────▼─────────┐
//! │  DriverFactory   │  new session, handshake, implicit wait
//! └────────┬─────────┘
//!          │ Connector::connect
//! ┌────────▼─────────┐
//! │    Transport     │  HTTP (reqwest) or in-process fake
//! └──────────────────┘
//! ```

pub mod capabilities;
pub mod config;
pub mod driver;
pub mod error;
pub mod factory;
pub mod platform;
pub mod registry;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod transport;

pub use capabilities::CapabilitySet;
pub use config::{Credentials, TestConfig, keys};
pub use driver::{DriverHandle, DriverState};
pub use error::{Error, Result};
pub use factory::DriverFactory;
pub use platform::{Platform, PlatformProfile};
pub use registry::{SessionRegistry, WorkerId};
pub use transport::{Connector, HttpConnector, HttpTransport, Transport};

// Re-exported so downstream crates speak one protocol vocabulary.
pub use mobdrive_protocol as protocol;
