//! Antenna Tracker Common Library
//!
//! Shared enumerations, constants and configuration loading for every
//! crate in the antenna tracker workspace.
//!
//! # Module Structure
//!
//! - [`state`] - Closed enumerations exchanged between subsystems
//! - [`consts`] - System-wide numeric limits and default paths
//! - [`config`] - Configuration loading traits and types
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! Add to your `Cargo.toml` with alias for shorter imports:
//! ```toml
//! [dependencies]
//! antenna = { package = "antenna_common", path = "../antenna_common" }
//! ```
//!
//! Then import:
//! ```rust
//! use antenna_common::state::ControlMode;
//! use antenna_common::config::{ConfigLoader, StateStoreConfig};
//! ```

pub mod config;
pub mod consts;
pub mod prelude;
pub mod state;
