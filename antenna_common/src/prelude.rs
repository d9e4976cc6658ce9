//! Prelude module for common re-exports.
//!
//! ```rust
//! use antenna_common::prelude::*;
//! ```

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, SharedConfig, StateStoreConfig, StoreSettings};

// ─── Shared enums ───────────────────────────────────────────────────
pub use crate::state::{
    Axis, CalibrationKind, ControlMode, ErrorCategory, ErrorCode, MotorId, PowerStatus,
};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{DEFAULT_CONTROL_CYCLE_US, DEFAULT_FIELDBUS_CYCLE_US};
