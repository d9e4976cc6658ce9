//! Error types for state store operations

use crate::command::CommandFlags;
use crate::ownership::{GroupId, Owner};
use antenna::config::ConfigError;
use antenna::state::{ControlMode, MotorId, ParseControlModeError};
use thiserror::Error;

/// Why an arming transition was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmBlock {
    /// An emergency push button is pressed.
    EmergencyStop,
    /// A fatal error is latched.
    FatalError,
    /// A main limit switch is touched.
    MainLimit,
}

/// Cross-field rule broken by a rejected commit.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Invariant {
    /// Disarmed but a motor output is not neutral.
    #[error("motor {motor} output must be neutral while disarmed")]
    DisarmedOutputNotNeutral {
        /// Offending motor
        motor: MotorId,
    },

    /// Arming refused.
    #[error("arming blocked: {reason:?}")]
    ArmBlocked {
        /// Blocking condition
        reason: ArmBlock,
    },

    /// Fatal error latched but the control mode is not a safe terminal mode.
    #[error("control mode {mode} not allowed while a fatal error is latched")]
    FatalRequiresSafeMode {
        /// Requested mode
        mode: ControlMode,
    },

    /// Calibration sample count does not match the buffer.
    #[error("calibration sample count {count} does not match {stored} stored samples")]
    CalibrationCountMismatch {
        /// Reported count
        count: u32,
        /// Buffer length
        stored: usize,
    },

    /// GPS reports a fix with impossible coordinates.
    #[error("GPS fix reported with out-of-range coordinates")]
    GpsFixOutOfRange,
}

/// Errors that can occur during state store operations
#[derive(Error, Debug)]
pub enum StateError {
    /// Write attempted outside the caller's ownership
    #[error("Permission denied: {owner} may not write {group}")]
    PermissionDenied {
        /// Calling subsystem
        owner: Owner,
        /// Target group
        group: GroupId,
    },

    /// Command issued or consumed by the wrong subsystem
    #[error("Permission denied: {owner} may not handle command {command:?}")]
    CommandPermissionDenied {
        /// Calling subsystem
        owner: Owner,
        /// Offending command bits
        command: CommandFlags,
    },

    /// Commit would break a cross-field invariant
    #[error("Invariant violation: {0}")]
    InvariantViolation(#[from] Invariant),

    /// Commit lock not acquired within the bounded wait
    #[error("Commit lock not acquired by {owner} within {timeout_us} µs")]
    WriteTimeout {
        /// Calling subsystem
        owner: Owner,
        /// Configured wait
        timeout_us: u64,
    },

    /// Too many updates staged in one transaction
    #[error("Transaction holds at most {capacity} updates")]
    TransactionFull {
        /// Fixed capacity
        capacity: usize,
    },

    /// Calibration input queue is full
    #[error("Calibration input queue full - engine not keeping up")]
    CalibrationQueueFull,

    /// Control mode string not recognized
    #[error("Unknown control mode: {value:?}")]
    UnknownControlMode {
        /// Rejected input
        value: String,
    },

    /// IO error
    #[error("IO error: {source}")]
    Io {
        /// Source IO error
        #[from]
        source: std::io::Error,
    },

    /// Persisted parameter file malformed
    #[error("Parameter file error: {reason}")]
    ParameterFormat {
        /// Parser message
        reason: String,
    },

    /// Configuration error
    #[error("Configuration error: {source}")]
    Config {
        /// Source configuration error
        #[from]
        source: ConfigError,
    },
}

impl StateError {
    /// Lock contention that may clear on the next cycle.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::WriteTimeout { .. })
    }
}

impl From<ParseControlModeError> for StateError {
    fn from(e: ParseControlModeError) -> Self {
        Self::UnknownControlMode { value: e.value }
    }
}

/// Result type for state store operations
pub type StateResult<T> = Result<T, StateError>;
