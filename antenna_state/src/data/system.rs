//! System command/status value group.
//!
//! Split by writer: [`SystemStatus`] belongs to the control loop,
//! [`OperatorRequest`] to the HMI and REST API, [`EmergencyStop`] to the
//! fieldbus driver, and [`FaultState`] is only touched through the fault
//! operations of the store.

use super::{MessageText, SystemIdText, bounded_text};
use antenna::consts::CREDENTIAL_CAPACITY;
use antenna::state::{ControlMode, ErrorCode, PowerStatus};
use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// Emergency push buttons currently pressed.
    ///
    /// Wire layout: bit0 cabin (main), bit1 pedestal.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EmergencyStop: u8 {
        /// Cabin / main push button.
        const CABIN    = 0b01;
        /// Pedestal push button.
        const PEDESTAL = 0b10;
    }
}

impl Default for EmergencyStop {
    fn default() -> Self {
        Self::empty()
    }
}

/// Opaque admin credential. Never printed, compared in constant time.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Credential(heapless::String<CREDENTIAL_CAPACITY>);

impl Credential {
    /// Wrap `secret`. Returns `None` when it exceeds the credential capacity.
    pub fn new(secret: &str) -> Option<Self> {
        let mut inner = heapless::String::new();
        inner.push_str(secret).ok()?;
        Some(Self(inner))
    }

    /// No credential set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Compare against `candidate` without early exit on the first mismatch.
    pub fn matches(&self, candidate: &str) -> bool {
        let a = self.0.as_bytes();
        let b = candidate.as_bytes();
        if a.len() != b.len() {
            return false;
        }
        a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Control-loop status fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SystemStatus {
    /// Controller is tracking (TLE/STAR/SUN/object).
    pub track_status: bool,
    /// Motion enabled. `false` forces all actuators to neutral.
    pub arm_status: bool,
    /// Active controller mode.
    pub control_mode: ControlMode,
}

/// Request-only fields written by the HMI and REST API.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OperatorRequest {
    /// Admin level granted.
    pub admin_flag: bool,
    /// Admin credential.
    pub admin_credential: Credential,
    /// System identification string.
    pub system_id: SystemIdText,
    /// Tracking azimuth offset [deg].
    pub az_offset: f64,
    /// Tracking elevation offset [deg].
    pub el_offset: f64,
    /// Request azimuth angle calibration.
    pub az_cal_flag: bool,
    /// Request elevation angle calibration.
    pub el_cal_flag: bool,
    /// Azimuth preset value [deg].
    pub az_preset: f64,
    /// Elevation preset value [deg].
    pub el_preset: f64,
    /// Stop all movement without disarming.
    pub stop_flag: bool,
    /// Requested controller mode.
    pub control_mode: ControlMode,
    /// Requested power state.
    pub power: PowerStatus,
}

impl OperatorRequest {
    /// Set the system ID, truncated to capacity.
    pub fn set_system_id(&mut self, id: &str) {
        self.system_id = bounded_text(id);
    }
}

/// Alarm and fatal error fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FaultState {
    /// Lower-severity condition restricting motion.
    pub alarm_flag: bool,
    /// Alarm description.
    pub alarm_message: MessageText,
    /// Normal operation failed; latched until cleared.
    pub fatal_error_flag: bool,
    /// Fatal error description.
    pub error_message: MessageText,
    /// Fatal error code. `ErrorCode::General` when none is active.
    pub error_code: ErrorCode,
}

impl FaultState {
    /// Set the alarm flag and message.
    pub fn set_alarm(&mut self, message: &str) {
        self.alarm_flag = true;
        self.alarm_message = bounded_text(message);
    }

    /// Clear the alarm flag and message.
    pub fn clear_alarm(&mut self) {
        self.alarm_flag = false;
        self.alarm_message.clear();
    }

    /// Latch a fatal error.
    pub fn set_fatal(&mut self, code: ErrorCode, message: &str) {
        self.fatal_error_flag = true;
        self.error_code = code;
        self.error_message = bounded_text(message);
    }

    /// Release a latched fatal error and restore the sentinel code.
    pub fn clear_fatal(&mut self) {
        self.fatal_error_flag = false;
        self.error_code = ErrorCode::General;
        self.error_message.clear();
    }
}

/// System value group.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SystemData {
    /// Control-loop status.
    pub status: SystemStatus,
    /// Operator requests.
    pub request: OperatorRequest,
    /// Emergency push buttons.
    pub emergency_stop: EmergencyStop,
    /// Alarm / fatal error state.
    pub faults: FaultState,
}
