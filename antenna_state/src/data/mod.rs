//! Value groups and the aggregate record.
//!
//! Every group is plain data. Invariants across groups are enforced by
//! the store at commit time, never by construction.

pub mod calibration;
pub mod motion;
pub mod sensors;
pub mod system;

pub use calibration::{
    CalibrationData, CalibrationInput, CalibrationRequest, CalibrationSample, CalibrationStatus,
};
pub use motion::{
    AttitudeData, AttitudeFeedback, AttitudeSetpoint, AxisPair, EncoderData, LimitFlags,
    LimitSwitchData, MotorBank, MotorData, MotorOutput,
};
pub use sensors::{GpsData, TemperatureData, TimeData, TleData, UtcTime};
pub use system::{
    Credential, EmergencyStop, FaultState, OperatorRequest, SystemData, SystemStatus,
};

use antenna::consts::{MESSAGE_CAPACITY, SYSTEM_ID_CAPACITY};

/// Fixed-capacity alarm/error message.
pub type MessageText = heapless::String<MESSAGE_CAPACITY>;

/// Fixed-capacity system identification string.
pub type SystemIdText = heapless::String<SYSTEM_ID_CAPACITY>;

/// Copy `text` into a fixed-capacity string, truncating on a char boundary.
pub fn bounded_text<const N: usize>(text: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for ch in text.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}

/// The entire live state of the tracker at one instant.
///
/// Default-constructed at process start: numbers zero, flags false,
/// control mode `NONE`, power `On`, error code `General`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VarData {
    /// Loop timing.
    pub time: TimeData,
    /// Drive motors.
    pub motors: MotorBank,
    /// Axis encoders.
    pub encoders: AxisPair<EncoderData>,
    /// GPS receiver.
    pub gps: GpsData,
    /// Travel limits.
    pub limits: AxisPair<LimitSwitchData>,
    /// Axis attitude.
    pub attitude: AxisPair<AttitudeData>,
    /// Temperatures.
    pub temperature: TemperatureData,
    /// Reserved tracking-target ephemeris.
    pub tle: TleData,
    /// Command/status block.
    pub system: SystemData,
    /// Calibration engine state.
    pub calibration: CalibrationData,
}

impl VarData {
    /// Any travel limit at `level` on either axis.
    pub fn any_limit(&self, level: LimitFlags) -> bool {
        self.limits.iter().any(|(_, lim)| lim.any(level))
    }

    /// An emergency stop or pre/main limit is currently active.
    pub fn alarm_condition_present(&self) -> bool {
        !self.system.emergency_stop.is_empty() || self.any_limit(LimitFlags::PRE | LimitFlags::MAIN)
    }
}
