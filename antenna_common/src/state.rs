//! Closed enumerations shared by every tracker subsystem.
//!
//! All enums use `#[repr(u8)]` so their wire value is fixed. String-typed
//! values (control mode) parse into a closed set and reject anything else.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ─── Mechanical layout ──────────────────────────────────────────────

/// Pointing axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Axis {
    /// Azimuth axis.
    Azimuth = 0,
    /// Elevation axis.
    Elevation = 1,
}

impl Axis {
    /// Both axes in fixed order.
    pub const ALL: [Axis; 2] = [Axis::Azimuth, Axis::Elevation];

    /// Lower-case axis name used in log and alarm text.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Azimuth => "azimuth",
            Self::Elevation => "elevation",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One of the four drive motors (master/slave per axis).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum MotorId {
    /// Azimuth master drive.
    AzimuthMaster = 0,
    /// Azimuth slave drive.
    AzimuthSlave = 1,
    /// Elevation master drive.
    ElevationMaster = 2,
    /// Elevation slave drive.
    ElevationSlave = 3,
}

impl MotorId {
    /// All motors in fixed order.
    pub const ALL: [MotorId; 4] = [
        MotorId::AzimuthMaster,
        MotorId::AzimuthSlave,
        MotorId::ElevationMaster,
        MotorId::ElevationSlave,
    ];

    /// Axis driven by this motor.
    pub const fn axis(self) -> Axis {
        match self {
            Self::AzimuthMaster | Self::AzimuthSlave => Axis::Azimuth,
            Self::ElevationMaster | Self::ElevationSlave => Axis::Elevation,
        }
    }

    /// Stable display name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::AzimuthMaster => "az_master",
            Self::AzimuthSlave => "az_slave",
            Self::ElevationMaster => "el_master",
            Self::ElevationSlave => "el_slave",
        }
    }
}

impl fmt::Display for MotorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ─── Control mode ───────────────────────────────────────────────────

/// Error returned when a control mode string is not one of the known modes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized control mode {value:?}")]
pub struct ParseControlModeError {
    /// Rejected input.
    pub value: String,
}

/// Controller mode.
///
/// Wire strings: `NONE, DIR, VEL, POS, TLE, STAR, SUN, STP`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum ControlMode {
    /// No active controller.
    #[default]
    None = 0,
    /// Direct mode: operator value drives the motor primary output.
    Direct = 1,
    /// Velocity control.
    Velocity = 2,
    /// Position control.
    Position = 3,
    /// Two-line-element satellite tracking.
    Tle = 4,
    /// Star tracking.
    Star = 5,
    /// Sun tracking.
    Sun = 6,
    /// Controlled stop.
    Stop = 7,
}

impl ControlMode {
    /// Wire representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Direct => "DIR",
            Self::Velocity => "VEL",
            Self::Position => "POS",
            Self::Tle => "TLE",
            Self::Star => "STAR",
            Self::Sun => "SUN",
            Self::Stop => "STP",
        }
    }

    /// Modes allowed while a fatal error is latched.
    #[inline]
    pub const fn is_safe_terminal(self) -> bool {
        matches!(self, Self::None | Self::Stop)
    }

    /// Modes in which the controller follows a moving target.
    #[inline]
    pub const fn is_tracking(self) -> bool {
        matches!(self, Self::Tle | Self::Star | Self::Sun)
    }
}

impl FromStr for ControlMode {
    type Err = ParseControlModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NONE" => Ok(Self::None),
            "DIR" => Ok(Self::Direct),
            "VEL" => Ok(Self::Velocity),
            "POS" => Ok(Self::Position),
            "TLE" => Ok(Self::Tle),
            "STAR" => Ok(Self::Star),
            "SUN" => Ok(Self::Sun),
            "STP" => Ok(Self::Stop),
            other => Err(ParseControlModeError {
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ControlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Power ──────────────────────────────────────────────────────────

/// Requested power state. Wire values: 0 on, 1 reset, 2 shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum PowerStatus {
    /// Normal operation.
    #[default]
    On = 0,
    /// System will reset.
    Reset = 1,
    /// System will shut down.
    Shutdown = 2,
}

// ─── Calibration ────────────────────────────────────────────────────

/// Calibration type. Wire values: 0 offline, 1 online.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum CalibrationKind {
    /// Samples collected, offsets computed afterwards.
    #[default]
    Offline = 0,
    /// Offsets refined while tracking.
    Online = 1,
}

// ─── Error codes ────────────────────────────────────────────────────

/// Class of failure an [`ErrorCode`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Sentinel, no specific failure.
    General,
    /// A subsystem failed to initialize.
    Initialization,
    /// A running subsystem failed.
    Runtime,
    /// Malformed operator input.
    InputValidation,
    /// Calibration failed.
    Calibration,
}

/// Fatal error code. `General` doubles as the "no active error" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum ErrorCode {
    /// General error / sentinel.
    #[default]
    General = 0,
    /// HMI failed to initialize.
    HmiInit = 1,
    /// Malformed HMI input.
    HmiInput = 2,
    /// REST API failed to initialize.
    RestApiInit = 3,
    /// Malformed REST API input.
    RestApiInput = 4,
    /// EtherCAT process data update failed.
    EthercatUpdateProcess = 5,
    /// EtherCAT master failed to initialize.
    EthercatInit = 6,
    /// Ethernet interface failed to initialize.
    EthernetInit = 7,
    /// Drive reported an alarm.
    DriverAlarm = 8,
    /// Drive failed to initialize.
    DriverInit = 9,
    /// Encoder reported an alarm.
    EncoderAlarm = 10,
    /// Encoder failed to initialize.
    EncoderInit = 11,
    /// GPS receiver failed to initialize.
    GpsInit = 12,
    /// TLE source failed to initialize.
    TleInit = 13,
    /// Wind sensor failed to initialize.
    WindSensorInit = 14,
    /// Controller failed to initialize.
    ControllerInit = 15,
    /// A critical connection was lost.
    Connection = 16,
    /// Calibration failed.
    Calibration = 17,
}

impl ErrorCode {
    /// Failure class of this code.
    pub const fn category(self) -> ErrorCategory {
        match self {
            Self::General => ErrorCategory::General,
            Self::HmiInit
            | Self::RestApiInit
            | Self::EthercatInit
            | Self::EthernetInit
            | Self::DriverInit
            | Self::EncoderInit
            | Self::GpsInit
            | Self::TleInit
            | Self::WindSensorInit
            | Self::ControllerInit => ErrorCategory::Initialization,
            Self::EthercatUpdateProcess
            | Self::DriverAlarm
            | Self::EncoderAlarm
            | Self::Connection => ErrorCategory::Runtime,
            Self::HmiInput | Self::RestApiInput => ErrorCategory::InputValidation,
            Self::Calibration => ErrorCategory::Calibration,
        }
    }
}
