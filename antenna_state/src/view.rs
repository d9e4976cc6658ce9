//! Serialization-boundary projection of a snapshot.
//!
//! Bitmask fields are encoded in their fixed wire layouts, enums as their
//! wire strings or numeric values. The admin credential is never projected.

use crate::command::CommandFlags;
use crate::data::{AttitudeData, EncoderData, GpsData, MotorData};
use crate::snapshot::Snapshot;
use antenna::state::{Axis, MotorId};
use serde::Serialize;

/// Per-axis telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisView {
    /// Angle [deg].
    pub angle: f64,
    /// Rate [deg/s].
    pub rate: f64,
    /// Desired angle [deg].
    pub angle_desired: f64,
    /// Desired rate [deg/s].
    pub rate_desired: f64,
    /// Direct-mode value.
    pub direct: f64,
    /// Raw encoder count.
    pub encoder_step: u32,
    /// Raw encoder angle [deg].
    pub encoder_raw_deg: f64,
    /// Filtered encoder angle [deg].
    pub encoder_deg: f64,
    /// Positive limit bits (bit0 software, bit1 pre, bit2 main).
    pub limit_positive: u8,
    /// Negative limit bits.
    pub limit_negative: u8,
}

impl AxisView {
    fn project(attitude: &AttitudeData, encoder: &EncoderData, limits: (u8, u8)) -> Self {
        Self {
            angle: attitude.angle,
            rate: attitude.rate,
            angle_desired: attitude.angle_desired,
            rate_desired: attitude.rate_desired,
            direct: attitude.direct,
            encoder_step: encoder.raw_step,
            encoder_raw_deg: encoder.raw_deg,
            encoder_deg: encoder.position_deg,
            limit_positive: limits.0,
            limit_negative: limits.1,
        }
    }
}

/// Per-motor telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MotorView {
    /// Motor name.
    pub name: &'static str,
    /// Axis the motor drives.
    pub axis: &'static str,
    /// Current [A].
    pub current_amp: f32,
    /// Primary output.
    pub primary: f32,
    /// Secondary output.
    pub secondary: f32,
}

impl MotorView {
    fn project(id: MotorId, motor: &MotorData) -> Self {
        Self {
            name: id.name(),
            axis: id.axis().name(),
            current_amp: motor.current_amp,
            primary: motor.output.primary,
            secondary: motor.output.secondary,
        }
    }
}

/// GPS telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GpsView {
    /// `[year, month, day, hours, minutes, seconds]`.
    pub utc: [u32; 6],
    /// 3D fix available.
    pub fix: bool,
    /// Receiver connected.
    pub connected: bool,
    /// Latitude [deg].
    pub latitude: f64,
    /// Longitude [deg].
    pub longitude: f64,
    /// Altitude [m].
    pub altitude: f64,
    /// Clock synchronized.
    pub sync: bool,
}

impl From<&GpsData> for GpsView {
    fn from(gps: &GpsData) -> Self {
        Self {
            utc: gps.utc.to_fields(),
            fix: gps.fix,
            connected: gps.connected,
            latitude: gps.latitude,
            longitude: gps.longitude,
            altitude: gps.altitude,
            sync: gps.sync,
        }
    }
}

/// Status, request and fault telemetry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemView {
    /// Tracking.
    pub track_status: bool,
    /// Armed.
    pub arm_status: bool,
    /// Active mode wire string.
    pub control_mode: &'static str,
    /// Requested mode wire string.
    pub requested_mode: &'static str,
    /// Emergency stop bits (bit0 cabin, bit1 pedestal).
    pub emergency_stop: u8,
    /// Power request (0 on, 1 reset, 2 shutdown).
    pub power: u8,
    /// Admin level granted.
    pub admin: bool,
    /// System identification.
    pub system_id: String,
    /// Offsets `[azimuth, elevation]` [deg].
    pub offsets: [f64; 2],
    /// Presets `[azimuth, elevation]` [deg].
    pub presets: [f64; 2],
    /// Stop requested.
    pub stop_flag: bool,
    /// Alarm active.
    pub alarm: bool,
    /// Alarm text.
    pub alarm_message: String,
    /// Fatal error latched.
    pub fatal_error: bool,
    /// Fatal error text.
    pub error_message: String,
    /// Numeric error code.
    pub error_code: u8,
    /// Pending command bits.
    pub pending_commands: u32,
}

/// Calibration telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CalibrationView {
    /// Engine active.
    pub active: bool,
    /// 0 offline, 1 online.
    pub kind: u8,
    /// Freedom mode.
    pub freedom_mode: u8,
    /// Stored samples.
    pub sample_count: u32,
    /// Last sample `[az_mech, el_mech, az_astro, el_astro]`.
    pub last_sample: [f64; 4],
}

/// Telemetry projection of one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryView {
    /// Snapshot generation.
    pub generation: u64,
    /// Loop timestamp [µs].
    pub timestamp_us: u64,
    /// Loop duration [µs].
    pub loop_duration_us: u64,
    /// Azimuth axis.
    pub azimuth: AxisView,
    /// Elevation axis.
    pub elevation: AxisView,
    /// Motors in `MotorId::ALL` order.
    pub motors: [MotorView; 4],
    /// GPS.
    pub gps: GpsView,
    /// CPU temperature [°C].
    pub cpu_temperature: f32,
    /// External temperature [°C].
    pub external_temperature: f32,
    /// System block.
    pub system: SystemView,
    /// Calibration.
    pub calibration: CalibrationView,
}

impl TelemetryView {
    /// Project `snapshot` with the currently `pending` commands.
    pub fn project(snapshot: &Snapshot, pending: CommandFlags) -> Self {
        let axis = |a: Axis| {
            AxisView::project(
                &snapshot.attitude[a],
                &snapshot.encoders[a],
                snapshot.limits[a].to_bits(),
            )
        };
        let sys = &snapshot.system;
        let cal = &snapshot.calibration;

        Self {
            generation: snapshot.generation().0,
            timestamp_us: snapshot.time.timestamp_us,
            loop_duration_us: snapshot.time.loop_duration_us,
            azimuth: axis(Axis::Azimuth),
            elevation: axis(Axis::Elevation),
            motors: MotorId::ALL.map(|id| MotorView::project(id, &snapshot.motors[id])),
            gps: GpsView::from(&snapshot.gps),
            cpu_temperature: snapshot.temperature.cpu_c,
            external_temperature: snapshot.temperature.external_c,
            system: SystemView {
                track_status: sys.status.track_status,
                arm_status: sys.status.arm_status,
                control_mode: sys.status.control_mode.as_str(),
                requested_mode: sys.request.control_mode.as_str(),
                emergency_stop: sys.emergency_stop.bits(),
                power: sys.request.power as u8,
                admin: sys.request.admin_flag,
                system_id: sys.request.system_id.as_str().to_owned(),
                offsets: [sys.request.az_offset, sys.request.el_offset],
                presets: [sys.request.az_preset, sys.request.el_preset],
                stop_flag: sys.request.stop_flag,
                alarm: sys.faults.alarm_flag,
                alarm_message: sys.faults.alarm_message.as_str().to_owned(),
                fatal_error: sys.faults.fatal_error_flag,
                error_message: sys.faults.error_message.as_str().to_owned(),
                error_code: sys.faults.error_code as u8,
                pending_commands: pending.bits(),
            },
            calibration: CalibrationView {
                active: cal.status.active,
                kind: cal.status.kind as u8,
                freedom_mode: cal.status.freedom_mode,
                sample_count: cal.sample_count,
                last_sample: cal.last_sample.to_array(),
            },
        }
    }

    /// JSON encoding for REST consumers.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
