//! Axis-related value groups: motors, encoders, limit switches, attitude.

use antenna::state::{Axis, MotorId};
use bitflags::bitflags;
use std::ops::{Index, IndexMut};

/// One value per pointing axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AxisPair<T> {
    /// Azimuth value.
    pub azimuth: T,
    /// Elevation value.
    pub elevation: T,
}

impl<T> AxisPair<T> {
    /// Iterate `(axis, value)` in fixed order.
    pub fn iter(&self) -> impl Iterator<Item = (Axis, &T)> {
        [(Axis::Azimuth, &self.azimuth), (Axis::Elevation, &self.elevation)].into_iter()
    }
}

impl<T> Index<Axis> for AxisPair<T> {
    type Output = T;

    fn index(&self, axis: Axis) -> &T {
        match axis {
            Axis::Azimuth => &self.azimuth,
            Axis::Elevation => &self.elevation,
        }
    }
}

impl<T> IndexMut<Axis> for AxisPair<T> {
    fn index_mut(&mut self, axis: Axis) -> &mut T {
        match axis {
            Axis::Azimuth => &mut self.azimuth,
            Axis::Elevation => &mut self.elevation,
        }
    }
}

// ─── Motors ─────────────────────────────────────────────────────────

/// Controller-cycle outputs of one motor.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotorOutput {
    /// Primary output value.
    pub primary: f32,
    /// Secondary output value.
    pub secondary: f32,
}

impl MotorOutput {
    /// Neutral (zero) output.
    pub const NEUTRAL: Self = Self {
        primary: 0.0,
        secondary: 0.0,
    };

    /// True when both outputs are zero.
    #[inline]
    pub fn is_neutral(&self) -> bool {
        self.primary == 0.0 && self.secondary == 0.0
    }
}

/// Motor value group.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotorData {
    /// Motor current [A], from the drive when a current sensor exists.
    pub current_amp: f32,
    /// Outputs written by the control loop.
    pub output: MotorOutput,
}

/// The four drive motors.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotorBank {
    /// Azimuth master.
    pub az_master: MotorData,
    /// Azimuth slave.
    pub az_slave: MotorData,
    /// Elevation master.
    pub el_master: MotorData,
    /// Elevation slave.
    pub el_slave: MotorData,
}

impl MotorBank {
    /// Iterate `(motor, data)` in fixed order.
    pub fn iter(&self) -> impl Iterator<Item = (MotorId, &MotorData)> {
        MotorId::ALL.into_iter().map(move |id| (id, &self[id]))
    }

    /// First motor whose output is not neutral.
    pub fn first_active(&self) -> Option<MotorId> {
        self.iter()
            .find(|(_, m)| !m.output.is_neutral())
            .map(|(id, _)| id)
    }

    /// Drive every output to neutral. Currents are untouched.
    pub fn neutralize(&mut self) {
        for id in MotorId::ALL {
            self[id].output = MotorOutput::NEUTRAL;
        }
    }
}

impl Index<MotorId> for MotorBank {
    type Output = MotorData;

    fn index(&self, id: MotorId) -> &MotorData {
        match id {
            MotorId::AzimuthMaster => &self.az_master,
            MotorId::AzimuthSlave => &self.az_slave,
            MotorId::ElevationMaster => &self.el_master,
            MotorId::ElevationSlave => &self.el_slave,
        }
    }
}

impl IndexMut<MotorId> for MotorBank {
    fn index_mut(&mut self, id: MotorId) -> &mut MotorData {
        match id {
            MotorId::AzimuthMaster => &mut self.az_master,
            MotorId::AzimuthSlave => &mut self.az_slave,
            MotorId::ElevationMaster => &mut self.el_master,
            MotorId::ElevationSlave => &mut self.el_slave,
        }
    }
}

// ─── Encoders ───────────────────────────────────────────────────────

/// Encoder value group.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EncoderData {
    /// Raw discrete count [step].
    pub raw_step: u32,
    /// Raw angle [deg].
    pub raw_deg: f64,
    /// Shaft rate [deg/s].
    pub rate: f64,
    /// Filtered output angle [deg].
    pub position_deg: f64,
}

impl EncoderData {
    /// Build the next sample, deriving `rate` from the previous filtered
    /// angle over `period_s`.
    pub fn next_sample(
        previous: &EncoderData,
        raw_step: u32,
        raw_deg: f64,
        position_deg: f64,
        period_s: f64,
    ) -> Self {
        let rate = if period_s > 0.0 {
            (position_deg - previous.position_deg) / period_s
        } else {
            previous.rate
        };
        Self {
            raw_step,
            raw_deg,
            rate,
            position_deg,
        }
    }
}

// ─── Limit switches ─────────────────────────────────────────────────

bitflags! {
    /// Travel-limit levels of one direction.
    ///
    /// Wire layout: bit0 software, bit1 pre, bit2 main.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LimitFlags: u8 {
        /// Software threshold crossed.
        const SOFTWARE = 0b001;
        /// Pre-limit physical switch touched.
        const PRE      = 0b010;
        /// Main hard-stop switch touched.
        const MAIN     = 0b100;
    }
}

impl Default for LimitFlags {
    fn default() -> Self {
        Self::empty()
    }
}

/// Limit switch value group of one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LimitSwitchData {
    /// Positive travel direction.
    pub positive: LimitFlags,
    /// Negative travel direction.
    pub negative: LimitFlags,
}

impl LimitSwitchData {
    /// Decode the wire bytes. Bits above bit2 are dropped.
    #[inline]
    pub const fn from_bits(positive: u8, negative: u8) -> Self {
        Self {
            positive: LimitFlags::from_bits_truncate(positive),
            negative: LimitFlags::from_bits_truncate(negative),
        }
    }

    /// Encode as `(positive, negative)` wire bytes.
    #[inline]
    pub const fn to_bits(self) -> (u8, u8) {
        (self.positive.bits(), self.negative.bits())
    }

    /// Either direction has `level` set.
    #[inline]
    pub fn any(&self, level: LimitFlags) -> bool {
        self.positive.intersects(level) || self.negative.intersects(level)
    }
}

// ─── Attitude ───────────────────────────────────────────────────────

/// Attitude value group of one axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AttitudeData {
    /// Angle [deg].
    pub angle: f64,
    /// Rate [deg/s].
    pub rate: f64,
    /// Desired angle [deg].
    pub angle_desired: f64,
    /// Desired rate [deg/s].
    pub rate_desired: f64,
    /// Direct-mode value, only meaningful in `ControlMode::Direct`.
    pub direct: f64,
}

/// Control-loop half of [`AttitudeData`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AttitudeFeedback {
    /// Angle [deg].
    pub angle: f64,
    /// Rate [deg/s].
    pub rate: f64,
}

/// Operator half of [`AttitudeData`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AttitudeSetpoint {
    /// Desired angle [deg].
    pub angle: f64,
    /// Desired rate [deg/s].
    pub rate: f64,
    /// Direct-mode value.
    pub direct: f64,
}

impl AttitudeData {
    /// Overwrite the feedback fields.
    #[inline]
    pub fn apply_feedback(&mut self, feedback: AttitudeFeedback) {
        self.angle = feedback.angle;
        self.rate = feedback.rate;
    }

    /// Overwrite the setpoint fields.
    #[inline]
    pub fn apply_setpoint(&mut self, setpoint: AttitudeSetpoint) {
        self.angle_desired = setpoint.angle;
        self.rate_desired = setpoint.rate;
        self.direct = setpoint.direct;
    }
}
