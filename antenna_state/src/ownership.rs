//! Writer ownership partition.
//!
//! Every writable field group has exactly one owning subsystem (the HMI and
//! REST API share the operator request groups). The store checks
//! [`GroupId::permits`] before any update is applied.

use crate::data::{
    AttitudeFeedback, AttitudeSetpoint, CalibrationRequest, CalibrationStatus, EmergencyStop,
    EncoderData, GpsData, LimitSwitchData, MotorOutput, OperatorRequest, SystemStatus,
    TemperatureData, TimeData, VarData,
};
use antenna::state::{Axis, MotorId};
use std::fmt;

/// Subsystem identity presented on every store access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Owner {
    /// Real-time control loop.
    ControlLoop = 0,
    /// Fieldbus (EtherCAT) I/O cycle.
    Fieldbus = 1,
    /// GPS poller.
    Gps = 2,
    /// Calibration engine.
    Calibration = 3,
    /// Human-machine interface.
    Hmi = 4,
    /// REST API handlers.
    RestApi = 5,
    /// Parameter persistence collaborator.
    Persistence = 6,
}

impl Owner {
    /// Number of owners.
    pub const COUNT: usize = 7;

    /// All owners in index order.
    pub const ALL: [Owner; Self::COUNT] = [
        Owner::ControlLoop,
        Owner::Fieldbus,
        Owner::Gps,
        Owner::Calibration,
        Owner::Hmi,
        Owner::RestApi,
        Owner::Persistence,
    ];

    /// Array index of this owner.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// HMI or REST API.
    #[inline]
    pub const fn is_operator(self) -> bool {
        matches!(self, Self::Hmi | Self::RestApi)
    }

    /// Subsystems that report alarms. Operators only request clears.
    #[inline]
    pub const fn may_raise_alarm(self) -> bool {
        !self.is_operator()
    }

    /// Subsystems whose failure latches a fatal error.
    #[inline]
    pub const fn may_raise_fatal(self) -> bool {
        matches!(
            self,
            Self::ControlLoop | Self::Fieldbus | Self::Gps | Self::Calibration
        )
    }

    /// Stable display name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::ControlLoop => "control_loop",
            Self::Fieldbus => "fieldbus",
            Self::Gps => "gps",
            Self::Calibration => "calibration",
            Self::Hmi => "hmi",
            Self::RestApi => "rest_api",
            Self::Persistence => "persistence",
        }
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Writable field group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupId {
    /// Loop timing.
    Time,
    /// Measured attitude angle/rate.
    AttitudeFeedback,
    /// Desired attitude and direct-mode value.
    AttitudeSetpoint,
    /// Motor primary/secondary outputs.
    MotorOutput,
    /// Motor current.
    MotorCurrent,
    /// Encoder readings.
    Encoder,
    /// Limit switch readings.
    LimitSwitch,
    /// Temperatures.
    Temperature,
    /// Emergency push buttons.
    EmergencyStop,
    /// GPS receiver.
    Gps,
    /// Calibration engine status.
    Calibration,
    /// Operator calibration request.
    CalibrationRequest,
    /// Track/arm status and active control mode.
    SystemStatus,
    /// Operator request fields.
    OperatorRequest,
    /// Alarm / fatal error fields.
    Faults,
}

impl GroupId {
    /// `owner` may write this group.
    pub const fn permits(self, owner: Owner) -> bool {
        match self {
            Self::Time | Self::AttitudeFeedback | Self::MotorOutput | Self::SystemStatus => {
                matches!(owner, Owner::ControlLoop)
            }
            Self::MotorCurrent
            | Self::Encoder
            | Self::LimitSwitch
            | Self::Temperature
            | Self::EmergencyStop => matches!(owner, Owner::Fieldbus),
            Self::Gps => matches!(owner, Owner::Gps),
            Self::Calibration => matches!(owner, Owner::Calibration),
            Self::AttitudeSetpoint | Self::CalibrationRequest | Self::OperatorRequest => {
                owner.is_operator()
            }
            // Only through the fault operations.
            Self::Faults => false,
        }
    }

    /// Stable display name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Time => "time",
            Self::AttitudeFeedback => "attitude_feedback",
            Self::AttitudeSetpoint => "attitude_setpoint",
            Self::MotorOutput => "motor_output",
            Self::MotorCurrent => "motor_current",
            Self::Encoder => "encoder",
            Self::LimitSwitch => "limit_switch",
            Self::Temperature => "temperature",
            Self::EmergencyStop => "emergency_stop",
            Self::Gps => "gps",
            Self::Calibration => "calibration",
            Self::CalibrationRequest => "calibration_request",
            Self::SystemStatus => "system_status",
            Self::OperatorRequest => "operator_request",
            Self::Faults => "faults",
        }
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Replacement value for one field group.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupUpdate {
    /// Replace loop timing.
    Time(TimeData),
    /// Replace measured attitude of one axis.
    AttitudeFeedback(Axis, AttitudeFeedback),
    /// Replace desired attitude of one axis.
    AttitudeSetpoint(Axis, AttitudeSetpoint),
    /// Replace outputs of one motor.
    MotorOutput(MotorId, MotorOutput),
    /// Replace current of one motor [A].
    MotorCurrent(MotorId, f32),
    /// Replace one encoder reading.
    Encoder(Axis, EncoderData),
    /// Replace limit switches of one axis.
    LimitSwitch(Axis, LimitSwitchData),
    /// Replace temperatures.
    Temperature(TemperatureData),
    /// Replace emergency push button state.
    EmergencyStop(EmergencyStop),
    /// Replace GPS data.
    Gps(GpsData),
    /// Replace calibration engine status.
    Calibration(CalibrationStatus),
    /// Replace operator calibration request.
    CalibrationRequest(CalibrationRequest),
    /// Replace control-loop status.
    SystemStatus(SystemStatus),
    /// Replace operator request fields.
    OperatorRequest(OperatorRequest),
}

impl GroupUpdate {
    /// Group this update replaces.
    pub const fn group(&self) -> GroupId {
        match self {
            Self::Time(_) => GroupId::Time,
            Self::AttitudeFeedback(..) => GroupId::AttitudeFeedback,
            Self::AttitudeSetpoint(..) => GroupId::AttitudeSetpoint,
            Self::MotorOutput(..) => GroupId::MotorOutput,
            Self::MotorCurrent(..) => GroupId::MotorCurrent,
            Self::Encoder(..) => GroupId::Encoder,
            Self::LimitSwitch(..) => GroupId::LimitSwitch,
            Self::Temperature(_) => GroupId::Temperature,
            Self::EmergencyStop(_) => GroupId::EmergencyStop,
            Self::Gps(_) => GroupId::Gps,
            Self::Calibration(_) => GroupId::Calibration,
            Self::CalibrationRequest(_) => GroupId::CalibrationRequest,
            Self::SystemStatus(_) => GroupId::SystemStatus,
            Self::OperatorRequest(_) => GroupId::OperatorRequest,
        }
    }

    /// Write the replacement into `data`.
    pub fn apply(self, data: &mut VarData) {
        match self {
            Self::Time(v) => data.time = v,
            Self::AttitudeFeedback(axis, v) => data.attitude[axis].apply_feedback(v),
            Self::AttitudeSetpoint(axis, v) => data.attitude[axis].apply_setpoint(v),
            Self::MotorOutput(id, v) => data.motors[id].output = v,
            Self::MotorCurrent(id, amp) => data.motors[id].current_amp = amp,
            Self::Encoder(axis, v) => data.encoders[axis] = v,
            Self::LimitSwitch(axis, v) => data.limits[axis] = v,
            Self::Temperature(v) => data.temperature = v,
            Self::EmergencyStop(v) => data.system.emergency_stop = v,
            Self::Gps(v) => data.gps = v,
            Self::Calibration(v) => data.calibration.status = v,
            Self::CalibrationRequest(v) => data.calibration.request = v,
            Self::SystemStatus(v) => data.system.status = v,
            Self::OperatorRequest(v) => data.system.request = v,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_writable_group_has_exactly_one_owner_class() {
        let groups = [
            GroupId::Time,
            GroupId::AttitudeFeedback,
            GroupId::AttitudeSetpoint,
            GroupId::MotorOutput,
            GroupId::MotorCurrent,
            GroupId::Encoder,
            GroupId::LimitSwitch,
            GroupId::Temperature,
            GroupId::EmergencyStop,
            GroupId::Gps,
            GroupId::Calibration,
            GroupId::CalibrationRequest,
            GroupId::SystemStatus,
            GroupId::OperatorRequest,
        ];
        for group in groups {
            let writers: Vec<Owner> = Owner::ALL
                .into_iter()
                .filter(|o| group.permits(*o))
                .collect();
            assert!(!writers.is_empty(), "{group} has no writer");
            let non_operator = writers.iter().filter(|o| !o.is_operator()).count();
            assert!(
                non_operator == writers.len() && writers.len() == 1
                    || non_operator == 0 && writers.len() == 2,
                "{group} has writers {writers:?}"
            );
        }
    }

    #[test]
    fn faults_are_not_writable_as_a_group() {
        for owner in Owner::ALL {
            assert!(!GroupId::Faults.permits(owner));
        }
    }

    #[test]
    fn operators_cannot_write_sensor_groups() {
        assert!(!GroupId::Encoder.permits(Owner::Hmi));
        assert!(!GroupId::Encoder.permits(Owner::RestApi));
        assert!(GroupId::Encoder.permits(Owner::Fieldbus));
        assert!(!GroupId::MotorCurrent.permits(Owner::ControlLoop));
        assert!(GroupId::MotorOutput.permits(Owner::ControlLoop));
    }

    #[test]
    fn operators_cannot_report_faults() {
        for owner in [Owner::Hmi, Owner::RestApi] {
            assert!(!owner.may_raise_alarm());
            assert!(!owner.may_raise_fatal());
        }
        assert!(Owner::Persistence.may_raise_alarm());
        assert!(!Owner::Persistence.may_raise_fatal());
        assert!(Owner::Fieldbus.may_raise_fatal());
    }

    #[test]
    fn owner_indices_are_dense() {
        for (i, owner) in Owner::ALL.into_iter().enumerate() {
            assert_eq!(owner.index(), i);
        }
    }
}
