//! Cross-field invariant checks and safety overrides.
//!
//! Evaluated on every commit, in this order:
//! 1. [`check_transition`] rejects writer intent that is illegal given the
//!    committed state (arming while blocked, leaving a safe mode while a
//!    fatal error is latched).
//! 2. [`apply_overrides`] forces the safe reaction to sensor input
//!    (emergency stop or main limit disarms and neutralizes outputs,
//!    rising edges raise an alarm).
//! 3. [`check_state`] rejects any record still breaking an invariant.

use crate::data::{EmergencyStop, LimitFlags, VarData};
use crate::error::{ArmBlock, Invariant};
use antenna::state::Axis;

/// What [`apply_overrides`] changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Overrides {
    /// Arm status forced false and motor outputs neutralized.
    pub disarmed: bool,
    /// Alarm flag and message set.
    pub alarm_raised: bool,
}

impl Overrides {
    /// Control-loop fields were changed.
    #[inline]
    pub const fn touched_control_loop(&self) -> bool {
        self.disarmed
    }
}

/// First condition that forbids the tracker from being armed.
pub fn arm_block(data: &VarData) -> Option<ArmBlock> {
    if !data.system.emergency_stop.is_empty() {
        Some(ArmBlock::EmergencyStop)
    } else if data.system.faults.fatal_error_flag {
        Some(ArmBlock::FatalError)
    } else if data.any_limit(LimitFlags::MAIN) {
        Some(ArmBlock::MainLimit)
    } else {
        None
    }
}

/// Reject illegal transitions from `prev` to `next`.
pub fn check_transition(prev: &VarData, next: &VarData) -> Result<(), Invariant> {
    let arming = !prev.system.status.arm_status && next.system.status.arm_status;
    if arming {
        if let Some(reason) = arm_block(next) {
            return Err(Invariant::ArmBlocked { reason });
        }
    }

    let mode = next.system.status.control_mode;
    if next.system.faults.fatal_error_flag && !mode.is_safe_terminal() {
        return Err(Invariant::FatalRequiresSafeMode { mode });
    }

    Ok(())
}

/// Force the safe reaction to emergency stop and limit switch input.
pub fn apply_overrides(prev: &VarData, next: &mut VarData) -> Overrides {
    let mut overrides = Overrides::default();

    let estop = next.system.emergency_stop;
    let main_limit = next.any_limit(LimitFlags::MAIN);
    if (!estop.is_empty() || main_limit) && next.system.status.arm_status {
        next.system.status.arm_status = false;
        next.motors.neutralize();
        overrides.disarmed = true;
    }

    if let Some(message) = rising_edge_alarm(prev, next) {
        next.system.faults.set_alarm(&message);
        overrides.alarm_raised = true;
    }

    overrides
}

/// Reject a record breaking a state invariant.
pub fn check_state(next: &VarData) -> Result<(), Invariant> {
    let status = &next.system.status;
    if !status.arm_status {
        if let Some(motor) = next.motors.first_active() {
            return Err(Invariant::DisarmedOutputNotNeutral { motor });
        }
    }
    if status.arm_status && next.system.faults.fatal_error_flag {
        return Err(Invariant::ArmBlocked {
            reason: ArmBlock::FatalError,
        });
    }

    let cal = &next.calibration;
    if !cal.count_consistent() {
        return Err(Invariant::CalibrationCountMismatch {
            count: cal.sample_count,
            stored: cal.samples.len(),
        });
    }

    if next.gps.fix && !next.gps.coordinates_valid() {
        return Err(Invariant::GpsFixOutOfRange);
    }

    Ok(())
}

/// Alarm text for the highest-severity condition that just appeared.
fn rising_edge_alarm(prev: &VarData, next: &VarData) -> Option<String> {
    let pressed = next.system.emergency_stop & !prev.system.emergency_stop;
    if !pressed.is_empty() {
        let which = if pressed.contains(EmergencyStop::CABIN | EmergencyStop::PEDESTAL) {
            "cabin and pedestal"
        } else if pressed.contains(EmergencyStop::CABIN) {
            "cabin"
        } else {
            "pedestal"
        };
        return Some(format!("emergency stop pressed: {which}"));
    }

    for level in [LimitFlags::MAIN, LimitFlags::PRE] {
        for axis in Axis::ALL {
            let (before, after) = (prev.limits[axis], next.limits[axis]);
            for (direction, was, now) in [
                ("positive", before.positive, after.positive),
                ("negative", before.negative, after.negative),
            ] {
                if now.contains(level) && !was.contains(level) {
                    let name = if level == LimitFlags::MAIN { "main" } else { "pre" };
                    return Some(format!("{axis} {direction} {name} limit switch touched"));
                }
            }
        }
    }

    None
}
