//! End-to-end tracker scenarios against one store

use antenna::state::{Axis, CalibrationKind, ControlMode, ErrorCode, MotorId};
use antenna_state::{
    ArmBlock, CalibrationRequest, CalibrationSample, CommandFlags, EmergencyStop, EncoderData,
    GroupUpdate, Invariant, LimitSwitchData, MotorOutput, Owner, StateError, StateResult,
    StateStore,
};
use std::time::{Duration, Instant};

fn armed_store() -> StateResult<StateStore> {
    let store = StateStore::default();
    store.issue_command(Owner::Hmi, CommandFlags::ARM)?;
    assert_eq!(store.process_arm_commands(Owner::ControlLoop)?, Some(true));
    store.write_group(
        Owner::ControlLoop,
        GroupUpdate::MotorOutput(
            MotorId::AzimuthMaster,
            MotorOutput {
                primary: 0.4,
                secondary: 0.0,
            },
        ),
    )?;
    Ok(store)
}

#[test]
fn main_limit_while_armed_disarms_with_alarm() -> StateResult<()> {
    let store = armed_store()?;

    store.write_group(
        Owner::Fieldbus,
        GroupUpdate::LimitSwitch(Axis::Azimuth, LimitSwitchData::from_bits(0b100, 0)),
    )?;

    let snap = store.read_snapshot();
    assert!(snap.system.faults.alarm_flag);
    assert!(!snap.system.status.arm_status);
    assert_eq!(snap.motors.first_active(), None);
    assert!(!snap.system.faults.fatal_error_flag);

    // The override took effect within one fieldbus cycle of the report.
    let bound = store.settings().fieldbus_cycle();
    assert!(snap.is_fresh(Owner::ControlLoop, bound, Instant::now()));
    Ok(())
}

#[test]
fn arming_refused_while_main_limit_held() -> StateResult<()> {
    let store = StateStore::default();
    store.write_group(
        Owner::Fieldbus,
        GroupUpdate::LimitSwitch(Axis::Elevation, LimitSwitchData::from_bits(0, 0b100)),
    )?;
    store.issue_command(Owner::Hmi, CommandFlags::ARM)?;

    let err = store.process_arm_commands(Owner::ControlLoop).unwrap_err();
    assert!(matches!(
        err,
        StateError::InvariantViolation(Invariant::ArmBlocked {
            reason: ArmBlock::MainLimit
        })
    ));
    assert!(!store.read_snapshot().system.status.arm_status);
    assert!(store.pending_commands().is_empty());
    Ok(())
}

#[test]
fn emergency_stop_beats_concurrent_arm_request() -> StateResult<()> {
    let store = StateStore::default();
    store.write_group(
        Owner::Fieldbus,
        GroupUpdate::EmergencyStop(EmergencyStop::CABIN),
    )?;
    store.issue_command(Owner::RestApi, CommandFlags::ARM)?;

    assert!(store.process_arm_commands(Owner::ControlLoop).is_err());
    let snap = store.read_snapshot();
    assert!(!snap.system.status.arm_status);
    assert_eq!(
        snap.system.faults.alarm_message.as_str(),
        "emergency stop pressed: cabin"
    );
    Ok(())
}

#[test]
fn three_samples_stored_in_arrival_order() -> StateResult<()> {
    let store = StateStore::default();
    store.write_group(
        Owner::Hmi,
        GroupUpdate::CalibrationRequest(CalibrationRequest {
            enabled: true,
            kind: CalibrationKind::Online,
            freedom_mode: 3,
        }),
    )?;
    store.process_calibration(Owner::Calibration)?;
    assert!(store.read_snapshot().calibration.status.active);

    let samples = [
        [10.0, 20.0, 10.5, 20.5],
        [30.0, 40.0, 30.5, 40.5],
        [50.0, 60.0, 50.5, 60.5],
    ];
    for s in samples {
        store.submit_calibration_sample(Owner::Hmi, CalibrationSample::from_array(s))?;
    }
    assert!(store.pending_commands().contains(CommandFlags::ADD_SAMPLE));

    let before = store.read_snapshot().calibration.sample_count;
    let outcome = store.process_calibration(Owner::Calibration)?;
    assert_eq!(outcome.added, 3);

    let snap = store.read_snapshot();
    assert_eq!(snap.calibration.sample_count, before + 3);
    let stored: Vec<[f64; 4]> = snap.calibration.samples.iter().map(|s| s.to_array()).collect();
    assert_eq!(stored, samples);
    assert_eq!(snap.calibration.last_sample.to_array(), samples[2]);
    assert!(!store.pending_commands().contains(CommandFlags::ADD_SAMPLE));
    Ok(())
}

#[test]
fn sample_reset_respects_arrival_order() -> StateResult<()> {
    let store = StateStore::default();
    store.write_group(
        Owner::RestApi,
        GroupUpdate::CalibrationRequest(CalibrationRequest {
            enabled: true,
            ..Default::default()
        }),
    )?;
    let sample = CalibrationSample::from_array([1.0, 2.0, 3.0, 4.0]);
    store.submit_calibration_sample(Owner::RestApi, sample)?;
    store.request_calibration_reset(Owner::RestApi)?;
    store.submit_calibration_sample(Owner::RestApi, sample)?;

    let outcome = store.process_calibration(Owner::Calibration)?;
    assert_eq!((outcome.added, outcome.resets), (2, 1));
    assert_eq!(store.read_snapshot().calibration.sample_count, 1);
    Ok(())
}

#[test]
fn samples_ignored_while_calibration_inactive() -> StateResult<()> {
    let store = StateStore::default();
    store.submit_calibration_sample(Owner::Hmi, CalibrationSample::default())?;

    let outcome = store.process_calibration(Owner::Calibration)?;
    assert_eq!(outcome.ignored, 1);
    assert_eq!(store.read_snapshot().calibration.sample_count, 0);
    Ok(())
}

#[test]
fn hmi_encoder_write_rejected_and_state_unchanged() {
    let store = StateStore::default();
    let before = store.read_snapshot();

    let err = store
        .write_group(
            Owner::Hmi,
            GroupUpdate::Encoder(
                Axis::Azimuth,
                EncoderData {
                    position_deg: 90.0,
                    ..Default::default()
                },
            ),
        )
        .unwrap_err();
    assert!(matches!(err, StateError::PermissionDenied { .. }));

    let after = store.read_snapshot();
    assert_eq!(after.generation(), before.generation());
    assert_eq!(after.data(), before.data());
}

#[test]
fn fatal_error_cleared_keeps_mode_none() -> StateResult<()> {
    let store = armed_store()?;
    store.request_control_mode(Owner::Hmi, "POS")?;
    store.update_status(Owner::ControlLoop, |s| s.control_mode = ControlMode::Position)?;

    store.raise_fatal(Owner::Fieldbus, ErrorCode::DriverAlarm, "az master drive fault")?;
    let snap = store.read_snapshot();
    assert!(snap.system.faults.fatal_error_flag);
    assert_eq!(snap.system.faults.error_code, ErrorCode::DriverAlarm);
    assert_eq!(snap.system.status.control_mode, ControlMode::None);
    assert!(!snap.system.status.arm_status);

    // Leaving NONE is refused while latched.
    assert!(store
        .update_status(Owner::ControlLoop, |s| s.control_mode = ControlMode::Position)
        .is_err());
    // So is arming.
    assert!(store.issue_command(Owner::Hmi, CommandFlags::ARM).is_err());

    // Nothing happens until the operator asks.
    assert!(!store.clear_fatal_error(Owner::ControlLoop)?);
    store.issue_command(Owner::Hmi, CommandFlags::CLEAR_ERROR)?;
    assert!(store.clear_fatal_error(Owner::ControlLoop)?);

    let snap = store.read_snapshot();
    assert!(!snap.system.faults.fatal_error_flag);
    assert_eq!(snap.system.faults.error_code, ErrorCode::General);
    assert!(snap.system.faults.error_message.is_empty());
    assert_eq!(snap.system.status.control_mode, ControlMode::None);
    assert_eq!(snap.system.request.control_mode, ControlMode::None);

    // The next control-loop cycle does not resume the old mode on its own.
    assert_eq!(store.select_control_mode(Owner::ControlLoop)?, ControlMode::None);
    assert_eq!(store.read_snapshot().system.status.control_mode, ControlMode::None);

    store.request_control_mode(Owner::Hmi, "POS")?;
    assert_eq!(store.select_control_mode(Owner::ControlLoop)?, ControlMode::Position);
    Ok(())
}

#[test]
fn operator_cannot_latch_fatal_error() {
    let store = StateStore::default();
    let err = store
        .raise_fatal(Owner::RestApi, ErrorCode::RestApiInput, "spoofed")
        .unwrap_err();
    assert!(matches!(err, StateError::PermissionDenied { owner: Owner::RestApi, .. }));
    assert!(store.raise_alarm(Owner::Hmi, "spoofed").is_err());

    let snap = store.read_snapshot();
    assert!(!snap.system.faults.fatal_error_flag);
    assert!(!snap.system.faults.alarm_flag);
    assert_eq!(snap.generation().0, 0);
}

#[test]
fn raise_fatal_discards_pending_arm() -> StateResult<()> {
    let store = StateStore::default();
    store.issue_command(Owner::Hmi, CommandFlags::ARM | CommandFlags::SAVE_PARAMS)?;
    store.raise_fatal(Owner::Gps, ErrorCode::Connection, "receiver lost")?;

    assert_eq!(store.pending_commands(), CommandFlags::SAVE_PARAMS);
    assert_eq!(store.process_arm_commands(Owner::ControlLoop)?, None);
    Ok(())
}

#[test]
fn fatal_from_other_owner_advances_control_loop_generation() -> StateResult<()> {
    let store = StateStore::default();
    store.raise_fatal(Owner::Calibration, ErrorCode::Calibration, "solver diverged")?;
    let snap = store.read_snapshot();
    assert_eq!(snap.owner_generation(Owner::ControlLoop).0, 1);
    assert_eq!(snap.owner_generation(Owner::Calibration).0, 1);
    assert!(snap.is_fresh(Owner::ControlLoop, Duration::from_secs(1), Instant::now()));
    Ok(())
}

#[test]
fn clear_error_keeps_alarm_while_condition_persists() -> StateResult<()> {
    let store = StateStore::default();
    store.write_group(
        Owner::Fieldbus,
        GroupUpdate::LimitSwitch(Axis::Azimuth, LimitSwitchData::from_bits(0b010, 0)),
    )?;
    assert!(store.read_snapshot().system.faults.alarm_flag);

    store.issue_command(Owner::Hmi, CommandFlags::CLEAR_ERROR)?;
    assert!(!store.clear_fatal_error(Owner::ControlLoop)?);
    assert!(store.read_snapshot().system.faults.alarm_flag);

    store.write_group(
        Owner::Fieldbus,
        GroupUpdate::LimitSwitch(Axis::Azimuth, LimitSwitchData::default()),
    )?;
    store.issue_command(Owner::Hmi, CommandFlags::CLEAR_ERROR)?;
    assert!(store.clear_fatal_error(Owner::ControlLoop)?);
    assert!(!store.read_snapshot().system.faults.alarm_flag);
    Ok(())
}
