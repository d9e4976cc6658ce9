//! The access controller around the aggregate record.
//!
//! Readers load the latest committed [`Snapshot`] through an `ArcSwap` and
//! never take a lock. Writers are serialized by a short commit lock with a
//! bounded wait; each commit clones the current record, applies the
//! caller's groups, runs the interlock checks and publishes the result as
//! one new generation.

use crate::command::{CommandBoard, CommandFlags};
use crate::data::{CalibrationInput, CalibrationSample, SystemStatus, VarData};
use crate::error::{ArmBlock, Invariant, StateError, StateResult};
use crate::interlock;
use crate::ownership::{GroupId, GroupUpdate, Owner};
use crate::reader::SnapshotReader;
use crate::snapshot::{Generation, Snapshot};
use crate::writer::Transaction;
use antenna::config::StoreSettings;
use antenna::consts::MAX_CALIBRATION_SAMPLES;
use antenna::state::{ControlMode, ErrorCode};
use arc_swap::ArcSwap;
use crossbeam_channel::{Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};

/// Result of one [`StateStore::process_calibration`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CalibrationOutcome {
    /// Samples appended to the buffer.
    pub added: u32,
    /// Buffer resets applied.
    pub resets: u32,
    /// Inputs discarded because calibration was not active.
    pub ignored: u32,
    /// Samples discarded because the buffer was full.
    pub dropped: u32,
}

/// Shared state store.
///
/// Share between threads as `Arc<StateStore>`.
pub struct StateStore {
    current: ArcSwap<Snapshot>,
    pub(crate) commit_lock: Mutex<()>,
    commands: CommandBoard,
    calibration_tx: Sender<CalibrationInput>,
    calibration_rx: Receiver<CalibrationInput>,
    /// Inputs dequeued by a calibration step whose commit failed.
    calibration_backlog: Mutex<heapless::Vec<CalibrationInput, MAX_CALIBRATION_SAMPLES>>,
    settings: StoreSettings,
}

impl StateStore {
    /// Create a store holding the power-on record.
    pub fn new(settings: StoreSettings) -> Self {
        let (calibration_tx, calibration_rx) =
            crossbeam_channel::bounded(settings.calibration_queue_capacity);
        Self {
            current: ArcSwap::from_pointee(Snapshot::initial()),
            commit_lock: Mutex::new(()),
            commands: CommandBoard::new(),
            calibration_tx,
            calibration_rx,
            calibration_backlog: Mutex::new(heapless::Vec::new()),
            settings,
        }
    }

    /// Active settings.
    pub fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    // ─── Reading ────────────────────────────────────────────────────

    /// Latest committed snapshot. Lock-free.
    #[inline]
    pub fn read_snapshot(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    /// Per-consumer reader tracking the last seen generation.
    pub fn reader(self: &Arc<Self>) -> SnapshotReader {
        SnapshotReader::new(Arc::clone(self))
    }

    /// Commands issued and not yet consumed.
    #[inline]
    pub fn pending_commands(&self) -> CommandFlags {
        self.commands.pending()
    }

    // ─── Writing ────────────────────────────────────────────────────

    /// Start a transaction committing several groups as one generation.
    pub fn transaction(&self, owner: Owner) -> Transaction<'_> {
        Transaction::new(self, owner)
    }

    /// Replace one group atomically.
    pub fn write_group(
        &self,
        owner: Owner,
        update: GroupUpdate,
    ) -> StateResult<Generation> {
        let mut tx = self.transaction(owner);
        tx.stage(update)?;
        tx.commit()
    }

    /// Set the operator-requested control mode from its wire string.
    ///
    /// Unrecognized strings are rejected and the current request is kept.
    pub fn request_control_mode(&self, owner: Owner, mode: &str) -> StateResult<Generation> {
        ensure_permitted(owner, GroupId::OperatorRequest)?;
        let mode: ControlMode = mode.parse().map_err(|e| {
            warn!(owner = %owner, "rejected control mode request: {e}");
            StateError::from(e)
        })?;
        self.commit_with(owner, &[], |d| {
            d.system.request.control_mode = mode;
            Ok(())
        })
    }

    /// Modify the control-loop status in place under the commit lock.
    ///
    /// Unlike a [`GroupUpdate::SystemStatus`]
    /// replacement this cannot undo a safety override committed after the
    /// caller last read the status.
    pub fn update_status<F>(&self, owner: Owner, f: F) -> StateResult<Generation>
    where
        F: FnOnce(&mut SystemStatus),
    {
        ensure_permitted(owner, GroupId::SystemStatus)?;
        self.commit_with(owner, &[], |d| {
            f(&mut d.system.status);
            Ok(())
        })
    }

    /// Control-loop mode selection step.
    ///
    /// Activates the operator-requested mode, or `NONE` while a fatal error
    /// is latched, and derives the tracking flag. Returns the active mode.
    pub fn select_control_mode(&self, owner: Owner) -> StateResult<ControlMode> {
        ensure_permitted(owner, GroupId::SystemStatus)?;
        let mut selected = ControlMode::None;
        self.commit_with(owner, &[], |d| {
            selected = if d.system.faults.fatal_error_flag {
                ControlMode::None
            } else {
                d.system.request.control_mode
            };
            d.system.status.control_mode = selected;
            d.system.status.track_status = selected.is_tracking() && d.system.status.arm_status;
            Ok(())
        })?;
        Ok(selected)
    }

    /// Apply `mutate` to a copy of the current record and publish it.
    ///
    /// `also` names owners whose fields `mutate` changes on their behalf.
    pub(crate) fn commit_with<F>(
        &self,
        owner: Owner,
        also: &[Owner],
        mutate: F,
    ) -> StateResult<Generation>
    where
        F: FnOnce(&mut VarData) -> StateResult<()>,
    {
        let Some(_guard) = self
            .commit_lock
            .try_lock_for(self.settings.write_lock_timeout())
        else {
            warn!(owner = %owner, "commit lock wait exceeded");
            return Err(StateError::WriteTimeout {
                owner,
                timeout_us: self.settings.write_lock_timeout_us,
            });
        };

        let current = self.current.load_full();
        let mut next = current.data().clone();
        mutate(&mut next)?;

        let checked = interlock::check_transition(current.data(), &next).and_then(|()| {
            let overrides = interlock::apply_overrides(current.data(), &mut next);
            interlock::check_state(&next).map(|()| overrides)
        });
        let overrides = match checked {
            Ok(overrides) => overrides,
            Err(invariant) => {
                warn!(owner = %owner, "commit rejected: {invariant}");
                return Err(invariant.into());
            }
        };

        let mut touched = heapless::Vec::<Owner, { Owner::COUNT }>::new();
        for o in also.iter().copied() {
            if o != owner && !touched.contains(&o) {
                let _ = touched.push(o);
            }
        }
        if overrides.touched_control_loop()
            && owner != Owner::ControlLoop
            && !touched.contains(&Owner::ControlLoop)
        {
            let _ = touched.push(Owner::ControlLoop);
        }
        if overrides.disarmed {
            warn!(owner = %owner, "safety override: disarmed");
        }
        if overrides.alarm_raised {
            warn!(
                owner = %owner,
                alarm = next.system.faults.alarm_message.as_str(),
                "alarm raised"
            );
        }

        let snapshot = current.successor(owner, &touched, next);
        let generation = snapshot.generation();
        self.current.store(Arc::new(snapshot));
        trace!(owner = %owner, generation = %generation, "committed");
        Ok(generation)
    }

    // ─── Commands ───────────────────────────────────────────────────

    /// Issue operator commands.
    ///
    /// `ARM` is refused while a fatal error is latched.
    pub fn issue_command(&self, owner: Owner, flags: CommandFlags) -> StateResult<()> {
        if !CommandFlags::issuable_by(owner).contains(flags) {
            warn!(owner = %owner, command = ?flags, "command issue denied");
            return Err(StateError::CommandPermissionDenied {
                owner,
                command: flags,
            });
        }
        if flags.contains(CommandFlags::ARM)
            && self.read_snapshot().system.faults.fatal_error_flag
        {
            warn!(owner = %owner, "arm command refused: fatal error latched");
            return Err(Invariant::ArmBlocked {
                reason: ArmBlock::FatalError,
            }
            .into());
        }
        self.commands.raise(flags);
        debug!(owner = %owner, command = ?flags, "command issued");
        Ok(())
    }

    /// Atomically read and clear `flag`. Returns whether it was pending.
    pub fn consume_command(&self, owner: Owner, flag: CommandFlags) -> StateResult<bool> {
        Ok(!self.take_commands(owner, flag)?.is_empty())
    }

    /// Atomically read and clear `flags`. Returns the subset that was pending.
    pub fn take_commands(&self, owner: Owner, flags: CommandFlags) -> StateResult<CommandFlags> {
        if !CommandFlags::consumable_by(owner).contains(flags) {
            warn!(owner = %owner, command = ?flags, "command consume denied");
            return Err(StateError::CommandPermissionDenied {
                owner,
                command: flags,
            });
        }
        let taken = self.commands.take(flags);
        if !taken.is_empty() {
            debug!(owner = %owner, command = ?taken, "command consumed");
        }
        Ok(taken)
    }

    /// Consume `flag` and run `service` for it.
    ///
    /// On a transient failure the command is raised again so the next
    /// cycle retries it. Returns `None` when `flag` was not pending.
    pub(crate) fn service_command<T, F>(
        &self,
        owner: Owner,
        flag: CommandFlags,
        service: F,
    ) -> StateResult<Option<T>>
    where
        F: FnOnce() -> StateResult<T>,
    {
        if !self.consume_command(owner, flag)? {
            return Ok(None);
        }
        service().map(Some).inspect_err(|e| self.restore_on_transient(owner, flag, e))
    }

    fn restore_on_transient(&self, owner: Owner, flags: CommandFlags, err: &StateError) {
        if err.is_transient() {
            self.commands.raise(flags);
            debug!(owner = %owner, command = ?flags, "command kept pending: {err}");
        }
    }

    /// Consume `ARM`/`DISARM` and commit the resulting arm status.
    ///
    /// `DISARM` wins when both are pending. Returns the new arm status, or
    /// `None` when neither command was pending. A refused `ARM` is
    /// consumed; a commit lock timeout leaves the commands pending.
    pub fn process_arm_commands(&self, owner: Owner) -> StateResult<Option<bool>> {
        let taken = self.take_commands(owner, CommandFlags::ARM | CommandFlags::DISARM)?;
        if taken.contains(CommandFlags::DISARM) {
            self.commit_with(owner, &[], |d| {
                d.system.status.arm_status = false;
                d.system.status.track_status = false;
                d.motors.neutralize();
                Ok(())
            })
            .inspect_err(|e| self.restore_on_transient(owner, taken, e))?;
            info!(owner = %owner, "disarmed on request");
            return Ok(Some(false));
        }
        if taken.contains(CommandFlags::ARM) {
            self.commit_with(owner, &[], |d| {
                d.system.status.arm_status = true;
                Ok(())
            })
            .inspect_err(|e| self.restore_on_transient(owner, taken, e))?;
            info!(owner = %owner, "armed on request");
            return Ok(Some(true));
        }
        Ok(None)
    }

    // ─── Calibration ────────────────────────────────────────────────

    /// Queue a calibration sample and raise `ADD_SAMPLE`.
    pub fn submit_calibration_sample(
        &self,
        owner: Owner,
        sample: CalibrationSample,
    ) -> StateResult<()> {
        self.queue_calibration(owner, CalibrationInput::Sample(sample), CommandFlags::ADD_SAMPLE)
    }

    /// Queue a sample buffer reset and raise `RESET_SAMPLES`.
    pub fn request_calibration_reset(&self, owner: Owner) -> StateResult<()> {
        self.queue_calibration(owner, CalibrationInput::Reset, CommandFlags::RESET_SAMPLES)
    }

    fn queue_calibration(
        &self,
        owner: Owner,
        input: CalibrationInput,
        flag: CommandFlags,
    ) -> StateResult<()> {
        if !CommandFlags::issuable_by(owner).contains(flag) {
            return Err(StateError::CommandPermissionDenied {
                owner,
                command: flag,
            });
        }
        self.calibration_tx.try_send(input).map_err(|e| match e {
            TrySendError::Full(_) | TrySendError::Disconnected(_) => {
                warn!(owner = %owner, "calibration queue full");
                StateError::CalibrationQueueFull
            }
        })?;
        self.commands.raise(flag);
        Ok(())
    }

    /// Calibration engine step.
    ///
    /// Mirrors the operator request into the engine status, consumes
    /// `ADD_SAMPLE`/`RESET_SAMPLES` and applies queued inputs in arrival
    /// order. Inputs are discarded while calibration is not active.
    ///
    /// When the commit fails the dequeued inputs are kept for the next
    /// step and the consumed commands are raised again.
    pub fn process_calibration(&self, owner: Owner) -> StateResult<CalibrationOutcome> {
        ensure_permitted(owner, GroupId::Calibration)?;
        let taken = self.take_commands(owner, CommandFlags::CALIBRATION)?;

        let mut inputs = std::mem::take(&mut *self.calibration_backlog.lock());
        while !inputs.is_full() {
            match self.calibration_rx.try_recv() {
                Ok(input) => {
                    let _ = inputs.push(input);
                }
                Err(_) => break,
            }
        }

        let mut outcome = CalibrationOutcome::default();
        let committed = self.commit_with(owner, &[], |d| {
            let cal = &mut d.calibration;
            cal.status.active = cal.request.enabled;
            cal.status.kind = cal.request.kind;
            cal.status.freedom_mode = cal.request.freedom_mode;

            for input in inputs.iter().copied() {
                if !cal.status.active {
                    outcome.ignored += 1;
                    continue;
                }
                match input {
                    CalibrationInput::Reset => {
                        cal.reset_samples();
                        outcome.resets += 1;
                    }
                    CalibrationInput::Sample(sample) => match cal.push_sample(sample) {
                        Ok(()) => outcome.added += 1,
                        Err(_) => outcome.dropped += 1,
                    },
                }
            }

            if outcome.dropped > 0 {
                let message = format!(
                    "calibration buffer full: {} samples dropped",
                    outcome.dropped
                );
                d.system.faults.set_alarm(&message);
            }
            Ok(())
        });
        if let Err(e) = committed {
            if !inputs.is_empty() {
                warn!(owner = %owner, kept = inputs.len(), "calibration commit failed, inputs kept");
            }
            *self.calibration_backlog.lock() = inputs;
            self.commands.raise(taken);
            return Err(e);
        }

        if outcome.ignored > 0 {
            debug!(ignored = outcome.ignored, "calibration inputs ignored while inactive");
        }
        if outcome.dropped > 0 {
            warn!(dropped = outcome.dropped, "calibration buffer full");
        }
        Ok(outcome)
    }

    // ─── Faults ─────────────────────────────────────────────────────

    /// Raise an alarm. Operator interfaces may not.
    pub fn raise_alarm(&self, owner: Owner, message: &str) -> StateResult<Generation> {
        if !owner.may_raise_alarm() {
            return Err(fault_report_denied(owner));
        }
        warn!(owner = %owner, "alarm: {message}");
        self.commit_with(owner, &[], |d| {
            d.system.faults.set_alarm(message);
            Ok(())
        })
    }

    /// Clear the alarm. Control loop only.
    pub fn clear_alarm(&self, owner: Owner) -> StateResult<Generation> {
        if owner != Owner::ControlLoop {
            return Err(StateError::PermissionDenied {
                owner,
                group: GroupId::Faults,
            });
        }
        self.commit_with(owner, &[], |d| {
            d.system.faults.clear_alarm();
            Ok(())
        })
    }

    /// Latch a fatal error.
    ///
    /// Forces control mode `NONE`, withdraws the requested mode, disarms,
    /// neutralizes motor outputs and discards a pending `ARM`. Reported by
    /// the control loop and the device subsystems only.
    pub fn raise_fatal(
        &self,
        owner: Owner,
        code: ErrorCode,
        message: &str,
    ) -> StateResult<Generation> {
        if !owner.may_raise_fatal() {
            return Err(fault_report_denied(owner));
        }
        error!(owner = %owner, code = ?code, category = ?code.category(), "fatal error: {message}");
        let generation = self.commit_with(owner, &[Owner::ControlLoop], |d| {
            d.system.faults.set_fatal(code, message);
            d.system.request.control_mode = ControlMode::None;
            d.system.status.control_mode = ControlMode::None;
            d.system.status.arm_status = false;
            d.system.status.track_status = false;
            d.motors.neutralize();
            Ok(())
        })?;
        self.commands.take(CommandFlags::ARM);
        Ok(generation)
    }

    /// Consume `CLEAR_ERROR` and release a latched fatal error.
    ///
    /// The control mode stays `NONE` until re-requested. The alarm is
    /// cleared too unless an emergency stop or limit condition persists.
    /// Returns whether anything was cleared.
    pub fn clear_fatal_error(&self, owner: Owner) -> StateResult<bool> {
        let cleared = self.service_command(owner, CommandFlags::CLEAR_ERROR, || {
            let snapshot = self.read_snapshot();
            let faults = &snapshot.system.faults;
            let alarm_persists = snapshot.alarm_condition_present();
            if !faults.fatal_error_flag && (!faults.alarm_flag || alarm_persists) {
                debug!(owner = %owner, "clear error: nothing to clear");
                return Ok(false);
            }

            self.commit_with(owner, &[], |d| {
                if d.system.faults.fatal_error_flag {
                    d.system.faults.clear_fatal();
                    d.system.status.control_mode = ControlMode::None;
                }
                if !d.alarm_condition_present() {
                    d.system.faults.clear_alarm();
                }
                Ok(())
            })?;
            info!(owner = %owner, "errors cleared");
            Ok(true)
        })?;
        Ok(cleared.unwrap_or(false))
    }
}

impl std::fmt::Debug for StateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateStore")
            .field("generation", &self.read_snapshot().generation())
            .field("pending_commands", &self.pending_commands())
            .field("settings", &self.settings)
            .finish()
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new(StoreSettings::default())
    }
}

pub(crate) fn ensure_permitted(owner: Owner, group: GroupId) -> StateResult<()> {
    if group.permits(owner) {
        Ok(())
    } else {
        warn!(owner = %owner, group = %group, "write denied");
        Err(StateError::PermissionDenied { owner, group })
    }
}

fn fault_report_denied(owner: Owner) -> StateError {
    warn!(owner = %owner, "fault report denied");
    StateError::PermissionDenied {
        owner,
        group: GroupId::Faults,
    }
}

static_assertions::assert_impl_all!(StateStore: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{GpsData, LimitSwitchData, MotorOutput, TimeData};
    use antenna::state::{Axis, MotorId};

    #[test]
    fn write_then_read_back() {
        let store = StateStore::default();
        let time = TimeData {
            timestamp_us: 1_000,
            loop_duration_us: 87,
        };
        let generation = store
            .write_group(Owner::ControlLoop, GroupUpdate::Time(time))
            .unwrap();
        let snap = store.read_snapshot();
        assert_eq!(snap.generation(), generation);
        assert_eq!(snap.time, time);
        assert_eq!(snap.committed_by(), Some(Owner::ControlLoop));
    }

    #[test]
    fn non_owner_write_leaves_store_unchanged() {
        let store = StateStore::default();
        let before = store.read_snapshot();
        let err = store
            .write_group(Owner::Hmi, GroupUpdate::Gps(GpsData::default()))
            .unwrap_err();
        assert!(matches!(
            err,
            StateError::PermissionDenied {
                owner: Owner::Hmi,
                group: GroupId::Gps
            }
        ));
        assert_eq!(store.read_snapshot().generation(), before.generation());
    }

    #[test]
    fn disarmed_motor_output_is_rejected() {
        let store = StateStore::default();
        let err = store
            .write_group(
                Owner::ControlLoop,
                GroupUpdate::MotorOutput(
                    MotorId::AzimuthMaster,
                    MotorOutput {
                        primary: 0.3,
                        secondary: 0.0,
                    },
                ),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            StateError::InvariantViolation(Invariant::DisarmedOutputNotNeutral { .. })
        ));
    }

    #[test]
    fn fieldbus_limit_override_advances_control_loop_generation() {
        let store = StateStore::default();
        store
            .write_group(
                Owner::ControlLoop,
                GroupUpdate::SystemStatus(SystemStatus {
                    arm_status: true,
                    ..Default::default()
                }),
            )
            .unwrap();
        let cl_before = store.read_snapshot().owner_generation(Owner::ControlLoop);

        store
            .write_group(
                Owner::Fieldbus,
                GroupUpdate::LimitSwitch(Axis::Azimuth, LimitSwitchData::from_bits(0b100, 0)),
            )
            .unwrap();
        let snap = store.read_snapshot();
        assert!(!snap.system.status.arm_status);
        assert!(snap.system.faults.alarm_flag);
        assert_eq!(snap.owner_generation(Owner::ControlLoop), cl_before.next());
    }

    #[test]
    fn unknown_control_mode_keeps_request() {
        let store = StateStore::default();
        store.request_control_mode(Owner::Hmi, "POS").unwrap();
        let err = store.request_control_mode(Owner::Hmi, "POSITION").unwrap_err();
        assert!(matches!(err, StateError::UnknownControlMode { .. }));
        assert_eq!(
            store.read_snapshot().system.request.control_mode,
            ControlMode::Position
        );
        assert!(store.request_control_mode(Owner::ControlLoop, "POS").is_err());
    }

    #[test]
    fn command_issue_and_consume_permissions() {
        let store = StateStore::default();
        assert!(store
            .issue_command(Owner::Fieldbus, CommandFlags::SAVE_PARAMS)
            .is_err());
        store
            .issue_command(Owner::RestApi, CommandFlags::SAVE_PARAMS)
            .unwrap();
        assert!(store
            .consume_command(Owner::ControlLoop, CommandFlags::SAVE_PARAMS)
            .is_err());
        assert!(store
            .consume_command(Owner::Persistence, CommandFlags::SAVE_PARAMS)
            .unwrap());
        assert!(!store
            .consume_command(Owner::Persistence, CommandFlags::SAVE_PARAMS)
            .unwrap());
    }

    #[test]
    fn disarm_wins_over_arm() {
        let store = StateStore::default();
        store
            .issue_command(Owner::Hmi, CommandFlags::ARM | CommandFlags::DISARM)
            .unwrap();
        assert_eq!(
            store.process_arm_commands(Owner::ControlLoop).unwrap(),
            Some(false)
        );
        assert!(store.pending_commands().is_empty());
        assert_eq!(store.process_arm_commands(Owner::ControlLoop).unwrap(), None);
    }

    #[test]
    fn clear_alarm_is_control_loop_only() {
        let store = StateStore::default();
        store.raise_alarm(Owner::Gps, "GPS fix lost").unwrap();
        assert!(store.clear_alarm(Owner::Hmi).is_err());
        store.clear_alarm(Owner::ControlLoop).unwrap();
        assert!(!store.read_snapshot().system.faults.alarm_flag);
    }

    #[test]
    fn operators_cannot_report_faults() {
        let store = StateStore::default();
        let before = store.read_snapshot().generation();

        let err = store
            .raise_fatal(Owner::Hmi, ErrorCode::DriverAlarm, "drive fault")
            .unwrap_err();
        assert!(matches!(
            err,
            StateError::PermissionDenied {
                owner: Owner::Hmi,
                group: GroupId::Faults
            }
        ));
        assert!(store.raise_alarm(Owner::RestApi, "limit touched").is_err());
        assert!(store
            .raise_fatal(Owner::Persistence, ErrorCode::General, "disk")
            .is_err());

        let snap = store.read_snapshot();
        assert_eq!(snap.generation(), before);
        assert!(!snap.system.faults.fatal_error_flag);
        assert!(!snap.system.faults.alarm_flag);
    }

    #[test]
    fn lock_timeout_keeps_disarm_pending() {
        let store = StateStore::default();
        store.issue_command(Owner::Hmi, CommandFlags::ARM).unwrap();
        store.process_arm_commands(Owner::ControlLoop).unwrap();
        store.issue_command(Owner::RestApi, CommandFlags::DISARM).unwrap();

        let guard = store.commit_lock.lock();
        let err = store.process_arm_commands(Owner::ControlLoop).unwrap_err();
        assert!(matches!(err, StateError::WriteTimeout { .. }));
        assert!(store.pending_commands().contains(CommandFlags::DISARM));
        drop(guard);

        assert_eq!(
            store.process_arm_commands(Owner::ControlLoop).unwrap(),
            Some(false)
        );
        assert!(!store.read_snapshot().system.status.arm_status);
        assert!(store.pending_commands().is_empty());
    }

    #[test]
    fn lock_timeout_keeps_clear_error_pending() {
        let store = StateStore::default();
        store
            .raise_fatal(Owner::Fieldbus, ErrorCode::EncoderAlarm, "encoder")
            .unwrap();
        store.issue_command(Owner::Hmi, CommandFlags::CLEAR_ERROR).unwrap();

        let guard = store.commit_lock.lock();
        assert!(store.clear_fatal_error(Owner::ControlLoop).is_err());
        assert!(store.pending_commands().contains(CommandFlags::CLEAR_ERROR));
        drop(guard);

        assert!(store.clear_fatal_error(Owner::ControlLoop).unwrap());
        assert!(!store.read_snapshot().system.faults.fatal_error_flag);
    }

    #[test]
    fn calibration_inputs_survive_failed_commit() {
        let store = StateStore::default();
        store
            .write_group(
                Owner::Hmi,
                GroupUpdate::CalibrationRequest(crate::data::CalibrationRequest {
                    enabled: true,
                    ..Default::default()
                }),
            )
            .unwrap();
        let samples = [[1.0, 2.0, 3.0, 4.0], [5.0, 6.0, 7.0, 8.0]];
        store
            .submit_calibration_sample(Owner::Hmi, CalibrationSample::from_array(samples[0]))
            .unwrap();

        let guard = store.commit_lock.lock();
        let err = store.process_calibration(Owner::Calibration).unwrap_err();
        assert!(matches!(err, StateError::WriteTimeout { .. }));
        assert!(store.pending_commands().contains(CommandFlags::ADD_SAMPLE));
        drop(guard);

        // Arrives after the failed step and must stay behind the kept one.
        store
            .submit_calibration_sample(Owner::Hmi, CalibrationSample::from_array(samples[1]))
            .unwrap();
        let outcome = store.process_calibration(Owner::Calibration).unwrap();
        assert_eq!(outcome.added, 2);

        let snap = store.read_snapshot();
        let stored: Vec<[f64; 4]> = snap.calibration.samples.iter().map(|s| s.to_array()).collect();
        assert_eq!(stored, samples);
        assert!(store.pending_commands().is_empty());
    }

    #[test]
    fn mode_selection_follows_request_and_fatal_latch() {
        let store = StateStore::default();
        store.request_control_mode(Owner::RestApi, "SUN").unwrap();
        assert_eq!(
            store.select_control_mode(Owner::ControlLoop).unwrap(),
            ControlMode::Sun
        );
        assert!(!store.read_snapshot().system.status.track_status);
        assert!(store.select_control_mode(Owner::Hmi).is_err());

        store
            .raise_fatal(Owner::Gps, ErrorCode::Connection, "receiver lost")
            .unwrap();
        assert_eq!(
            store.select_control_mode(Owner::ControlLoop).unwrap(),
            ControlMode::None
        );
        assert_eq!(
            store.read_snapshot().system.request.control_mode,
            ControlMode::None
        );
    }
}
