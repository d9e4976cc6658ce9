//! Multi-group transactions.

use crate::error::{StateError, StateResult};
use crate::ownership::{GroupUpdate, Owner};
use crate::snapshot::Generation;
use crate::store::{StateStore, ensure_permitted};
use antenna::consts::MAX_UPDATES_PER_COMMIT;

/// Updates staged by one owner and committed as a single generation.
///
/// Every staged group is permission-checked at [`stage`](Self::stage), so
/// a transaction that reaches [`commit`](Self::commit) only touches the
/// owner's own groups. Dropping an uncommitted transaction discards it.
#[must_use = "staged updates are discarded unless committed"]
pub struct Transaction<'a> {
    store: &'a StateStore,
    owner: Owner,
    updates: heapless::Vec<GroupUpdate, MAX_UPDATES_PER_COMMIT>,
}

impl<'a> Transaction<'a> {
    pub(crate) fn new(store: &'a StateStore, owner: Owner) -> Self {
        Self {
            store,
            owner,
            updates: heapless::Vec::new(),
        }
    }

    /// Stage one group replacement.
    pub fn stage(&mut self, update: GroupUpdate) -> StateResult<&mut Self> {
        ensure_permitted(self.owner, update.group())?;
        self.updates
            .push(update)
            .map_err(|_| StateError::TransactionFull {
                capacity: MAX_UPDATES_PER_COMMIT,
            })?;
        Ok(self)
    }

    /// Owner committing this transaction.
    pub fn owner(&self) -> Owner {
        self.owner
    }

    /// Number of staged updates.
    pub fn len(&self) -> usize {
        self.updates.len()
    }

    /// Nothing staged.
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    /// Apply all staged updates and publish them as one generation.
    ///
    /// Updates apply in staging order; a later update of the same group
    /// wins. On error nothing is published.
    pub fn commit(self) -> StateResult<Generation> {
        let Self {
            store,
            owner,
            updates,
        } = self;
        store.commit_with(owner, &[], move |data| {
            for update in updates {
                update.apply(data);
            }
            Ok(())
        })
    }
}

impl std::fmt::Debug for Transaction<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("owner", &self.owner)
            .field("updates", &self.updates.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{AttitudeFeedback, MotorOutput, SystemStatus, TimeData};
    use crate::ownership::GroupId;
    use antenna::state::{Axis, MotorId};

    #[test]
    fn staged_groups_commit_as_one_generation() {
        let store = StateStore::default();
        let before = store.read_snapshot().generation();

        let mut tx = store.transaction(Owner::ControlLoop);
        tx.stage(GroupUpdate::SystemStatus(SystemStatus {
            arm_status: true,
            ..Default::default()
        }))
        .unwrap()
        .stage(GroupUpdate::MotorOutput(
            MotorId::ElevationMaster,
            MotorOutput {
                primary: 0.25,
                secondary: 0.0,
            },
        ))
        .unwrap()
        .stage(GroupUpdate::AttitudeFeedback(
            Axis::Elevation,
            AttitudeFeedback {
                angle: 12.5,
                rate: 0.1,
            },
        ))
        .unwrap();
        assert_eq!(tx.len(), 3);
        let generation = tx.commit().unwrap();

        assert_eq!(generation, before.next());
        let snap = store.read_snapshot();
        assert!(snap.system.status.arm_status);
        assert_eq!(snap.motors[MotorId::ElevationMaster].output.primary, 0.25);
        assert_eq!(snap.attitude.elevation.angle, 12.5);
    }

    #[test]
    fn foreign_group_rejected_at_stage() {
        let store = StateStore::default();
        let mut tx = store.transaction(Owner::Fieldbus);
        let err = tx
            .stage(GroupUpdate::Time(TimeData::default()))
            .unwrap_err();
        assert!(matches!(
            err,
            StateError::PermissionDenied {
                group: GroupId::Time,
                ..
            }
        ));
        assert!(tx.is_empty());
    }

    #[test]
    fn capacity_is_bounded() {
        let store = StateStore::default();
        let mut tx = store.transaction(Owner::ControlLoop);
        for i in 0..MAX_UPDATES_PER_COMMIT {
            tx.stage(GroupUpdate::Time(TimeData {
                timestamp_us: i as u64,
                loop_duration_us: 0,
            }))
            .unwrap();
        }
        assert!(matches!(
            tx.stage(GroupUpdate::Time(TimeData::default())),
            Err(StateError::TransactionFull { .. })
        ));
    }

    #[test]
    fn rejected_commit_publishes_nothing() {
        let store = StateStore::default();
        let before = store.read_snapshot();
        let mut tx = store.transaction(Owner::ControlLoop);
        tx.stage(GroupUpdate::Time(TimeData {
            timestamp_us: 99,
            loop_duration_us: 1,
        }))
        .unwrap()
        .stage(GroupUpdate::MotorOutput(
            MotorId::AzimuthSlave,
            MotorOutput {
                primary: 1.0,
                secondary: 0.0,
            },
        ))
        .unwrap();
        assert!(tx.commit().is_err());

        let after = store.read_snapshot();
        assert_eq!(after.generation(), before.generation());
        assert_eq!(after.time.timestamp_us, 0);
    }
}
