//! Per-consumer snapshot reader.

use crate::snapshot::{Generation, Snapshot};
use crate::store::StateStore;
use crate::view::TelemetryView;
use std::sync::Arc;

/// Reader handle for one consumer (HMI refresh, REST handler, logger).
///
/// Tracks the last generation it returned so a polling consumer can skip
/// work when nothing was committed.
#[derive(Debug, Clone)]
pub struct SnapshotReader {
    store: Arc<StateStore>,
    last_seen: Generation,
}

impl SnapshotReader {
    pub(crate) fn new(store: Arc<StateStore>) -> Self {
        Self {
            store,
            last_seen: Generation::default(),
        }
    }

    /// Latest snapshot; marks its generation as seen.
    pub fn latest(&mut self) -> Arc<Snapshot> {
        let snapshot = self.store.read_snapshot();
        self.last_seen = snapshot.generation();
        snapshot
    }

    /// Latest snapshot only if it is newer than the last one returned.
    pub fn latest_if_changed(&mut self) -> Option<Arc<Snapshot>> {
        let snapshot = self.store.read_snapshot();
        if snapshot.generation() == self.last_seen {
            return None;
        }
        self.last_seen = snapshot.generation();
        Some(snapshot)
    }

    /// A commit happened since the last read.
    pub fn has_changed(&self) -> bool {
        self.store.read_snapshot().generation() != self.last_seen
    }

    /// Last generation returned by this reader.
    pub fn generation(&self) -> Generation {
        self.last_seen
    }

    /// Telemetry projection of the latest snapshot.
    pub fn view(&mut self) -> TelemetryView {
        let snapshot = self.latest();
        TelemetryView::project(&snapshot, self.store.pending_commands())
    }
}

#[cfg(test)]
mod tests {
    use crate::data::TimeData;
    use crate::ownership::{GroupUpdate, Owner};
    use crate::store::StateStore;
    use std::sync::Arc;

    #[test]
    fn change_detection() {
        let store = Arc::new(StateStore::default());
        let mut reader = store.reader();
        assert!(!reader.has_changed());

        store
            .write_group(Owner::ControlLoop, GroupUpdate::Time(TimeData::default()))
            .unwrap();
        assert!(reader.has_changed());

        let snap = reader.latest_if_changed().unwrap();
        assert_eq!(reader.generation(), snap.generation());
        assert!(!reader.has_changed());
        assert!(reader.latest_if_changed().is_none());
    }

    #[test]
    fn held_snapshot_is_not_affected_by_later_commits() {
        let store = Arc::new(StateStore::default());
        let mut reader = store.reader();
        let held = reader.latest();

        store
            .write_group(
                Owner::ControlLoop,
                GroupUpdate::Time(TimeData {
                    timestamp_us: 42,
                    loop_duration_us: 1,
                }),
            )
            .unwrap();
        assert_eq!(held.time.timestamp_us, 0);
        assert_eq!(reader.latest().time.timestamp_us, 42);
    }
}
