//! Committed, immutable generations of the aggregate record.

use crate::data::VarData;
use crate::ownership::Owner;
use std::fmt;
use std::ops::Deref;
use std::time::{Duration, Instant};

/// Monotonic commit counter. Generation 0 is the power-on record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(pub u64);

impl Generation {
    /// Following generation.
    #[inline]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One committed state of the store.
///
/// Published as a whole; a reader holding a snapshot never sees a later
/// commit mixed into it.
#[derive(Debug, Clone)]
pub struct Snapshot {
    generation: Generation,
    owner_generations: [Generation; Owner::COUNT],
    owner_committed_at: [Option<Instant>; Owner::COUNT],
    committed_by: Option<Owner>,
    data: VarData,
}

impl Snapshot {
    /// Power-on snapshot.
    pub(crate) fn initial() -> Self {
        Self {
            generation: Generation::default(),
            owner_generations: [Generation::default(); Owner::COUNT],
            owner_committed_at: [None; Owner::COUNT],
            committed_by: None,
            data: VarData::default(),
        }
    }

    /// Successor of `self` committed by `owner`. `also` lists owners whose
    /// fields were changed on their behalf (safety overrides).
    pub(crate) fn successor(&self, owner: Owner, also: &[Owner], data: VarData) -> Self {
        let now = Instant::now();
        let mut owner_generations = self.owner_generations;
        let mut owner_committed_at = self.owner_committed_at;
        for o in std::iter::once(owner).chain(also.iter().copied()) {
            owner_generations[o.index()] = owner_generations[o.index()].next();
            owner_committed_at[o.index()] = Some(now);
        }
        Self {
            generation: self.generation.next(),
            owner_generations,
            owner_committed_at,
            committed_by: Some(owner),
            data,
        }
    }

    /// Global commit counter of this snapshot.
    #[inline]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Number of commits that changed fields of `owner`.
    #[inline]
    pub fn owner_generation(&self, owner: Owner) -> Generation {
        self.owner_generations[owner.index()]
    }

    /// Who committed this snapshot. `None` for the power-on record.
    #[inline]
    pub fn committed_by(&self) -> Option<Owner> {
        self.committed_by
    }

    /// When `owner` last committed, if ever.
    #[inline]
    pub fn committed_at(&self, owner: Owner) -> Option<Instant> {
        self.owner_committed_at[owner.index()]
    }

    /// `owner` committed within `bound` before `now`.
    pub fn is_fresh(&self, owner: Owner, bound: Duration, now: Instant) -> bool {
        self.committed_at(owner)
            .is_some_and(|at| now.saturating_duration_since(at) <= bound)
    }

    /// The aggregate record.
    #[inline]
    pub fn data(&self) -> &VarData {
        &self.data
    }
}

impl Deref for Snapshot {
    type Target = VarData;

    fn deref(&self) -> &VarData {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_snapshot_has_no_commits() {
        let snap = Snapshot::initial();
        assert_eq!(snap.generation(), Generation(0));
        assert_eq!(snap.committed_by(), None);
        for owner in Owner::ALL {
            assert_eq!(snap.owner_generation(owner), Generation(0));
            assert!(!snap.is_fresh(owner, Duration::from_secs(1), Instant::now()));
        }
    }

    #[test]
    fn successor_advances_only_named_owners() {
        let snap = Snapshot::initial();
        let next = snap.successor(Owner::Fieldbus, &[Owner::ControlLoop], VarData::default());
        assert_eq!(next.generation(), Generation(1));
        assert_eq!(next.owner_generation(Owner::Fieldbus), Generation(1));
        assert_eq!(next.owner_generation(Owner::ControlLoop), Generation(1));
        assert_eq!(next.owner_generation(Owner::Gps), Generation(0));
        assert_eq!(next.committed_by(), Some(Owner::Fieldbus));
    }

    #[test]
    fn freshness_uses_bound() {
        let snap = Snapshot::initial().successor(Owner::Fieldbus, &[], VarData::default());
        let at = snap.committed_at(Owner::Fieldbus).unwrap();
        let bound = Duration::from_millis(4);
        assert!(snap.is_fresh(Owner::Fieldbus, bound, at + Duration::from_millis(3)));
        assert!(!snap.is_fresh(Owner::Fieldbus, bound, at + Duration::from_millis(5)));
    }
}
