//! Consume-once operator commands.
//!
//! Commands are bits in a single `AtomicU32`. Issuing is `fetch_or`,
//! consuming is `fetch_and`; both are wait-free. Issuing a command twice
//! before it is consumed has the same effect as issuing it once.

use crate::ownership::Owner;
use bitflags::bitflags;
use std::sync::atomic::{AtomicU32, Ordering};

bitflags! {
    /// Pending operator commands.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CommandFlags: u32 {
        /// Release a latched fatal error.
        const CLEAR_ERROR    = 1 << 0;
        /// Persist configuration parameters.
        const SAVE_PARAMS    = 1 << 1;
        /// Load persisted parameters.
        const LOAD_PARAMS    = 1 << 2;
        /// Restore default parameters.
        const RESET_DEFAULTS = 1 << 3;
        /// Enable motion.
        const ARM            = 1 << 4;
        /// Disable motion.
        const DISARM         = 1 << 5;
        /// Calibration samples are queued.
        const ADD_SAMPLE     = 1 << 6;
        /// Calibration buffer reset is queued.
        const RESET_SAMPLES  = 1 << 7;
    }
}

impl Default for CommandFlags {
    fn default() -> Self {
        Self::empty()
    }
}

impl CommandFlags {
    /// Commands consumed by the control loop.
    pub const CONTROL_LOOP: Self = Self::from_bits_truncate(
        Self::CLEAR_ERROR.bits() | Self::ARM.bits() | Self::DISARM.bits(),
    );

    /// Commands consumed by the calibration engine.
    pub const CALIBRATION: Self =
        Self::from_bits_truncate(Self::ADD_SAMPLE.bits() | Self::RESET_SAMPLES.bits());

    /// Commands consumed by the persistence collaborator.
    pub const PERSISTENCE: Self = Self::from_bits_truncate(
        Self::SAVE_PARAMS.bits() | Self::LOAD_PARAMS.bits() | Self::RESET_DEFAULTS.bits(),
    );

    /// Commands `owner` may consume.
    pub const fn consumable_by(owner: Owner) -> Self {
        match owner {
            Owner::ControlLoop => Self::CONTROL_LOOP,
            Owner::Calibration => Self::CALIBRATION,
            Owner::Persistence => Self::PERSISTENCE,
            _ => Self::empty(),
        }
    }

    /// Commands `owner` may issue.
    pub const fn issuable_by(owner: Owner) -> Self {
        if owner.is_operator() {
            Self::all()
        } else {
            Self::empty()
        }
    }
}

/// Lock-free board of pending commands.
#[derive(Debug, Default)]
pub struct CommandBoard {
    pending: AtomicU32,
}

impl CommandBoard {
    /// Empty board.
    pub const fn new() -> Self {
        Self {
            pending: AtomicU32::new(0),
        }
    }

    /// Mark `flags` pending.
    #[inline]
    pub fn raise(&self, flags: CommandFlags) {
        self.pending.fetch_or(flags.bits(), Ordering::AcqRel);
    }

    /// Clear `flags` and return the subset that was pending.
    #[inline]
    pub fn take(&self, flags: CommandFlags) -> CommandFlags {
        let prior = self.pending.fetch_and(!flags.bits(), Ordering::AcqRel);
        CommandFlags::from_bits_truncate(prior) & flags
    }

    /// Currently pending commands.
    #[inline]
    pub fn pending(&self) -> CommandFlags {
        CommandFlags::from_bits_truncate(self.pending.load(Ordering::Acquire))
    }
}
