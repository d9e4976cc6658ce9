//! System-wide constants for the antenna tracker workspace.
//!
//! Single source of truth for numeric limits and default paths.

use static_assertions::const_assert;

/// Default control loop period in microseconds (1 kHz).
pub const DEFAULT_CONTROL_CYCLE_US: u64 = 1000;

/// Default fieldbus I/O cycle period in microseconds (250 Hz).
///
/// Cross-owner reads (e.g. limit switches seen by the control loop) are
/// stale by at most one fieldbus cycle.
pub const DEFAULT_FIELDBUS_CYCLE_US: u64 = 4000;

/// Default bounded wait for the store commit lock, in microseconds.
pub const DEFAULT_WRITE_LOCK_TIMEOUT_US: u64 = 250;

/// Capacity of the calibration sample buffer held in the state store.
pub const MAX_CALIBRATION_SAMPLES: usize = 64;

/// Default capacity of the pending calibration input queue.
pub const DEFAULT_CALIBRATION_QUEUE_CAPACITY: usize = 16;

/// Maximum number of group updates committed as a single generation.
pub const MAX_UPDATES_PER_COMMIT: usize = 16;

/// Capacity (bytes) of alarm and error messages.
pub const MESSAGE_CAPACITY: usize = 96;

/// Capacity (bytes) of the system identification string.
pub const SYSTEM_ID_CAPACITY: usize = 32;

/// Capacity (bytes) of the admin credential.
pub const CREDENTIAL_CAPACITY: usize = 32;

/// Default persisted parameter file path.
pub const DEFAULT_PARAMETER_FILE: &str = "/var/lib/antenna-tracker/parameters.toml";

const_assert!(DEFAULT_CALIBRATION_QUEUE_CAPACITY <= MAX_CALIBRATION_SAMPLES);
const_assert!(MAX_CALIBRATION_SAMPLES <= u32::MAX as usize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_are_consistent() {
        assert!(DEFAULT_CONTROL_CYCLE_US > 0);
        assert!(DEFAULT_FIELDBUS_CYCLE_US >= DEFAULT_CONTROL_CYCLE_US);
        assert!(DEFAULT_WRITE_LOCK_TIMEOUT_US < DEFAULT_CONTROL_CYCLE_US);
        assert!(MAX_UPDATES_PER_COMMIT > 0);
    }

    #[test]
    fn package_metadata_is_set() {
        assert_eq!(env!("CARGO_PKG_AUTHORS"), "RTS007");
        assert_eq!(env!("CARGO_PKG_LICENSE"), "AGPL3");
    }

    #[test]
    fn text_capacities_fit_messages() {
        assert!(MESSAGE_CAPACITY >= "azimuth positive main limit switch touched".len());
        assert!(SYSTEM_ID_CAPACITY > 0 && CREDENTIAL_CAPACITY > 0);
    }
}
