//! # Antenna Tracker State Store
//!
//! The single shared record through which the tracker's subsystems exchange
//! telemetry and commands: the control loop, the fieldbus I/O cycle, the GPS
//! poller, the calibration engine, the HMI and the REST API.
//!
//! ## Guarantees
//!
//! - **Ownership**: every field group has one writer. A write outside the
//!   caller's groups fails with [`StateError::PermissionDenied`] and leaves
//!   the store untouched.
//! - **Atomic generations**: each commit publishes a complete [`Snapshot`].
//!   Readers never take a lock and never observe a half-applied commit.
//! - **Consume-once commands**: operator commands are bits on a lock-free
//!   board; exactly one consumer observes each issue.
//! - **Safety overrides**: emergency stop and main limit switches force the
//!   tracker disarmed with neutral motor outputs on the commit that reports
//!   them.
//!
//! ## Architecture
//!
//! ```text
//!  ControlLoop ─┐                                  ┌─► HMI refresh
//!  Fieldbus ────┤   write_group / transaction      │
//!  GPS ─────────┼──► [commit lock] ─► interlock ───┼─► REST (TelemetryView)
//!  Calibration ─┤                    ArcSwap<Snapshot>
//!  HMI / REST ──┘   issue_command ─► CommandBoard ─┴─► consume_command
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use antenna_state::{GroupUpdate, Owner, StateStore, TimeData};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(StateStore::default());
//! let mut reader = store.reader();
//!
//! store.write_group(
//!     Owner::ControlLoop,
//!     GroupUpdate::Time(TimeData { timestamp_us: 1_000, loop_duration_us: 80 }),
//! )?;
//!
//! if reader.has_changed() {
//!     let snapshot = reader.latest();
//!     assert_eq!(snapshot.time.timestamp_us, 1_000);
//! }
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod command;
pub mod data;
pub mod error;
pub mod interlock;
pub mod ownership;
pub mod persist;
pub mod reader;
pub mod snapshot;
pub mod store;
pub mod view;
pub mod writer;

pub use data::*;

pub use command::{CommandBoard, CommandFlags};
pub use error::{ArmBlock, Invariant, StateError, StateResult};
pub use ownership::{GroupId, GroupUpdate, Owner};
pub use persist::{ParameterStore, PersistentParameters, TomlParameterFile};
pub use reader::SnapshotReader;
pub use snapshot::{Generation, Snapshot};
pub use store::{CalibrationOutcome, StateStore};
pub use view::TelemetryView;
pub use writer::Transaction;

use antenna::config::LogLevel;

/// Initialize tracing.
///
/// `RUST_LOG` takes precedence over `level`. Does nothing if a global
/// subscriber is already installed.
pub fn init_tracing(level: LogLevel, json: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_directive()));

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true);

    let _ = if json {
        builder.json().try_init()
    } else {
        builder.compact().try_init()
    };
}
