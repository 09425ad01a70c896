#![warn(clippy::uninlined_format_args)]

pub mod snapshot_ledger;

pub use snapshot_ledger::{MemberNames, SnapshotError, SnapshotLedger, TripRecord, TripSnapshot};
