//! Sandbox Market
//!
//! An in-memory stand-in for one market contract, implementing every ledger
//! interface. Backs the CLI (loaded from a JSON [`Snapshot`]) and the tests.

mod ledger;
mod snapshot;

pub use ledger::{SandboxLedger, SandboxOffer};
pub use snapshot::{Snapshot, SnapshotError, SnapshotOrder};
