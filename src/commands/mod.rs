//! CLI command handlers.
//!
//! Each subcommand runs against a market client backed by a sandbox
//! loaded from the configured snapshot.

mod last_id;
mod orders;
mod position;

pub use last_id::run_last_id;
pub use orders::run_orders;
pub use position::run_position;

use std::sync::Arc;

use crate::cli::AppConfig;
use crate::ledger::LedgerConnection;
use crate::market::{self, Market};
use crate::sandbox::{SandboxLedger, Snapshot};

/// Load the configured snapshot and connect a client of the matching kind.
pub(crate) fn open_market(
    config: &AppConfig,
) -> Result<(Arc<SandboxLedger>, Box<dyn Market>), Box<dyn std::error::Error>> {
    let snapshot = Snapshot::load(&config.snapshot)?;
    let kind = snapshot.kind;
    let ledger = Arc::new(snapshot.into_ledger()?);
    let client = market::connect(kind, ledger.market(), LedgerConnection::shared(ledger.clone()));
    Ok((ledger, client))
}
