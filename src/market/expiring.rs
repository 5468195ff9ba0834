//! Client for the expiring market contract.

use chrono::{DateTime, Utc};

use super::simple::SimpleMarket;
use crate::error::{MarketError, MarketResult};
use crate::ledger::{LedgerConnection, ResponseReader};
use crate::types::Address;

/// Client for an `ExpiringMarket` contract: a simple market with a close
/// time, after which no new orders are accepted and anyone may cancel.
pub struct ExpiringMarket {
    base: SimpleMarket,
}

impl ExpiringMarket {
    pub fn new(address: Address, ledger: LedgerConnection) -> Self {
        Self {
            base: SimpleMarket::new(address, ledger),
        }
    }

    /// The underlying order market capability.
    pub fn base(&self) -> &SimpleMarket {
        &self.base
    }

    /// Close time as unix seconds.
    pub async fn get_close_time(&self) -> MarketResult<u64> {
        let output = self.base.query("close_time", &[]).await?;
        ResponseReader::new("close_time", &output)
            .u64(0)
            .map_err(MarketError::ExternalQueryFailed)
    }

    /// Close time as a UTC datetime, `None` if not representable.
    pub async fn close_time(&self) -> MarketResult<Option<DateTime<Utc>>> {
        let secs = self.get_close_time().await?;
        Ok(i64::try_from(secs)
            .ok()
            .and_then(|s| DateTime::from_timestamp(s, 0)))
    }

    /// Whether the contract considers itself closed.
    pub async fn is_closed(&self) -> MarketResult<bool> {
        let output = self.base.query("isClosed", &[]).await?;
        ResponseReader::new("isClosed", &output)
            .boolean(0)
            .map_err(MarketError::ExternalQueryFailed)
    }
}

impl std::fmt::Display for ExpiringMarket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ExpiringMarket('{}')", self.base.address())
    }
}

impl std::fmt::Debug for ExpiringMarket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpiringMarket").field("base", &self.base).finish()
    }
}
