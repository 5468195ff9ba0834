//! Order repository reading active orders from a market contract.
//!
//! Maintains a per-instance cache of order ids known to be gone so they are
//! never queried twice.

use dashmap::DashSet;
use std::sync::Arc;
use tracing::{debug, trace};

use super::types::{Order, OrderLookup};
use crate::error::{MarketError, MarketResult};
use crate::ledger::{AbiValue, LedgerError, LedgerQuery, ResponseReader};
use crate::types::Address;

/// Read-side view of one market contract's order slots.
///
/// # Thread Safety
///
/// The absent-id cache is a `DashSet`, so one repository can be shared
/// (e.g. behind an `Arc`) by concurrent callers. Two callers racing on the
/// same id may both query the ledger; both then record the same absence.
///
/// # Cost
///
/// `get_orders()` issues one query per id ever created on the market, minus
/// ids already cached as absent.
pub struct OrderRepository {
    market: Address,
    ledger: Arc<dyn LedgerQuery>,
    /// Ids whose slot reported inactive. Ids never recycle, so entries never expire.
    absent: DashSet<u64>,
}

impl OrderRepository {
    pub fn new(market: Address, ledger: Arc<dyn LedgerQuery>) -> Self {
        Self {
            market,
            ledger,
            absent: DashSet::new(),
        }
    }

    /// Market contract this repository reads.
    pub fn market(&self) -> Address {
        self.market
    }

    /// Id of the last order created on the market, `0` if none yet.
    pub async fn get_last_order_id(&self) -> MarketResult<u64> {
        let output = self
            .ledger
            .call(self.market, "last_offer_id", &[])
            .await
            .map_err(MarketError::ExternalQueryFailed)?;
        ResponseReader::new("last_offer_id", &output)
            .u64(0)
            .map_err(MarketError::ExternalQueryFailed)
    }

    /// Look up one order.
    ///
    /// Returns `Absent` for ids that were taken, cancelled or never created.
    /// Absence is cached for the lifetime of this repository.
    pub async fn get_order(&self, order_id: u64) -> MarketResult<OrderLookup> {
        if self.absent.contains(&order_id) {
            trace!(market = %self.market, order_id, "Order cached as absent");
            return Ok(OrderLookup::Absent);
        }

        let output = self
            .ledger
            .call(self.market, "offers", &[AbiValue::uint(order_id)])
            .await
            .map_err(MarketError::ExternalQueryFailed)?;

        // offers(id) -> (pay_amt, pay_gem, buy_amt, buy_gem, owner, active, timestamp)
        let reader = ResponseReader::new("offers", &output);
        let active = reader.boolean(5).map_err(MarketError::ExternalQueryFailed)?;
        if !active {
            self.absent.insert(order_id);
            debug!(market = %self.market, order_id, "Order inactive, caching as absent");
            return Ok(OrderLookup::Absent);
        }

        let order = Self::decode_order(self.market, order_id, &reader)
            .map_err(MarketError::ExternalQueryFailed)?;
        Ok(OrderLookup::Present(order))
    }

    /// All active orders, in ascending id order.
    pub async fn get_orders(&self) -> MarketResult<Vec<Order>> {
        let last_id = self.get_last_order_id().await?;
        let mut orders = Vec::new();
        for order_id in 1..=last_id {
            if let OrderLookup::Present(order) = self.get_order(order_id).await? {
                orders.push(order);
            }
        }
        debug!(
            market = %self.market,
            last_id,
            active = orders.len(),
            "Fetched active orders"
        );
        Ok(orders)
    }

    /// Number of ids currently cached as absent.
    pub fn absent_count(&self) -> usize {
        self.absent.len()
    }

    fn decode_order(
        market: Address,
        order_id: u64,
        reader: &ResponseReader<'_>,
    ) -> Result<Order, LedgerError> {
        let buy_amount = reader.wad(2)?;
        if buy_amount.is_zero() {
            return Err(LedgerError::Decode(format!(
                "offers: active order {} has zero buy amount",
                order_id
            )));
        }
        Ok(Order {
            market,
            order_id,
            maker: reader.address(4)?,
            pay_token: reader.address(1)?,
            pay_amount: reader.wad(0)?,
            buy_token: reader.address(3)?,
            buy_amount,
            timestamp: reader.u64(6)?,
        })
    }
}

impl std::fmt::Debug for OrderRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderRepository")
            .field("market", &self.market)
            .field("absent", &self.absent.len())
            .finish()
    }
}
