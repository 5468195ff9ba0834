//! Client for the matching market contract.

use tracing::debug;

use super::expiring::ExpiringMarket;
use super::intent;
use super::position::{estimate_position, order_price};
use super::simple::SimpleMarket;
use crate::error::{MarketError, MarketResult};
use crate::ledger::{LedgerConnection, PendingTransaction, ResponseReader};
use crate::types::{Address, Wad};

/// Client for a `MatchingMarket` contract.
///
/// On top of the expiring market, the contract keeps each token pair's
/// orders in a price-sorted linked list and matches crossing orders on
/// creation. Matching itself happens on-chain; this client only supplies
/// the insertion hint.
pub struct MatchingMarket {
    expiring: ExpiringMarket,
}

impl MatchingMarket {
    pub fn new(address: Address, ledger: LedgerConnection) -> Self {
        Self {
            expiring: ExpiringMarket::new(address, ledger),
        }
    }

    /// Close-time queries.
    pub fn expiring(&self) -> &ExpiringMarket {
        &self.expiring
    }

    /// The underlying order market capability.
    pub fn base(&self) -> &SimpleMarket {
        self.expiring.base()
    }

    async fn flag(&self, method: &str) -> MarketResult<bool> {
        let output = self.base().query(method, &[]).await?;
        ResponseReader::new(method, &output)
            .boolean(0)
            .map_err(MarketError::ExternalQueryFailed)
    }

    /// Whether direct buy is enabled.
    pub async fn is_buy_enabled(&self) -> MarketResult<bool> {
        self.flag("buyEnabled").await
    }

    pub async fn set_buy_enabled(&self, enabled: bool) -> MarketResult<PendingTransaction> {
        let base = self.base();
        base.submit(intent::set_buy_enabled(base.address(), enabled)).await
    }

    /// Whether automatic order matching is enabled.
    pub async fn is_matching_enabled(&self) -> MarketResult<bool> {
        self.flag("matchingEnabled").await
    }

    pub async fn set_matching_enabled(&self, enabled: bool) -> MarketResult<PendingTransaction> {
        let base = self.base();
        base.submit(intent::set_matching_enabled(base.address(), enabled)).await
    }

    /// Whitelist a token pair. New orders are checked against the whitelist.
    pub async fn add_token_pair_whitelist(
        &self,
        base_token: Address,
        quote_token: Address,
    ) -> MarketResult<PendingTransaction> {
        let base = self.base();
        base.submit(intent::add_token_pair_whitelist(base.address(), base_token, quote_token))
            .await
    }

    /// Insertion hint for a new order, see [`estimate_position`].
    ///
    /// Reads every active order on the market.
    pub async fn position(
        &self,
        pay_token: Address,
        pay_amount: Wad,
        buy_token: Address,
        buy_amount: Wad,
    ) -> MarketResult<u64> {
        let price = order_price(pay_amount, buy_amount)?;
        let orders = self.base().get_orders().await?;
        let position = estimate_position(&orders, pay_token, buy_token, price);
        debug!(
            market = %self.base().address(),
            %pay_token,
            %buy_token,
            %price,
            candidates = orders.len(),
            position,
            "Estimated insertion position"
        );
        Ok(position)
    }

    /// Create an order with an explicit or estimated insertion hint.
    ///
    /// `None` estimates the hint from the current order book; `Some(0)` lets
    /// the contract search, which always works but costs the most gas.
    pub async fn make_with_position(
        &self,
        pay_token: Address,
        pay_amount: Wad,
        buy_token: Address,
        buy_amount: Wad,
        position: Option<u64>,
    ) -> MarketResult<PendingTransaction> {
        let base = self.base();
        // Validate before spending queries on the estimate.
        intent::validate_amounts(pay_amount, buy_amount)?;
        let position = match position {
            Some(pos) => pos,
            None => self.position(pay_token, pay_amount, buy_token, buy_amount).await?,
        };
        let intent = intent::offer(base.address(), pay_token, pay_amount, buy_token, buy_amount, position)?;
        base.submit(intent).await
    }
}

impl std::fmt::Display for MatchingMarket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MatchingMarket('{}')", self.base().address())
    }
}

impl std::fmt::Debug for MatchingMarket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchingMarket")
            .field("expiring", &self.expiring)
            .finish()
    }
}
