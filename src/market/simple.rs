//! Client for the base order market contract.

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::intent;
use crate::error::{MarketError, MarketResult};
use crate::events::{BumpEvent, EventFeed, KillEvent, MakeEvent, TakeEvent};
use crate::ledger::{AbiValue, LedgerConnection, PendingTransaction, TransactionIntent};
use crate::orders::{Order, OrderLookup, OrderRepository};
use crate::types::{Address, Wad};

/// Client for a `SimpleMarket` contract: an on-chain OTC market where
/// makers escrow tokens in orders and takers fill them.
///
/// This is the capability set the expiring and matching variants build on.
pub struct SimpleMarket {
    address: Address,
    ledger: LedgerConnection,
    orders: OrderRepository,
    events: EventFeed,
}

impl SimpleMarket {
    pub fn new(address: Address, ledger: LedgerConnection) -> Self {
        let orders = OrderRepository::new(address, ledger.query.clone());
        let events = EventFeed::new(address, ledger.events.clone());
        Self {
            address,
            ledger,
            orders,
            events,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Order repository for this market (holds the absent-id cache).
    pub fn orders(&self) -> &OrderRepository {
        &self.orders
    }

    /// Event feed for this market.
    pub fn events(&self) -> &EventFeed {
        &self.events
    }

    // --- Queries ---

    pub async fn get_last_order_id(&self) -> MarketResult<u64> {
        self.orders.get_last_order_id().await
    }

    pub async fn get_order(&self, order_id: u64) -> MarketResult<OrderLookup> {
        self.orders.get_order(order_id).await
    }

    pub async fn get_orders(&self) -> MarketResult<Vec<Order>> {
        self.orders.get_orders().await
    }

    /// Raw read-only call against this market.
    pub(crate) async fn query(&self, method: &str, args: &[AbiValue]) -> MarketResult<Vec<AbiValue>> {
        debug!(market = %self.address, method, "Querying market");
        self.ledger
            .query
            .call(self.address, method, args)
            .await
            .map_err(MarketError::ExternalQueryFailed)
    }

    // --- Commands ---

    /// Create an order selling `pay_amount` of `pay_token` for `buy_amount`
    /// of `buy_token`.
    ///
    /// The pay tokens are escrowed by the contract, so an allowance must be
    /// in place first (see [`super::approve`]). Use
    /// [`crate::ledger::TransactionReceipt::created_order_id`] on the outcome
    /// to learn the new order's id.
    pub async fn make(
        &self,
        pay_token: Address,
        pay_amount: Wad,
        buy_token: Address,
        buy_amount: Wad,
    ) -> MarketResult<PendingTransaction> {
        let intent = intent::make(self.address, pay_token, pay_amount, buy_token, buy_amount)?;
        self.submit(intent).await
    }

    /// Bump an order, emitting a `LogBump` that makes it reappear for
    /// front-ends relying on events.
    pub async fn bump(&self, order_id: u64) -> MarketResult<PendingTransaction> {
        self.submit(intent::bump(self.address, order_id)).await
    }

    /// Take (buy) `quantity` of an order's pay token.
    ///
    /// Taking the full remaining `pay_amount` closes the order; a smaller
    /// quantity leaves it open with reduced amounts.
    pub async fn take(&self, order_id: u64, quantity: Wad) -> MarketResult<PendingTransaction> {
        self.submit(intent::take(self.address, order_id, quantity)).await
    }

    /// Cancel an order.
    ///
    /// Only the maker may cancel, except on an expired market where anyone
    /// can. The contract enforces this, not the client.
    pub async fn kill(&self, order_id: u64) -> MarketResult<PendingTransaction> {
        self.submit(intent::kill(self.address, order_id)).await
    }

    /// Hand an intent to the submission interface.
    pub(crate) async fn submit(&self, intent: TransactionIntent) -> MarketResult<PendingTransaction> {
        let method = intent.method;
        match self.ledger.submitter.submit(intent).await {
            Ok(pending) => {
                info!(
                    market = %self.address,
                    method,
                    tx = %pending.transaction_hash,
                    "Transaction submitted"
                );
                Ok(pending)
            }
            Err(e) => {
                warn!(market = %self.address, method, error = %e, "Transaction submission failed");
                Err(MarketError::SubmissionFailed(e))
            }
        }
    }

    // --- Events ---

    pub async fn past_make(&self, number_of_past_blocks: u64) -> MarketResult<Vec<MarketResult<MakeEvent>>> {
        self.events.past::<MakeEvent>(number_of_past_blocks).await
    }

    pub async fn past_bump(&self, number_of_past_blocks: u64) -> MarketResult<Vec<MarketResult<BumpEvent>>> {
        self.events.past::<BumpEvent>(number_of_past_blocks).await
    }

    pub async fn past_take(&self, number_of_past_blocks: u64) -> MarketResult<Vec<MarketResult<TakeEvent>>> {
        self.events.past::<TakeEvent>(number_of_past_blocks).await
    }

    pub async fn past_kill(&self, number_of_past_blocks: u64) -> MarketResult<Vec<MarketResult<KillEvent>>> {
        self.events.past::<KillEvent>(number_of_past_blocks).await
    }

    /// Call `handler` for every order created from now on.
    pub async fn on_make<F>(&self, handler: F) -> MarketResult<JoinHandle<()>>
    where
        F: FnMut(MarketResult<MakeEvent>) + Send + 'static,
    {
        self.events.subscribe::<MakeEvent, F>(handler).await
    }

    /// Call `handler` for every bump from now on.
    pub async fn on_bump<F>(&self, handler: F) -> MarketResult<JoinHandle<()>>
    where
        F: FnMut(MarketResult<BumpEvent>) + Send + 'static,
    {
        self.events.subscribe::<BumpEvent, F>(handler).await
    }

    /// Call `handler` for every take from now on.
    pub async fn on_take<F>(&self, handler: F) -> MarketResult<JoinHandle<()>>
    where
        F: FnMut(MarketResult<TakeEvent>) + Send + 'static,
    {
        self.events.subscribe::<TakeEvent, F>(handler).await
    }

    /// Call `handler` for every cancellation from now on.
    pub async fn on_kill<F>(&self, handler: F) -> MarketResult<JoinHandle<()>>
    where
        F: FnMut(MarketResult<KillEvent>) + Send + 'static,
    {
        self.events.subscribe::<KillEvent, F>(handler).await
    }
}

impl std::fmt::Display for SimpleMarket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SimpleMarket('{}')", self.address)
    }
}

impl std::fmt::Debug for SimpleMarket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimpleMarket")
            .field("address", &self.address)
            .field("orders", &self.orders)
            .finish()
    }
}
