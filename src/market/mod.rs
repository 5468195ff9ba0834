//! Market Clients
//!
//! Typed clients for the three OTC market contract variants:
//!
//! - `SimpleMarket` - orders, takes, cancellations and their events
//! - `ExpiringMarket` - adds a close time
//! - `MatchingMarket` - adds matching/buy flags, the pair whitelist and
//!   insertion position estimation for new orders
//!
//! Each variant exposes the shared capability set through the [`Market`]
//! trait, so callers can hold any of them as `Arc<dyn Market>`.

mod expiring;
pub mod intent;
mod matching;
mod position;
mod simple;

pub use expiring::ExpiringMarket;
pub use matching::MatchingMarket;
pub use position::{estimate_position, order_price};
pub use simple::SimpleMarket;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{MarketError, MarketResult};
use crate::ledger::{LedgerConnection, PendingTransaction, TokenApprover};
use crate::orders::{Order, OrderLookup};
use crate::types::{Address, Wad};

/// Contract variant a market client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketKind {
    Simple,
    Expiring,
    Matching,
}

impl std::fmt::Display for MarketKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Simple => write!(f, "simple"),
            Self::Expiring => write!(f, "expiring"),
            Self::Matching => write!(f, "matching"),
        }
    }
}

impl std::str::FromStr for MarketKind {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "simple" => Ok(Self::Simple),
            "expiring" => Ok(Self::Expiring),
            "matching" => Ok(Self::Matching),
            other => Err(MarketError::invalid(format!("unknown market kind: {}", other))),
        }
    }
}

/// Capability set shared by every market variant.
///
/// Everything delegates to the variant's [`SimpleMarket`] except `make`,
/// which a matching market turns into an `offer` with an estimated
/// insertion position.
#[async_trait]
pub trait Market: Send + Sync + std::fmt::Display {
    fn kind(&self) -> MarketKind;

    fn base(&self) -> &SimpleMarket;

    fn address(&self) -> Address {
        self.base().address()
    }

    async fn get_last_order_id(&self) -> MarketResult<u64> {
        self.base().get_last_order_id().await
    }

    async fn get_order(&self, order_id: u64) -> MarketResult<OrderLookup> {
        self.base().get_order(order_id).await
    }

    async fn get_orders(&self) -> MarketResult<Vec<Order>> {
        self.base().get_orders().await
    }

    async fn make(
        &self,
        pay_token: Address,
        pay_amount: Wad,
        buy_token: Address,
        buy_amount: Wad,
    ) -> MarketResult<PendingTransaction> {
        self.base().make(pay_token, pay_amount, buy_token, buy_amount).await
    }

    async fn bump(&self, order_id: u64) -> MarketResult<PendingTransaction> {
        self.base().bump(order_id).await
    }

    async fn take(&self, order_id: u64, quantity: Wad) -> MarketResult<PendingTransaction> {
        self.base().take(order_id, quantity).await
    }

    async fn kill(&self, order_id: u64) -> MarketResult<PendingTransaction> {
        self.base().kill(order_id).await
    }
}

#[async_trait]
impl Market for SimpleMarket {
    fn kind(&self) -> MarketKind {
        MarketKind::Simple
    }

    fn base(&self) -> &SimpleMarket {
        self
    }
}

#[async_trait]
impl Market for ExpiringMarket {
    fn kind(&self) -> MarketKind {
        MarketKind::Expiring
    }

    fn base(&self) -> &SimpleMarket {
        ExpiringMarket::base(self)
    }
}

#[async_trait]
impl Market for MatchingMarket {
    fn kind(&self) -> MarketKind {
        MarketKind::Matching
    }

    fn base(&self) -> &SimpleMarket {
        MatchingMarket::base(self)
    }

    async fn make(
        &self,
        pay_token: Address,
        pay_amount: Wad,
        buy_token: Address,
        buy_amount: Wad,
    ) -> MarketResult<PendingTransaction> {
        self.make_with_position(pay_token, pay_amount, buy_token, buy_amount, None)
            .await
    }
}

/// Build a client for `kind` at `address`.
pub fn connect(kind: MarketKind, address: Address, ledger: LedgerConnection) -> Box<dyn Market> {
    match kind {
        MarketKind::Simple => Box::new(SimpleMarket::new(address, ledger)),
        MarketKind::Expiring => Box::new(ExpiringMarket::new(address, ledger)),
        MarketKind::Matching => Box::new(MatchingMarket::new(address, ledger)),
    }
}

/// Grant `market` an allowance on each of `tokens` through `approver`.
///
/// Stops at the first failure; tokens before it stay approved.
pub async fn approve<M: Market + ?Sized>(
    market: &M,
    tokens: &[Address],
    approver: &dyn TokenApprover,
) -> MarketResult<()> {
    let spender = market.address();
    let spender_name = market.to_string();
    for token in tokens {
        approver
            .approve(*token, spender, &spender_name)
            .await
            .map_err(MarketError::SubmissionFailed)?;
        info!(%token, spender = %spender_name, "Token approved");
    }
    Ok(())
}
