//! JSON description of a sandbox market.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::info;

use super::ledger::{SandboxLedger, SandboxOffer};
use crate::market::MarketKind;
use crate::types::{Address, Wad};

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Failed to read snapshot: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Order {id}: invalid {field} '{value}'")]
    InvalidAmount {
        id: u64,
        field: &'static str,
        value: String,
    },

    #[error("Order id {0} appears more than once")]
    DuplicateOrder(u64),

    #[error("Order id 0 is reserved")]
    ZeroOrderId,
}

/// One live order in a snapshot. Amounts are decimal strings (`"1.5"`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotOrder {
    pub id: u64,
    pub owner: Address,
    pub pay_token: Address,
    pub pay_amount: String,
    pub buy_token: Address,
    pub buy_amount: String,
    #[serde(default)]
    pub timestamp: u64,
}

/// A market's state at a point in time.
///
/// ```json
/// {
///   "address": "0x00000000000000000000000000000000000000ee",
///   "kind": "matching",
///   "orders": [
///     { "id": 1, "owner": "0x…", "pay_token": "0x…", "pay_amount": "10",
///       "buy_token": "0x…", "buy_amount": "2.5" }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub address: Address,
    pub kind: MarketKind,
    /// Account the sandbox sends transactions from
    #[serde(default)]
    pub sender: Address,
    /// Highest id ever issued; defaults to the highest order id
    #[serde(default)]
    pub last_offer_id: u64,
    #[serde(default)]
    pub orders: Vec<SnapshotOrder>,
    /// Contract clock, unix seconds; the current time when absent
    #[serde(default)]
    pub now: Option<u64>,
    #[serde(default)]
    pub close_time: Option<u64>,
    #[serde(default = "enabled")]
    pub buy_enabled: bool,
    #[serde(default = "enabled")]
    pub matching_enabled: bool,
    #[serde(default)]
    pub whitelist: Vec<(Address, Address)>,
}

fn enabled() -> bool {
    true
}

fn parse_amount(id: u64, field: &'static str, value: &str) -> Result<Wad, SnapshotError> {
    value.parse::<Wad>().map_err(|_| SnapshotError::InvalidAmount {
        id,
        field,
        value: value.to_string(),
    })
}

impl Snapshot {
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let snapshot = Self::from_json(&json)?;
        info!(
            path = %path.as_ref().display(),
            market = %snapshot.address,
            kind = %snapshot.kind,
            orders = snapshot.orders.len(),
            "Loaded market snapshot"
        );
        Ok(snapshot)
    }

    /// Build a sandbox holding this market's state.
    pub fn into_ledger(self) -> Result<SandboxLedger, SnapshotError> {
        let ledger = SandboxLedger::new(self.address, self.kind, self.sender);
        if let Some(now) = self.now {
            ledger.set_time(now);
        }
        if let Some(close_time) = self.close_time {
            ledger.set_close_time(close_time);
        }
        ledger.set_flags(self.buy_enabled, self.matching_enabled);
        for (base, quote) in &self.whitelist {
            ledger.whitelist_pair(*base, *quote);
        }

        let mut seen = std::collections::BTreeSet::new();
        for order in &self.orders {
            if order.id == 0 {
                return Err(SnapshotError::ZeroOrderId);
            }
            if !seen.insert(order.id) {
                return Err(SnapshotError::DuplicateOrder(order.id));
            }
            let pay_amount = parse_amount(order.id, "pay_amount", &order.pay_amount)?;
            let buy_amount = parse_amount(order.id, "buy_amount", &order.buy_amount)?;
            if pay_amount.is_zero() || buy_amount.is_zero() {
                let (field, value) = if pay_amount.is_zero() {
                    ("pay_amount", &order.pay_amount)
                } else {
                    ("buy_amount", &order.buy_amount)
                };
                return Err(SnapshotError::InvalidAmount {
                    id: order.id,
                    field,
                    value: value.clone(),
                });
            }
            ledger.insert_order_at(
                order.id,
                SandboxOffer {
                    owner: order.owner,
                    pay_token: order.pay_token,
                    pay_amount,
                    buy_token: order.buy_token,
                    buy_amount,
                    timestamp: order.timestamp,
                },
            );
        }
        ledger.reserve_ids(self.last_offer_id);
        Ok(ledger)
    }
}
