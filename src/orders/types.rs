//! Core order types.
//!
//! Provides the active-order snapshot read from a market contract and the
//! explicit present/absent lookup result.

use alloy_primitives::U256;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

use crate::types::{Address, Wad};

/// An active order on a market contract.
///
/// # Identity
///
/// Two orders are equal iff they come from the same market contract and
/// carry the same id. Amounts are not part of identity: the same order
/// read before and after a partial fill compares equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Market contract this order lives on
    pub market: Address,
    /// Contract-assigned id, never reused within one market
    pub order_id: u64,
    /// Owner of the order
    pub maker: Address,
    /// Token put on sale
    pub pay_token: Address,
    /// Remaining amount of `pay_token` on sale
    pub pay_amount: Wad,
    /// Token the maker wants in return
    pub buy_token: Address,
    /// Amount of `buy_token` wanted for the remaining `pay_amount`, always > 0
    pub buy_amount: Wad,
    /// Creation time, unix seconds
    pub timestamp: u64,
}

impl Order {
    /// Price the maker sells at: `pay_amount / buy_amount`.
    ///
    /// Contract amounts are `uint128`, so `pay_amount * 10^18` stays well
    /// inside `U256` and the saturating fallback is unreachable for orders
    /// read from a market.
    #[must_use]
    pub fn sell_to_buy_price(&self) -> Wad {
        debug_assert!(
            self.pay_amount.raw() <= U256::from(u128::MAX),
            "order {} pay amount exceeds uint128",
            self.order_id
        );
        // buy_amount > 0 is checked when the order is read from the ledger.
        self.pay_amount.checked_div(self.buy_amount).unwrap_or(Wad::MAX)
    }

    /// Inverse price: `buy_amount / pay_amount`.
    ///
    /// `None` when nothing remains on sale.
    #[must_use]
    pub fn buy_to_sell_price(&self) -> Option<Wad> {
        self.buy_amount.checked_div(self.pay_amount)
    }

    /// Amount of `pay_token` still available to takers.
    #[must_use]
    pub fn remaining_sell_amount(&self) -> Wad {
        self.pay_amount
    }

    /// Creation time as a UTC datetime.
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(i64::try_from(self.timestamp).ok()?, 0)
    }

    /// True if this order sells `pay_token` for `buy_token`.
    #[must_use]
    pub fn is_pair(&self, pay_token: Address, buy_token: Address) -> bool {
        self.pay_token == pay_token && self.buy_token == buy_token
    }
}

impl PartialEq for Order {
    fn eq(&self, other: &Self) -> bool {
        self.market == other.market && self.order_id == other.order_id
    }
}

impl Eq for Order {}

impl Hash for Order {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.market.hash(state);
        self.order_id.hash(state);
    }
}

impl std::fmt::Display for Order {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "#{} {} {} -> {} {} (maker {})",
            self.order_id, self.pay_amount, self.pay_token, self.buy_amount, self.buy_token, self.maker
        )
    }
}

/// Result of looking up one order slot.
///
/// `Absent` is permanent for a given market: ids are never reused, so a
/// slot that has been taken or cancelled stays absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderLookup {
    Present(Order),
    Absent,
}

impl OrderLookup {
    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Convert to an `Option`, dropping the absence marker.
    #[must_use]
    pub fn into_option(self) -> Option<Order> {
        match self {
            Self::Present(order) => Some(order),
            Self::Absent => None,
        }
    }

    #[must_use]
    pub fn as_order(&self) -> Option<&Order> {
        match self {
            Self::Present(order) => Some(order),
            Self::Absent => None,
        }
    }
}

impl From<OrderLookup> for Option<Order> {
    fn from(lookup: OrderLookup) -> Self {
        lookup.into_option()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashSet;

    fn order(market: u8, id: u64, pay: Wad, buy: Wad) -> Order {
        Order {
            market: Address::repeat_byte(market),
            order_id: id,
            maker: Address::repeat_byte(0xaa),
            pay_token: Address::repeat_byte(0x01),
            pay_amount: pay,
            buy_token: Address::repeat_byte(0x02),
            buy_amount: buy,
            timestamp: 1_500_000_000,
        }
    }

    #[test]
    fn test_prices() {
        let o = order(1, 1, Wad::from_number(10), Wad::from_number(4));
        assert_eq!(o.sell_to_buy_price(), Wad::from_decimal(dec!(2.5)).unwrap());
        assert_eq!(o.buy_to_sell_price(), Wad::from_decimal(dec!(0.4)));
        assert_eq!(o.remaining_sell_amount(), Wad::from_number(10));
    }

    #[test]
    fn test_price_at_uint128_bound_is_exact() {
        let max = Wad::from_raw(U256::from(u128::MAX));
        let o = order(1, 1, max, Wad::from_number(1));
        assert_eq!(o.sell_to_buy_price(), max);
        assert_ne!(o.sell_to_buy_price(), Wad::MAX);

        let dust = order(1, 2, max, Wad::from_raw(U256::from(1u8)));
        assert_eq!(
            dust.sell_to_buy_price().raw(),
            U256::from(u128::MAX) * U256::from(1_000_000_000_000_000_000u64)
        );
    }

    #[test]
    fn test_buy_to_sell_price_with_nothing_left() {
        let o = order(1, 1, Wad::ZERO, Wad::from_number(4));
        assert_eq!(o.sell_to_buy_price(), Wad::ZERO);
        assert_eq!(o.buy_to_sell_price(), None);
    }

    #[test]
    fn test_identity_is_market_and_id() {
        let a = order(1, 7, Wad::from_number(1), Wad::from_number(1));
        let partially_filled = order(1, 7, Wad::from_decimal(dec!(0.5)).unwrap(), Wad::from_number(1));
        let other_market = order(2, 7, Wad::from_number(1), Wad::from_number(1));

        assert_eq!(a, partially_filled);
        assert_ne!(a, other_market);

        let set: HashSet<Order> = [a, partially_filled, other_market].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_created_at() {
        let o = order(1, 1, Wad::from_number(1), Wad::from_number(1));
        assert_eq!(o.created_at().unwrap().timestamp(), 1_500_000_000);
    }

    #[test]
    fn test_lookup_conversions() {
        let o = order(1, 3, Wad::from_number(1), Wad::from_number(1));
        let present = OrderLookup::Present(o.clone());
        assert!(!present.is_absent());
        assert_eq!(present.as_order(), Some(&o));
        assert_eq!(Option::<Order>::from(present), Some(o));
        assert!(OrderLookup::Absent.is_absent());
        assert_eq!(OrderLookup::Absent.into_option(), None);
    }
}
