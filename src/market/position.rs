//! Insertion position estimation for matching markets.
//!
//! A matching market keeps the active orders of each (pay, buy) token pair
//! in a linked list sorted by descending sell-to-buy price. `offer` takes the
//! id of the order after which the new one belongs; a good hint saves the
//! contract a linear scan, `0` makes it search on its own.

use super::intent::validate_amounts;
use crate::error::{MarketError, MarketResult};
use crate::orders::Order;
use crate::types::{Address, Wad};

/// Sell-to-buy price of a prospective order, `pay_amount / buy_amount`.
///
/// Rejects zero amounts and prices that overflow the fixed-point range.
pub fn order_price(pay_amount: Wad, buy_amount: Wad) -> MarketResult<Wad> {
    validate_amounts(pay_amount, buy_amount)?;
    pay_amount
        .checked_div(buy_amount)
        .ok_or_else(|| MarketError::invalid(format!("price {} / {} overflows", pay_amount, buy_amount)))
}

/// Pick the insertion hint for a new order selling at `price`.
///
/// Among orders of the same pair whose sell-to-buy price is at least
/// `price`, returns the id of the one with the lowest price. Returns `0`
/// when there is no such order.
///
/// Equal prices are compared on raw fixed-point values. Among several
/// orders sharing the lowest qualifying price the lowest id wins.
pub fn estimate_position(
    orders: &[Order],
    pay_token: Address,
    buy_token: Address,
    price: Wad,
) -> u64 {
    let mut best: Option<(Wad, u64)> = None;
    for order in orders.iter().filter(|o| o.is_pair(pay_token, buy_token)) {
        let order_price = order.sell_to_buy_price();
        if order_price < price {
            continue;
        }
        let better = match best {
            None => true,
            Some((best_price, best_id)) => {
                order_price < best_price || (order_price == best_price && order.order_id < best_id)
            }
        };
        if better {
            best = Some((order_price, order.order_id));
        }
    }
    best.map(|(_, id)| id).unwrap_or(0)
}
