//! Transaction intent builders for market commands.
//!
//! Builders validate their arguments and never touch the ledger, so an
//! invalid command is rejected before anything is submitted.

use crate::error::{MarketError, MarketResult};
use crate::ledger::{AbiValue, TransactionIntent};
use crate::types::{Address, Wad};

fn require_positive(name: &str, amount: Wad) -> MarketResult<()> {
    if amount.is_zero() {
        return Err(MarketError::invalid(format!("{} must be greater than zero", name)));
    }
    Ok(())
}

/// Check the amounts of a new order: both must be non-zero.
pub fn validate_amounts(pay_amount: Wad, buy_amount: Wad) -> MarketResult<()> {
    require_positive("pay_amount", pay_amount)?;
    require_positive("buy_amount", buy_amount)
}

/// `make(pay_gem, buy_gem, pay_amt, buy_amt)` on a simple or expiring market.
pub fn make(
    market: Address,
    pay_token: Address,
    pay_amount: Wad,
    buy_token: Address,
    buy_amount: Wad,
) -> MarketResult<TransactionIntent> {
    validate_amounts(pay_amount, buy_amount)?;
    Ok(TransactionIntent::new(
        market,
        "make",
        vec![
            AbiValue::Address(pay_token),
            AbiValue::Address(buy_token),
            AbiValue::wad(pay_amount),
            AbiValue::wad(buy_amount),
        ],
    ))
}

/// `offer(pay_amt, pay_gem, buy_amt, buy_gem, pos)` on a matching market.
///
/// `position` is the id of the order to insert after, `0` to let the
/// contract search.
pub fn offer(
    market: Address,
    pay_token: Address,
    pay_amount: Wad,
    buy_token: Address,
    buy_amount: Wad,
    position: u64,
) -> MarketResult<TransactionIntent> {
    validate_amounts(pay_amount, buy_amount)?;
    Ok(TransactionIntent::new(
        market,
        "offer",
        vec![
            AbiValue::wad(pay_amount),
            AbiValue::Address(pay_token),
            AbiValue::wad(buy_amount),
            AbiValue::Address(buy_token),
            AbiValue::uint(position),
        ],
    ))
}

/// `bump(id)`: re-emit the order's creation data as a `LogBump`.
pub fn bump(market: Address, order_id: u64) -> TransactionIntent {
    TransactionIntent::new(market, "bump", vec![AbiValue::order_id(order_id)])
}

/// `take(id, quantity)`: buy `quantity` of the order's pay token.
///
/// The contract enforces `quantity <= pay_amount`; taking exactly the
/// remaining amount closes the order.
pub fn take(market: Address, order_id: u64, quantity: Wad) -> TransactionIntent {
    TransactionIntent::new(
        market,
        "take",
        vec![AbiValue::order_id(order_id), AbiValue::wad(quantity)],
    )
}

/// `kill(id)`: cancel an order. Authorization is checked by the contract.
pub fn kill(market: Address, order_id: u64) -> TransactionIntent {
    TransactionIntent::new(market, "kill", vec![AbiValue::order_id(order_id)])
}

pub fn set_buy_enabled(market: Address, enabled: bool) -> TransactionIntent {
    TransactionIntent::new(market, "setBuyEnabled", vec![AbiValue::Bool(enabled)])
}

pub fn set_matching_enabled(market: Address, enabled: bool) -> TransactionIntent {
    TransactionIntent::new(market, "setMatchingEnabled", vec![AbiValue::Bool(enabled)])
}

pub fn add_token_pair_whitelist(
    market: Address,
    base_token: Address,
    quote_token: Address,
) -> TransactionIntent {
    TransactionIntent::new(
        market,
        "addTokenPairWhitelist",
        vec![AbiValue::Address(base_token), AbiValue::Address(quote_token)],
    )
}
