//! `position` command handler.

use tracing::info;

use super::open_market;
use crate::cli::AppConfig;
use crate::market::{estimate_position, order_price};
use crate::types::{Address, Wad};

/// Print the insertion hint a new order would use.
///
/// Works on any market kind; only matching markets consume the hint.
pub async fn run_position(
    config: &AppConfig,
    pay_token: Address,
    pay_amount: Wad,
    buy_token: Address,
    buy_amount: Wad,
) -> Result<(), Box<dyn std::error::Error>> {
    let price = order_price(pay_amount, buy_amount)?;

    let (_ledger, market) = open_market(config)?;
    let orders = market.get_orders().await?;
    let position = estimate_position(&orders, pay_token, buy_token, price);
    info!(market = %market, %price, position, "Position estimated");

    if position == 0 {
        println!("0 (no order at or above {}; the contract searches)", price);
    } else {
        println!("{}", position);
    }
    Ok(())
}
