//! `orders` command handler.

use tracing::info;

use super::open_market;
use crate::cli::AppConfig;
use crate::orders::Order;

/// One line per order: id, pair, amounts and sell-to-buy price.
pub(crate) fn format_order(order: &Order) -> String {
    format!(
        "#{:<6} maker {} sells {} of {} for {} of {} @ {}",
        order.order_id,
        order.maker,
        order.pay_amount,
        order.pay_token,
        order.buy_amount,
        order.buy_token,
        order.sell_to_buy_price()
    )
}

/// Print every active order on the market.
pub async fn run_orders(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let (ledger, market) = open_market(config)?;
    let orders = market.get_orders().await?;
    info!(
        market = %market,
        active = orders.len(),
        queries = ledger.query_count(),
        "Order book loaded"
    );

    println!("{}: {} active orders", market, orders.len());
    for order in &orders {
        println!("{}", format_order(order));
    }
    Ok(())
}
