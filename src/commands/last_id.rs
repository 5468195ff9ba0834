//! `last-id` command handler.

use super::open_market;
use crate::cli::AppConfig;

pub async fn run_last_id(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let (_ledger, market) = open_market(config)?;
    println!("{}", market.get_last_order_id().await?);
    Ok(())
}
