use clap::Parser;
use tracing::error;

use otc_market::cli::{AppConfig, Cli, Commands};
use otc_market::commands::{run_last_id, run_orders, run_position};
use otc_market::logging::init_tracing;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from the .env file
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(&cli.verbose);

    let config = match AppConfig::from_env(cli.snapshot.clone()) {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            return Err(e.into());
        }
    };

    match cli.command {
        Commands::Orders => run_orders(&config).await?,
        Commands::Position {
            pay_token,
            pay_amount,
            buy_token,
            buy_amount,
        } => run_position(&config, pay_token, pay_amount, buy_token, buy_amount).await?,
        Commands::LastId => run_last_id(&config).await?,
    }

    Ok(())
}
