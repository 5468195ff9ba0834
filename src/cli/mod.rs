//! CLI argument parsing using clap.
//!
//! Defines the `otc-market` command line: read-only inspection of a market
//! loaded from a snapshot.

mod config;

pub use config::{AppConfig, ConfigError};

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::types::{Address, Wad};

/// otc-market - inspect OTC order markets
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Set the verbosity level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    pub verbose: String,

    /// Market snapshot to load (overrides OTC_SNAPSHOT)
    #[arg(long, global = true)]
    pub snapshot: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// List active orders with their prices
    Orders,

    /// Estimate the insertion position for a new order (matching markets)
    Position {
        /// Token the new order sells
        #[arg(long)]
        pay_token: Address,
        /// Amount sold, as a decimal (e.g. "1.5")
        #[arg(long)]
        pay_amount: Wad,
        /// Token the new order buys
        #[arg(long)]
        buy_token: Address,
        /// Amount bought, as a decimal
        #[arg(long)]
        buy_amount: Wad,
    },

    /// Print the id of the last order created
    LastId,
}
