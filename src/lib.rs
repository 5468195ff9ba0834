pub mod cli;
pub mod commands;
pub mod error;
pub mod events;
pub mod ledger;
pub mod logging;
pub mod market;
pub mod orders;
pub mod sandbox;
pub mod types;

pub use error::{MarketError, MarketResult};
pub use market::{ExpiringMarket, Market, MarketKind, MatchingMarket, SimpleMarket};
pub use orders::{Order, OrderLookup};
pub use types::{Address, Wad};
