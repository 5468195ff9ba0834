//! Order Query Module
//!
//! Read-only access to the active orders held by a market contract.
//!
//! # Architecture
//!
//! - `OrderRepository` - Queries order slots, caches permanently absent ids
//! - Core types - `Order`, `OrderLookup`
//!
//! # Example
//!
//! ```ignore
//! use otc_market::orders::{OrderLookup, OrderRepository};
//!
//! let repo = OrderRepository::new(market_address, ledger);
//! match repo.get_order(42).await? {
//!     OrderLookup::Present(order) => println!("{}", order),
//!     OrderLookup::Absent => println!("order 42 is gone"),
//! }
//! ```

mod repository;
mod types;

pub use repository::OrderRepository;
pub use types::{Order, OrderLookup};
