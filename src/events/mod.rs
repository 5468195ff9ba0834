//! Market Event Module
//!
//! Typed decoding of the logs market contracts emit:
//! - `MakeEvent` (`LogMake`) - order created
//! - `BumpEvent` (`LogBump`) - order re-announced
//! - `TakeEvent` (`LogTake`) - order filled, fully or partially
//! - `KillEvent` (`LogKill`) - order cancelled
//!
//! Decoding is a pure `TryFrom<&RawLog>`; `EventFeed` adds history queries
//! and live subscriptions on top of an `EventSource`.

mod decode;
mod stream;
mod types;

pub use stream::EventFeed;
pub use types::{
    decode_all, BumpEvent, KillEvent, LogOrigin, MakeEvent, MarketEvent, TakeEvent,
};
