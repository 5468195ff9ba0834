//! Typed market events.
//!
//! Each record is an immutable snapshot taken when the log was emitted.
//! Amounts reflect the order at that moment, not its current state.

use serde::{Deserialize, Serialize};

use super::decode::LogArgs;
use crate::error::MarketError;
use crate::ledger::RawLog;
use crate::types::{Address, B256, Wad};

/// A decodable market event.
pub trait MarketEvent: for<'a> TryFrom<&'a RawLog, Error = MarketError> + Send + 'static {
    /// Event name as emitted by the contract
    const NAME: &'static str;
}

/// Where a log came from, kept for correlation with the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogOrigin {
    pub block_number: u64,
    pub transaction_hash: B256,
}

impl From<&RawLog> for LogOrigin {
    fn from(log: &RawLog) -> Self {
        Self {
            block_number: log.block_number,
            transaction_hash: log.transaction_hash,
        }
    }
}

/// An order was created (`LogMake`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MakeEvent {
    pub order_id: u64,
    pub maker: Address,
    pub pay_token: Address,
    pub pay_amount: Wad,
    pub buy_token: Address,
    pub buy_amount: Wad,
    pub timestamp: u64,
    pub origin: LogOrigin,
}

/// An order was bumped (`LogBump`), re-announcing it without changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BumpEvent {
    pub order_id: u64,
    pub maker: Address,
    pub pay_token: Address,
    pub pay_amount: Wad,
    pub buy_token: Address,
    pub buy_amount: Wad,
    pub timestamp: u64,
    pub origin: LogOrigin,
}

/// An order was taken, fully or partially (`LogTake`).
///
/// `take_amount` is the amount of `pay_token` the taker received and
/// `give_amount` the amount of `buy_token` the taker paid. Neither needs to
/// match the order's original amounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TakeEvent {
    pub order_id: u64,
    pub maker: Address,
    pub taker: Address,
    pub pay_token: Address,
    pub take_amount: Wad,
    pub buy_token: Address,
    pub give_amount: Wad,
    pub timestamp: u64,
    pub origin: LogOrigin,
}

/// An order was cancelled (`LogKill`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KillEvent {
    pub order_id: u64,
    pub maker: Address,
    pub pay_token: Address,
    pub pay_amount: Wad,
    pub buy_token: Address,
    pub buy_amount: Wad,
    pub timestamp: u64,
    pub origin: LogOrigin,
}

impl MarketEvent for MakeEvent {
    const NAME: &'static str = "LogMake";
}

impl MarketEvent for BumpEvent {
    const NAME: &'static str = "LogBump";
}

impl MarketEvent for TakeEvent {
    const NAME: &'static str = "LogTake";
}

impl MarketEvent for KillEvent {
    const NAME: &'static str = "LogKill";
}

impl TryFrom<&RawLog> for MakeEvent {
    type Error = MarketError;

    fn try_from(log: &RawLog) -> Result<Self, Self::Error> {
        let args = LogArgs::new(Self::NAME, log)?;
        Ok(Self {
            order_id: args.order_id("id")?,
            maker: args.address("maker")?,
            pay_token: args.address("pay_gem")?,
            pay_amount: args.wad("pay_amt")?,
            buy_token: args.address("buy_gem")?,
            buy_amount: args.wad("buy_amt")?,
            timestamp: args.u64("timestamp")?,
            origin: log.into(),
        })
    }
}

impl TryFrom<&RawLog> for BumpEvent {
    type Error = MarketError;

    fn try_from(log: &RawLog) -> Result<Self, Self::Error> {
        let args = LogArgs::new(Self::NAME, log)?;
        Ok(Self {
            order_id: args.order_id("id")?,
            maker: args.address("maker")?,
            pay_token: args.address("pay_gem")?,
            pay_amount: args.wad("pay_amt")?,
            buy_token: args.address("buy_gem")?,
            buy_amount: args.wad("buy_amt")?,
            timestamp: args.u64("timestamp")?,
            origin: log.into(),
        })
    }
}

impl TryFrom<&RawLog> for TakeEvent {
    type Error = MarketError;

    fn try_from(log: &RawLog) -> Result<Self, Self::Error> {
        let args = LogArgs::new(Self::NAME, log)?;
        Ok(Self {
            order_id: args.order_id("id")?,
            maker: args.address("maker")?,
            taker: args.address("taker")?,
            pay_token: args.address("pay_gem")?,
            take_amount: args.wad("take_amt")?,
            buy_token: args.address("buy_gem")?,
            give_amount: args.wad("give_amt")?,
            timestamp: args.u64("timestamp")?,
            origin: log.into(),
        })
    }
}

impl TryFrom<&RawLog> for KillEvent {
    type Error = MarketError;

    fn try_from(log: &RawLog) -> Result<Self, Self::Error> {
        let args = LogArgs::new(Self::NAME, log)?;
        Ok(Self {
            order_id: args.order_id("id")?,
            maker: args.address("maker")?,
            pay_token: args.address("pay_gem")?,
            pay_amount: args.wad("pay_amt")?,
            buy_token: args.address("buy_gem")?,
            buy_amount: args.wad("buy_amt")?,
            timestamp: args.u64("timestamp")?,
            origin: log.into(),
        })
    }
}

/// Decode a batch of logs, one result per record.
///
/// A malformed record yields an `Err` in its slot and does not affect the
/// others.
pub fn decode_all<E: MarketEvent>(logs: &[RawLog]) -> Vec<Result<E, MarketError>> {
    logs.iter().map(|log| E::try_from(log)).collect()
}
