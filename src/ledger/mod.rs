//! Ledger Abstraction Layer
//!
//! Narrow async interfaces to the external ledger the market contracts live
//! on. Transport, signing, ABI encoding and log subscription mechanics all sit
//! behind these traits; the market clients only ever see decoded values.
//!
//! - `LedgerQuery` - read-only contract calls
//! - `TransactionSubmitter` - hands off transaction intents, returns a pending handle
//! - `EventSource` - historical and live contract logs

mod decode;
mod transaction;

pub use decode::ResponseReader;
pub use transaction::{PendingTransaction, TransactionIntent, TransactionReceipt};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::types::{Address, B256, Wad};
use alloy_primitives::U256;

/// Errors reported by ledger collaborators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Network/RPC failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response could not be decoded into the expected shape
    #[error("Decode error: {0}")]
    Decode(String),

    /// Contract reverted or refused the call
    #[error("Rejected: {0}")]
    Rejected(String),

    /// No such method on the target contract
    #[error("Unknown method: {0}")]
    UnknownMethod(String),
}

/// A decoded ABI value, as exchanged with the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbiValue {
    Address(Address),
    Uint(U256),
    Bool(bool),
    Bytes32(B256),
}

impl AbiValue {
    /// Encode an order id the way the market contracts key their offers.
    pub fn order_id(id: u64) -> Self {
        Self::Bytes32(B256::from(U256::from(id).to_be_bytes::<32>()))
    }

    pub fn wad(amount: Wad) -> Self {
        Self::Uint(amount.raw())
    }

    pub fn uint(value: u64) -> Self {
        Self::Uint(U256::from(value))
    }

    /// Short type name used in decode error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Address(_) => "address",
            Self::Uint(_) => "uint",
            Self::Bool(_) => "bool",
            Self::Bytes32(_) => "bytes32",
        }
    }
}

/// A raw log record emitted by a contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLog {
    /// Emitting contract
    pub address: Address,
    /// Event name (e.g. `LogMake`)
    pub event: String,
    pub block_number: u64,
    pub transaction_hash: B256,
    /// Decoded event arguments keyed by ABI name
    pub args: BTreeMap<String, AbiValue>,
}

/// Read-only contract calls.
#[async_trait]
pub trait LedgerQuery: Send + Sync {
    /// Call `method` on `contract` and return the decoded output tuple.
    async fn call(
        &self,
        contract: Address,
        method: &str,
        args: &[AbiValue],
    ) -> Result<Vec<AbiValue>, LedgerError>;
}

/// Transaction hand-off. Signing, gas and broadcast live behind this trait.
#[async_trait]
pub trait TransactionSubmitter: Send + Sync {
    async fn submit(&self, intent: TransactionIntent) -> Result<PendingTransaction, LedgerError>;
}

/// Source of contract logs.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Logs named `event` emitted by `contract` over the last
    /// `number_of_past_blocks` blocks, oldest first.
    async fn past_logs(
        &self,
        contract: Address,
        event: &str,
        number_of_past_blocks: u64,
    ) -> Result<Vec<RawLog>, LedgerError>;

    /// Live stream of future logs named `event` emitted by `contract`.
    async fn subscribe(
        &self,
        contract: Address,
        event: &str,
    ) -> Result<mpsc::UnboundedReceiver<RawLog>, LedgerError>;
}

/// Token allowance management. Approval modes (direct, via a proxy, ...)
/// are implementations of this trait.
#[async_trait]
pub trait TokenApprover: Send + Sync {
    /// Let `spender` move the caller's full balance of `token`.
    async fn approve(
        &self,
        token: Address,
        spender: Address,
        spender_name: &str,
    ) -> Result<(), LedgerError>;
}

/// The three ledger collaborators a market client needs.
#[derive(Clone)]
pub struct LedgerConnection {
    pub query: Arc<dyn LedgerQuery>,
    pub submitter: Arc<dyn TransactionSubmitter>,
    pub events: Arc<dyn EventSource>,
}

impl LedgerConnection {
    pub fn new(
        query: Arc<dyn LedgerQuery>,
        submitter: Arc<dyn TransactionSubmitter>,
        events: Arc<dyn EventSource>,
    ) -> Self {
        Self {
            query,
            submitter,
            events,
        }
    }

    /// Use one object for all three roles.
    pub fn shared<L>(ledger: Arc<L>) -> Self
    where
        L: LedgerQuery + TransactionSubmitter + EventSource + 'static,
    {
        Self {
            query: ledger.clone(),
            submitter: ledger.clone(),
            events: ledger,
        }
    }
}

impl std::fmt::Debug for LedgerConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("LedgerConnection")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_id_is_big_endian_bytes32() {
        let AbiValue::Bytes32(b) = AbiValue::order_id(258) else {
            panic!("expected bytes32");
        };
        assert_eq!(b.0[31], 2);
        assert_eq!(b.0[30], 1);
        assert!(b.0[..30].iter().all(|byte| *byte == 0));
    }

    #[test]
    fn test_abi_value_kind() {
        assert_eq!(AbiValue::Bool(true).kind(), "bool");
        assert_eq!(AbiValue::uint(1).kind(), "uint");
        assert_eq!(AbiValue::Address(Address::ZERO).kind(), "address");
    }
}
