//! Transaction intents and pending handles.

use tokio::sync::oneshot;

use super::{AbiValue, LedgerError, RawLog};
use crate::error::{MarketError, MarketResult};
use crate::events::{MakeEvent, MarketEvent};
use crate::types::{Address, B256};

/// A fully specified, unsigned contract invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionIntent {
    pub contract: Address,
    pub method: &'static str,
    pub args: Vec<AbiValue>,
}

impl TransactionIntent {
    pub fn new(contract: Address, method: &'static str, args: Vec<AbiValue>) -> Self {
        Self {
            contract,
            method,
            args,
        }
    }
}

impl std::fmt::Display for TransactionIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}({} args)", self.contract, self.method, self.args.len())
    }
}

/// Outcome of a mined transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    pub block_number: u64,
    /// Logs emitted by the transaction, in emission order
    pub logs: Vec<RawLog>,
}

impl TransactionReceipt {
    /// Id of the order created by this transaction, recovered from its
    /// `LogMake` entry. `Ok(None)` if the transaction created no order.
    ///
    /// A `LogMake` that does not decode is a `MalformedEvent` error.
    pub fn created_order_id(&self) -> MarketResult<Option<u64>> {
        self.logs
            .iter()
            .find(|log| log.event == MakeEvent::NAME)
            .map(|log| MakeEvent::try_from(log).map(|event| event.order_id))
            .transpose()
    }
}

/// Handle for an action handed to the submission interface.
///
/// Resolution happens outside this crate; dropping the handle abandons
/// interest in the outcome without affecting the transaction itself.
#[derive(Debug)]
pub struct PendingTransaction {
    pub transaction_hash: B256,
    outcome: oneshot::Receiver<Result<TransactionReceipt, LedgerError>>,
}

impl PendingTransaction {
    pub fn new(
        transaction_hash: B256,
        outcome: oneshot::Receiver<Result<TransactionReceipt, LedgerError>>,
    ) -> Self {
        Self {
            transaction_hash,
            outcome,
        }
    }

    /// A handle that is already resolved (for synchronous ledgers).
    pub fn resolved(
        transaction_hash: B256,
        result: Result<TransactionReceipt, LedgerError>,
    ) -> Self {
        let (tx, rx) = oneshot::channel();
        // Receiver is alive in this scope, send cannot fail.
        let _ = tx.send(result);
        Self::new(transaction_hash, rx)
    }

    /// Wait for the transaction outcome.
    pub async fn wait(self) -> Result<TransactionReceipt, MarketError> {
        match self.outcome.await {
            Ok(result) => result.map_err(MarketError::TransactionFailed),
            Err(_) => Err(MarketError::TransactionFailed(LedgerError::Transport(format!(
                "submitter dropped transaction {}",
                self.transaction_hash
            )))),
        }
    }
}
