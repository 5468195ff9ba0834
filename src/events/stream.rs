//! Historical queries and live subscriptions for market events.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::types::{decode_all, MarketEvent};
use crate::error::{MarketError, MarketResult};
use crate::ledger::EventSource;
use crate::types::Address;

/// Decoded events for one contract, backed by an [`EventSource`].
#[derive(Clone)]
pub struct EventFeed {
    contract: Address,
    source: Arc<dyn EventSource>,
}

impl EventFeed {
    pub fn new(contract: Address, source: Arc<dyn EventSource>) -> Self {
        Self { contract, source }
    }

    /// Events of type `E` from the last `number_of_past_blocks` blocks.
    ///
    /// The outer `Result` fails only if the source query fails; each record
    /// is decoded independently.
    pub async fn past<E: MarketEvent>(
        &self,
        number_of_past_blocks: u64,
    ) -> MarketResult<Vec<MarketResult<E>>> {
        let logs = self
            .source
            .past_logs(self.contract, E::NAME, number_of_past_blocks)
            .await
            .map_err(MarketError::ExternalQueryFailed)?;
        debug!(
            contract = %self.contract,
            event = E::NAME,
            count = logs.len(),
            number_of_past_blocks,
            "Fetched past events"
        );
        Ok(decode_all(&logs))
    }

    /// Deliver every future event of type `E` to `handler`.
    ///
    /// Runs until the source closes the stream. Abort the returned handle to
    /// unsubscribe. Malformed records reach the handler as `Err`.
    pub async fn subscribe<E, F>(&self, mut handler: F) -> MarketResult<JoinHandle<()>>
    where
        E: MarketEvent,
        F: FnMut(MarketResult<E>) + Send + 'static,
    {
        let mut logs = self
            .source
            .subscribe(self.contract, E::NAME)
            .await
            .map_err(MarketError::EventSourceFailed)?;
        let contract = self.contract;

        Ok(tokio::spawn(async move {
            while let Some(log) = logs.recv().await {
                let decoded = E::try_from(&log);
                if let Err(e) = &decoded {
                    warn!(contract = %contract, event = E::NAME, error = %e, "Malformed event received");
                }
                handler(decoded);
            }
            debug!(contract = %contract, event = E::NAME, "Event subscription closed");
        }))
    }
}

impl std::fmt::Debug for EventFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventFeed")
            .field("contract", &self.contract)
            .finish()
    }
}
