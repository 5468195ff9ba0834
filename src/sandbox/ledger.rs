//! In-memory market contract.

use alloy_primitives::{keccak256, U256};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::ledger::{
    AbiValue, EventSource, LedgerError, LedgerQuery, PendingTransaction, RawLog, ResponseReader,
    TokenApprover, TransactionIntent, TransactionReceipt, TransactionSubmitter,
};
use crate::market::MarketKind;
use crate::types::{Address, Wad, B256};

/// One live offer slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxOffer {
    pub owner: Address,
    pub pay_token: Address,
    pub pay_amount: Wad,
    pub buy_token: Address,
    pub buy_amount: Wad,
    pub timestamp: u64,
}

struct SandboxState {
    sender: Address,
    now: u64,
    block_number: u64,
    nonce: u64,
    offers: BTreeMap<u64, SandboxOffer>,
    last_offer_id: u64,
    close_time: u64,
    buy_enabled: bool,
    matching_enabled: bool,
    whitelist: BTreeSet<(Address, Address)>,
    logs: Vec<RawLog>,
    subscribers: Vec<(String, mpsc::UnboundedSender<RawLog>)>,
    approvals: Vec<(Address, Address)>,
}

/// Single-contract ledger held in memory.
///
/// Implements every ledger interface for one market at a fixed address and
/// follows the contract rules a client can observe:
///
/// - ids are assigned sequentially from 1 and never reused
/// - a take pays `quantity * buy_amount / pay_amount` (floored) and closes
///   the offer once nothing is left to sell
/// - only the owner may kill before close; anyone may after
/// - no new offers or takes on a closed market
/// - once the matching whitelist is non-empty, new offers must use a listed pair
///
/// Crossing offers are not matched against each other. Token balances are
/// not tracked; approvals are only recorded.
///
/// Rejected transactions still mine a block: `submit` succeeds and the
/// pending handle resolves to `LedgerError::Rejected`.
pub struct SandboxLedger {
    market: Address,
    kind: MarketKind,
    state: Mutex<SandboxState>,
    queries: AtomicU64,
}

impl SandboxLedger {
    /// Empty market that never closes. Transactions are sent from `sender`
    /// until [`set_sender`](Self::set_sender) is called.
    pub fn new(market: Address, kind: MarketKind, sender: Address) -> Self {
        Self {
            market,
            kind,
            state: Mutex::new(SandboxState {
                sender,
                now: chrono::Utc::now().timestamp().max(0) as u64,
                block_number: 1,
                nonce: 0,
                offers: BTreeMap::new(),
                last_offer_id: 0,
                close_time: u64::MAX,
                buy_enabled: true,
                matching_enabled: true,
                whitelist: BTreeSet::new(),
                logs: Vec::new(),
                subscribers: Vec::new(),
                approvals: Vec::new(),
            }),
            queries: AtomicU64::new(0),
        }
    }

    fn state(&self) -> MutexGuard<'_, SandboxState> {
        // Handle mutex poisoning gracefully
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn market(&self) -> Address {
        self.market
    }

    pub fn kind(&self) -> MarketKind {
        self.kind
    }

    // --- Seeding and inspection ---

    /// Account subsequent transactions are sent from.
    pub fn set_sender(&self, sender: Address) {
        self.state().sender = sender;
    }

    /// Set the contract clock (unix seconds).
    pub fn set_time(&self, now: u64) {
        self.state().now = now;
    }

    pub fn set_close_time(&self, close_time: u64) {
        self.state().close_time = close_time;
    }

    /// Place an offer directly, without a transaction or log. Returns its id.
    pub fn insert_order(&self, offer: SandboxOffer) -> u64 {
        let mut state = self.state();
        state.last_offer_id += 1;
        let id = state.last_offer_id;
        state.offers.insert(id, offer);
        id
    }

    /// Place an offer under a specific id. Ids up to `id` count as used.
    pub fn insert_order_at(&self, id: u64, offer: SandboxOffer) {
        let mut state = self.state();
        state.last_offer_id = state.last_offer_id.max(id);
        state.offers.insert(id, offer);
    }

    /// Mark ids up to `id` as used even if no offer holds them.
    pub fn reserve_ids(&self, id: u64) {
        let mut state = self.state();
        state.last_offer_id = state.last_offer_id.max(id);
    }

    pub fn set_flags(&self, buy_enabled: bool, matching_enabled: bool) {
        let mut state = self.state();
        state.buy_enabled = buy_enabled;
        state.matching_enabled = matching_enabled;
    }

    pub fn whitelist_pair(&self, base: Address, quote: Address) {
        self.state().whitelist.insert((base, quote));
    }

    /// Live offer stored under `id`, if any.
    pub fn offer(&self, id: u64) -> Option<SandboxOffer> {
        self.state().offers.get(&id).cloned()
    }

    pub fn block_number(&self) -> u64 {
        self.state().block_number
    }

    /// `(token, spender)` pairs approved so far.
    pub fn approvals(&self) -> Vec<(Address, Address)> {
        self.state().approvals.clone()
    }

    /// Number of read-only calls served.
    pub fn query_count(&self) -> u64 {
        self.queries.load(Ordering::Relaxed)
    }

    pub fn reset_query_count(&self) {
        self.queries.store(0, Ordering::Relaxed);
    }

    fn has_expiry(&self) -> bool {
        self.kind != MarketKind::Simple
    }

    fn is_matching(&self) -> bool {
        self.kind == MarketKind::Matching
    }

    // --- Query dispatch ---

    fn answer(&self, method: &str, args: &[AbiValue]) -> Result<Vec<AbiValue>, LedgerError> {
        let state = self.state();
        match method {
            "last_offer_id" => Ok(vec![AbiValue::uint(state.last_offer_id)]),
            "offers" => {
                let id = ResponseReader::new(method, args).order_id(0)?;
                Ok(offer_tuple(state.offers.get(&id)))
            }
            "close_time" if self.has_expiry() => Ok(vec![AbiValue::uint(state.close_time)]),
            "isClosed" if self.has_expiry() => Ok(vec![AbiValue::Bool(state.is_closed())]),
            "buyEnabled" if self.is_matching() => Ok(vec![AbiValue::Bool(state.buy_enabled)]),
            "matchingEnabled" if self.is_matching() => {
                Ok(vec![AbiValue::Bool(state.matching_enabled)])
            }
            other => Err(LedgerError::UnknownMethod(other.to_string())),
        }
    }

    // --- Transaction execution ---

    /// Apply `intent` to `state`, returning the logs it emits.
    fn execute(
        &self,
        state: &mut SandboxState,
        intent: &TransactionIntent,
    ) -> Result<Vec<RawLog>, LedgerError> {
        let args = ResponseReader::new(intent.method, &intent.args);
        match intent.method {
            "make" => {
                let (pay_token, buy_token) = (args.address(0)?, args.address(1)?);
                let (pay_amount, buy_amount) = (args.wad(2)?, args.wad(3)?);
                self.create(state, pay_token, pay_amount, buy_token, buy_amount)
            }
            "offer" if self.is_matching() => {
                let (pay_amount, pay_token) = (args.wad(0)?, args.address(1)?);
                let (buy_amount, buy_token) = (args.wad(2)?, args.address(3)?);
                // Without a linked list to walk, the hint only has to be an id
                // the contract could have issued.
                let position = args.u64(4)?;
                if position > state.last_offer_id {
                    return Err(LedgerError::Rejected(format!("unknown position {}", position)));
                }
                self.create(state, pay_token, pay_amount, buy_token, buy_amount)
            }
            "bump" => {
                let id = args.order_id(0)?;
                let offer = live_offer(state, id)?.clone();
                Ok(vec![self.offer_log(state, "LogBump", id, &offer)])
            }
            "take" => {
                let id = args.order_id(0)?;
                let quantity = args.wad(1)?;
                self.fill(state, id, quantity)
            }
            "kill" => {
                let id = args.order_id(0)?;
                let owner = live_offer(state, id)?.owner;
                if owner != state.sender && !(self.has_expiry() && state.is_closed()) {
                    return Err(LedgerError::Rejected(format!(
                        "{} is not the owner of order {}",
                        state.sender, id
                    )));
                }
                let offer = state.offers.remove(&id).ok_or_else(|| inactive(id))?;
                Ok(vec![self.offer_log(state, "LogKill", id, &offer)])
            }
            "setBuyEnabled" if self.is_matching() => {
                state.buy_enabled = args.boolean(0)?;
                Ok(Vec::new())
            }
            "setMatchingEnabled" if self.is_matching() => {
                state.matching_enabled = args.boolean(0)?;
                Ok(Vec::new())
            }
            "addTokenPairWhitelist" if self.is_matching() => {
                let pair = (args.address(0)?, args.address(1)?);
                if !state.whitelist.insert(pair) {
                    return Err(LedgerError::Rejected("pair already whitelisted".to_string()));
                }
                Ok(Vec::new())
            }
            other => Err(LedgerError::UnknownMethod(other.to_string())),
        }
    }

    fn create(
        &self,
        state: &mut SandboxState,
        pay_token: Address,
        pay_amount: Wad,
        buy_token: Address,
        buy_amount: Wad,
    ) -> Result<Vec<RawLog>, LedgerError> {
        if self.has_expiry() && state.is_closed() {
            return Err(LedgerError::Rejected("market closed".to_string()));
        }
        if pay_amount.is_zero() || buy_amount.is_zero() {
            return Err(LedgerError::Rejected("zero amount".to_string()));
        }
        if pay_token == buy_token {
            return Err(LedgerError::Rejected("pay and buy token are the same".to_string()));
        }
        if self.is_matching()
            && !state.whitelist.is_empty()
            && !state.whitelist.contains(&(pay_token, buy_token))
            && !state.whitelist.contains(&(buy_token, pay_token))
        {
            return Err(LedgerError::Rejected("token pair not whitelisted".to_string()));
        }

        state.last_offer_id += 1;
        let id = state.last_offer_id;
        let offer = SandboxOffer {
            owner: state.sender,
            pay_token,
            pay_amount,
            buy_token,
            buy_amount,
            timestamp: state.now,
        };
        let log = self.offer_log(state, "LogMake", id, &offer);
        state.offers.insert(id, offer);
        Ok(vec![log])
    }

    fn fill(&self, state: &mut SandboxState, id: u64, quantity: Wad) -> Result<Vec<RawLog>, LedgerError> {
        if self.has_expiry() && state.is_closed() {
            return Err(LedgerError::Rejected("market closed".to_string()));
        }
        let offer = live_offer(state, id)?.clone();
        let spend = quantity
            .raw()
            .checked_mul(offer.buy_amount.raw())
            .map(|v| v / offer.pay_amount.raw())
            .ok_or_else(|| LedgerError::Rejected("fill amount overflow".to_string()))?;
        if quantity.is_zero() || spend.is_zero() || quantity > offer.pay_amount {
            return Err(LedgerError::Rejected(format!(
                "cannot take {} from order {} offering {}",
                quantity, id, offer.pay_amount
            )));
        }
        let give_amount = Wad::from_raw(spend);

        let mut args = BTreeMap::new();
        args.insert("id".to_string(), AbiValue::order_id(id));
        args.insert("maker".to_string(), AbiValue::Address(offer.owner));
        args.insert("taker".to_string(), AbiValue::Address(state.sender));
        args.insert("pay_gem".to_string(), AbiValue::Address(offer.pay_token));
        args.insert("buy_gem".to_string(), AbiValue::Address(offer.buy_token));
        args.insert("take_amt".to_string(), AbiValue::wad(quantity));
        args.insert("give_amt".to_string(), AbiValue::wad(give_amount));
        args.insert("timestamp".to_string(), AbiValue::uint(state.now));
        let log = self.log(state, "LogTake", args);

        let remaining = offer.pay_amount.saturating_sub(quantity);
        if remaining.is_zero() {
            state.offers.remove(&id);
        } else if let Some(slot) = state.offers.get_mut(&id) {
            slot.pay_amount = remaining;
            slot.buy_amount = offer.buy_amount.saturating_sub(give_amount);
        }
        Ok(vec![log])
    }

    fn offer_log(&self, state: &SandboxState, event: &str, id: u64, offer: &SandboxOffer) -> RawLog {
        let mut args = BTreeMap::new();
        args.insert("id".to_string(), AbiValue::order_id(id));
        args.insert("maker".to_string(), AbiValue::Address(offer.owner));
        args.insert("pay_gem".to_string(), AbiValue::Address(offer.pay_token));
        args.insert("pay_amt".to_string(), AbiValue::wad(offer.pay_amount));
        args.insert("buy_gem".to_string(), AbiValue::Address(offer.buy_token));
        args.insert("buy_amt".to_string(), AbiValue::wad(offer.buy_amount));
        args.insert("timestamp".to_string(), AbiValue::uint(state.now));
        self.log(state, event, args)
    }

    /// A log stamped with the block currently being mined.
    fn log(&self, state: &SandboxState, event: &str, args: BTreeMap<String, AbiValue>) -> RawLog {
        RawLog {
            address: self.market,
            event: event.to_string(),
            block_number: state.block_number,
            transaction_hash: self.transaction_hash(state.nonce),
            args,
        }
    }

    fn transaction_hash(&self, nonce: u64) -> B256 {
        let mut preimage = self.market.to_vec();
        preimage.extend_from_slice(&nonce.to_be_bytes());
        keccak256(preimage)
    }
}

impl SandboxState {
    fn is_closed(&self) -> bool {
        self.now > self.close_time
    }

    /// Record mined logs and push them to matching subscribers.
    fn publish(&mut self, logs: &[RawLog]) {
        for log in logs {
            self.subscribers.retain(|(event, tx)| {
                if *event != log.event {
                    return true;
                }
                // A closed receiver means the subscriber went away.
                tx.send(log.clone()).is_ok()
            });
        }
        self.logs.extend_from_slice(logs);
    }
}

fn inactive(id: u64) -> LedgerError {
    LedgerError::Rejected(format!("order {} is not active", id))
}

fn live_offer(state: &SandboxState, id: u64) -> Result<&SandboxOffer, LedgerError> {
    state.offers.get(&id).ok_or_else(|| inactive(id))
}

/// `offers(id)` output: `(pay_amt, pay_gem, buy_amt, buy_gem, owner, active, timestamp)`.
fn offer_tuple(offer: Option<&SandboxOffer>) -> Vec<AbiValue> {
    match offer {
        Some(o) => vec![
            AbiValue::wad(o.pay_amount),
            AbiValue::Address(o.pay_token),
            AbiValue::wad(o.buy_amount),
            AbiValue::Address(o.buy_token),
            AbiValue::Address(o.owner),
            AbiValue::Bool(true),
            AbiValue::uint(o.timestamp),
        ],
        None => vec![
            AbiValue::Uint(U256::ZERO),
            AbiValue::Address(Address::ZERO),
            AbiValue::Uint(U256::ZERO),
            AbiValue::Address(Address::ZERO),
            AbiValue::Address(Address::ZERO),
            AbiValue::Bool(false),
            AbiValue::Uint(U256::ZERO),
        ],
    }
}

#[async_trait]
impl LedgerQuery for SandboxLedger {
    async fn call(
        &self,
        contract: Address,
        method: &str,
        args: &[AbiValue],
    ) -> Result<Vec<AbiValue>, LedgerError> {
        self.queries.fetch_add(1, Ordering::Relaxed);
        if contract != self.market {
            return Err(LedgerError::Transport(format!("no contract at {}", contract)));
        }
        trace!(market = %self.market, method, "Sandbox query");
        self.answer(method, args)
    }
}

#[async_trait]
impl TransactionSubmitter for SandboxLedger {
    async fn submit(&self, intent: TransactionIntent) -> Result<PendingTransaction, LedgerError> {
        if intent.contract != self.market {
            return Err(LedgerError::Transport(format!("no contract at {}", intent.contract)));
        }

        let mut state = self.state();
        state.nonce += 1;
        let transaction_hash = self.transaction_hash(state.nonce);
        let outcome = self.execute(&mut state, &intent);

        // Unknown methods never reach a block: the call cannot even be encoded.
        if let Err(LedgerError::UnknownMethod(method)) = &outcome {
            state.nonce -= 1;
            return Err(LedgerError::UnknownMethod(method.clone()));
        }

        let block_number = state.block_number;
        state.block_number += 1;
        let result = match outcome {
            Ok(logs) => {
                info!(
                    market = %self.market,
                    method = intent.method,
                    block_number,
                    logs = logs.len(),
                    "Sandbox transaction mined"
                );
                state.publish(&logs);
                Ok(TransactionReceipt {
                    transaction_hash,
                    block_number,
                    logs,
                })
            }
            Err(e) => {
                warn!(market = %self.market, method = intent.method, error = %e, "Sandbox transaction reverted");
                Err(e)
            }
        };
        Ok(PendingTransaction::resolved(transaction_hash, result))
    }
}

#[async_trait]
impl EventSource for SandboxLedger {
    async fn past_logs(
        &self,
        contract: Address,
        event: &str,
        number_of_past_blocks: u64,
    ) -> Result<Vec<RawLog>, LedgerError> {
        if contract != self.market {
            return Ok(Vec::new());
        }
        let state = self.state();
        let from_block = state.block_number.saturating_sub(number_of_past_blocks);
        Ok(state
            .logs
            .iter()
            .filter(|log| log.event == event && log.block_number >= from_block)
            .cloned()
            .collect())
    }

    async fn subscribe(
        &self,
        contract: Address,
        event: &str,
    ) -> Result<mpsc::UnboundedReceiver<RawLog>, LedgerError> {
        let (tx, rx) = mpsc::unbounded_channel();
        if contract == self.market {
            self.state().subscribers.push((event.to_string(), tx));
            debug!(market = %self.market, event, "Sandbox subscription opened");
        }
        // For any other contract the sender drops here and the stream ends at once.
        Ok(rx)
    }
}

#[async_trait]
impl TokenApprover for SandboxLedger {
    async fn approve(
        &self,
        token: Address,
        spender: Address,
        spender_name: &str,
    ) -> Result<(), LedgerError> {
        info!(%token, %spender, spender_name, "Sandbox approval recorded");
        self.state().approvals.push((token, spender));
        Ok(())
    }
}

impl std::fmt::Debug for SandboxLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("SandboxLedger")
            .field("market", &self.market)
            .field("kind", &self.kind)
            .field("last_offer_id", &state.last_offer_id)
            .field("active", &state.offers.len())
            .field("block_number", &state.block_number)
            .finish()
    }
}
