use alloy_primitives::U256;
use async_trait::async_trait;
use mockall::mock;
use mockall::predicate::*;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};

use otc_market::events::MakeEvent;
use otc_market::ledger::{
    AbiValue, EventSource, LedgerConnection, LedgerError, LedgerQuery, PendingTransaction, RawLog,
    TransactionIntent, TransactionSubmitter,
};
use otc_market::market::{self, ExpiringMarket, Market, MarketKind, MatchingMarket, SimpleMarket};
use otc_market::sandbox::{SandboxLedger, SandboxOffer};
use otc_market::types::B256;
use otc_market::{Address, MarketError, OrderLookup, Wad};

// --- Mocks ---

// Adapter pattern: mockall mocks plain synchronous methods with owned
// arguments, and the async ledger traits delegate to them.

mock! {
    pub LedgerImpl {
        fn call_mock(&self, contract: Address, method: String, args: Vec<AbiValue>) -> Result<Vec<AbiValue>, LedgerError>;
        fn submit_mock(&self, intent: TransactionIntent) -> Result<PendingTransaction, LedgerError>;
    }
}

#[async_trait]
impl LedgerQuery for MockLedgerImpl {
    async fn call(
        &self,
        contract: Address,
        method: &str,
        args: &[AbiValue],
    ) -> Result<Vec<AbiValue>, LedgerError> {
        self.call_mock(contract, method.to_string(), args.to_vec())
    }
}

#[async_trait]
impl TransactionSubmitter for MockLedgerImpl {
    async fn submit(&self, intent: TransactionIntent) -> Result<PendingTransaction, LedgerError> {
        self.submit_mock(intent)
    }
}

#[async_trait]
impl EventSource for MockLedgerImpl {
    async fn past_logs(&self, _: Address, _: &str, _: u64) -> Result<Vec<RawLog>, LedgerError> {
        Ok(Vec::new())
    }

    async fn subscribe(&self, _: Address, _: &str) -> Result<mpsc::UnboundedReceiver<RawLog>, LedgerError> {
        Ok(mpsc::unbounded_channel().1)
    }
}

const MARKET: Address = Address::repeat_byte(0xee);
const ALICE: Address = Address::repeat_byte(0xa1);
const BOB: Address = Address::repeat_byte(0xb0);
const PAY: Address = Address::repeat_byte(0x01);
const BUY: Address = Address::repeat_byte(0x02);

fn wad(value: rust_decimal::Decimal) -> Wad {
    Wad::from_decimal(value).unwrap()
}

fn offers_tuple(active: bool, pay: Wad, buy: Wad) -> Vec<AbiValue> {
    vec![
        AbiValue::wad(pay),
        AbiValue::Address(PAY),
        AbiValue::wad(buy),
        AbiValue::Address(BUY),
        AbiValue::Address(ALICE),
        AbiValue::Bool(active),
        AbiValue::uint(1_600_000_000),
    ]
}

fn is_offers_for(id: u64) -> impl Fn(&Address, &String, &Vec<AbiValue>) -> bool {
    move |_, method, args| method == "offers" && args == &vec![AbiValue::uint(id)]
}

fn connect(mock: MockLedgerImpl) -> LedgerConnection {
    LedgerConnection::shared(Arc::new(mock))
}

// --- Order repository over a mocked ledger ---

#[tokio::test]
async fn test_inactive_order_is_queried_once() {
    let mut mock = MockLedgerImpl::new();
    mock.expect_call_mock()
        .withf(is_offers_for(3))
        .times(1)
        .returning(|_, _, _| Ok(offers_tuple(false, Wad::ZERO, Wad::ZERO)));

    let market = SimpleMarket::new(MARKET, connect(mock));
    assert!(market.get_order(3).await.unwrap().is_absent());
    assert!(market.get_order(3).await.unwrap().is_absent());
    assert_eq!(market.orders().absent_count(), 1);
}

#[tokio::test]
async fn test_active_order_is_not_cached() {
    let mut mock = MockLedgerImpl::new();
    mock.expect_call_mock()
        .withf(is_offers_for(1))
        .times(2)
        .returning(|_, _, _| Ok(offers_tuple(true, wad(dec!(10)), wad(dec!(4)))));

    let market = SimpleMarket::new(MARKET, connect(mock));
    for _ in 0..2 {
        let order = market.get_order(1).await.unwrap().into_option().unwrap();
        assert_eq!(order.maker, ALICE);
        assert_eq!(order.sell_to_buy_price(), wad(dec!(2.5)));
        assert_eq!(order.buy_to_sell_price(), Some(wad(dec!(0.4))));
    }
}

#[tokio::test]
async fn test_get_orders_skips_absent_ids_in_ascending_order() {
    let mut mock = MockLedgerImpl::new();
    mock.expect_call_mock()
        .withf(|_, method, _| method == "last_offer_id")
        .returning(|_, _, _| Ok(vec![AbiValue::uint(4)]));
    mock.expect_call_mock()
        .withf(|_, method, _| method == "offers")
        .returning(|_, _, args| {
            let AbiValue::Uint(id) = args[0] else {
                return Err(LedgerError::Decode("id".into()));
            };
            let active = id != U256::from(2u8);
            Ok(offers_tuple(active, Wad::from_number(1), Wad::from_number(1)))
        });

    let market = SimpleMarket::new(MARKET, connect(mock));
    let ids: Vec<u64> = market
        .get_orders()
        .await
        .unwrap()
        .iter()
        .map(|o| o.order_id)
        .collect();
    assert_eq!(ids, vec![1, 3, 4]);
}

#[tokio::test]
async fn test_no_orders_ever_created() {
    let mut mock = MockLedgerImpl::new();
    mock.expect_call_mock()
        .with(eq(MARKET), eq("last_offer_id".to_string()), always())
        .times(1)
        .returning(|_, _, _| Ok(vec![AbiValue::uint(0)]));

    let market = SimpleMarket::new(MARKET, connect(mock));
    assert!(market.get_orders().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_short_offers_response_is_query_failure() {
    let mut mock = MockLedgerImpl::new();
    mock.expect_call_mock()
        .returning(|_, _, _| Ok(vec![AbiValue::uint(1)]));

    let market = SimpleMarket::new(MARKET, connect(mock));
    let result = market.get_order(1).await;
    assert!(matches!(result, Err(MarketError::ExternalQueryFailed(LedgerError::Decode(_)))));
}

#[tokio::test]
async fn test_transport_failure_propagates() {
    let mut mock = MockLedgerImpl::new();
    mock.expect_call_mock()
        .returning(|_, _, _| Err(LedgerError::Transport("connection refused".into())));

    let market = MatchingMarket::new(MARKET, connect(mock));
    let result = market.position(PAY, Wad::from_number(1), BUY, Wad::from_number(1)).await;
    assert!(matches!(result, Err(MarketError::ExternalQueryFailed(LedgerError::Transport(_)))));
}

// --- Commands over a mocked ledger ---

#[tokio::test]
async fn test_zero_amount_orders_never_reach_the_ledger() {
    let cases = [
        (Wad::ZERO, Wad::from_number(1)),
        (Wad::from_number(1), Wad::ZERO),
        (Wad::ZERO, Wad::ZERO),
    ];
    for kind in [MarketKind::Simple, MarketKind::Expiring, MarketKind::Matching] {
        for (pay, buy) in cases {
            let mut mock = MockLedgerImpl::new();
            mock.expect_call_mock().never();
            mock.expect_submit_mock().never();

            let client = market::connect(kind, MARKET, connect(mock));
            let result = client.make(PAY, pay, BUY, buy).await;
            assert!(
                matches!(result, Err(MarketError::InvalidArgument(_))),
                "{} accepted pay={} buy={}",
                kind,
                pay,
                buy
            );
        }
    }
}

#[tokio::test]
async fn test_submission_failure_is_reported() {
    let mut mock = MockLedgerImpl::new();
    mock.expect_submit_mock()
        .times(1)
        .returning(|_| Err(LedgerError::Transport("node unavailable".into())));

    let market = SimpleMarket::new(MARKET, connect(mock));
    let result = market.kill(7).await;
    assert!(matches!(result, Err(MarketError::SubmissionFailed(_))));
}

#[tokio::test]
async fn test_take_intent_carries_bytes32_id_and_quantity() {
    let mut mock = MockLedgerImpl::new();
    mock.expect_submit_mock()
        .withf(|intent| {
            intent.contract == MARKET
                && intent.method == "take"
                && intent.args == vec![AbiValue::order_id(9), AbiValue::wad(Wad::from_number(2))]
        })
        .times(1)
        .returning(|intent| {
            Ok(PendingTransaction::resolved(
                B256::repeat_byte(9),
                Err(LedgerError::Rejected(format!("{} reverted", intent))),
            ))
        });

    let market = SimpleMarket::new(MARKET, connect(mock));
    let pending = market.take(9, Wad::from_number(2)).await.unwrap();
    assert_eq!(pending.transaction_hash, B256::repeat_byte(9));
    assert!(matches!(
        pending.wait().await,
        Err(MarketError::TransactionFailed(LedgerError::Rejected(_)))
    ));
}

// --- End to end against the sandbox ---

fn sandbox(kind: MarketKind) -> Arc<SandboxLedger> {
    Arc::new(SandboxLedger::new(MARKET, kind, ALICE))
}

fn seed(ledger: &SandboxLedger, pay: u64, buy: u64) -> u64 {
    ledger.insert_order(SandboxOffer {
        owner: ALICE,
        pay_token: PAY,
        pay_amount: Wad::from_number(pay),
        buy_token: BUY,
        buy_amount: Wad::from_number(buy),
        timestamp: 1_600_000_000,
    })
}

#[tokio::test]
async fn test_order_lifecycle() {
    let ledger = sandbox(MarketKind::Simple);
    let market = SimpleMarket::new(MARKET, LedgerConnection::shared(ledger.clone()));

    // Create
    let receipt = market
        .make(PAY, Wad::from_number(10), BUY, Wad::from_number(5))
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();
    let id = receipt
        .created_order_id()
        .expect("LogMake decodes")
        .expect("make emits LogMake");
    assert_eq!(id, 1);
    assert_eq!(market.get_last_order_id().await.unwrap(), 1);

    // Partial fill leaves the order open with reduced amounts
    ledger.set_sender(BOB);
    market.take(id, Wad::from_number(4)).await.unwrap().wait().await.unwrap();
    let order = market.get_order(id).await.unwrap().into_option().unwrap();
    assert_eq!(order.remaining_sell_amount(), Wad::from_number(6));
    assert_eq!(order.buy_amount, Wad::from_number(3));
    assert_eq!(order.maker, ALICE);

    // Full fill removes it
    market.take(id, Wad::from_number(6)).await.unwrap().wait().await.unwrap();
    assert_eq!(market.get_order(id).await.unwrap(), OrderLookup::Absent);
    assert!(market.get_orders().await.unwrap().is_empty());

    // Both fills are in the take history
    let takes: Vec<_> = market
        .past_take(100)
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.unwrap())
        .collect();
    assert_eq!(takes.len(), 2);
    assert_eq!(takes[0].taker, BOB);
    assert_eq!(takes[0].take_amount, Wad::from_number(4));
    assert_eq!(takes[0].give_amount, Wad::from_number(2));
    assert!(takes[0].origin.block_number < takes[1].origin.block_number);
}

#[tokio::test]
async fn test_only_owner_may_kill() {
    let ledger = sandbox(MarketKind::Simple);
    let id = seed(&ledger, 1, 1);
    let market = SimpleMarket::new(MARKET, LedgerConnection::shared(ledger.clone()));

    ledger.set_sender(BOB);
    let result = market.kill(id).await.unwrap().wait().await;
    assert!(matches!(result, Err(MarketError::TransactionFailed(LedgerError::Rejected(_)))));
    assert!(!market.get_order(id).await.unwrap().is_absent());

    ledger.set_sender(ALICE);
    market.kill(id).await.unwrap().wait().await.unwrap();
    assert!(market.get_order(id).await.unwrap().is_absent());

    let kills = market.past_kill(10).await.unwrap();
    assert_eq!(kills.len(), 1);
    assert_eq!(kills[0].as_ref().unwrap().order_id, id);
}

#[tokio::test]
async fn test_bump_reemits_order_data() {
    let ledger = sandbox(MarketKind::Simple);
    let id = seed(&ledger, 3, 2);
    let market = SimpleMarket::new(MARKET, LedgerConnection::shared(ledger));

    market.bump(id).await.unwrap().wait().await.unwrap();
    let bumps = market.past_bump(10).await.unwrap();
    let bump = bumps[0].as_ref().unwrap();
    assert_eq!(bump.order_id, id);
    assert_eq!(bump.pay_amount, Wad::from_number(3));
    assert_eq!(bump.maker, ALICE);
}

#[tokio::test]
async fn test_absent_cache_saves_queries() {
    let ledger = sandbox(MarketKind::Simple);
    for _ in 0..3 {
        seed(&ledger, 1, 1);
    }
    let market = SimpleMarket::new(MARKET, LedgerConnection::shared(ledger.clone()));
    market.kill(2).await.unwrap().wait().await.unwrap();

    assert_eq!(market.get_orders().await.unwrap().len(), 2);
    // last_offer_id + three offers lookups
    assert_eq!(ledger.query_count(), 4);

    ledger.reset_query_count();
    market.get_orders().await.unwrap();
    // id 2 is served from the cache
    assert_eq!(ledger.query_count(), 3);
}

#[tokio::test]
async fn test_on_make_delivers_new_orders() {
    let ledger = sandbox(MarketKind::Simple);
    let market = SimpleMarket::new(MARKET, LedgerConnection::shared(ledger));

    let (tx, mut rx) = mpsc::unbounded_channel::<MakeEvent>();
    let handle = market
        .on_make(move |event| {
            if let Ok(event) = event {
                let _ = tx.send(event);
            }
        })
        .await
        .unwrap();

    market
        .make(PAY, Wad::from_number(2), BUY, Wad::from_number(1))
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();

    let event = timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("event delivered")
        .expect("channel open");
    assert_eq!(event.order_id, 1);
    assert_eq!(event.maker, ALICE);
    assert_eq!(event.pay_amount, Wad::from_number(2));
    handle.abort();
}

#[tokio::test]
async fn test_matching_make_inserts_after_estimated_position() {
    let ledger = sandbox(MarketKind::Matching);
    seed(&ledger, 3, 1); // id 1, price 3
    seed(&ledger, 2, 1); // id 2, price 2
    seed(&ledger, 1, 1); // id 3, price 1
    let market = MatchingMarket::new(MARKET, LedgerConnection::shared(ledger.clone()));

    assert_eq!(
        market.position(PAY, wad(dec!(1.5)), BUY, Wad::from_number(1)).await.unwrap(),
        2
    );
    assert_eq!(
        market.position(PAY, Wad::from_number(5), BUY, Wad::from_number(1)).await.unwrap(),
        0
    );

    let client: &dyn Market = &market;
    let receipt = client
        .make(PAY, wad(dec!(1.5)), BUY, Wad::from_number(1))
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();
    assert_eq!(receipt.created_order_id(), Ok(Some(4)));
}

#[tokio::test]
async fn test_matching_flags_and_whitelist() {
    let ledger = sandbox(MarketKind::Matching);
    let market = MatchingMarket::new(MARKET, LedgerConnection::shared(ledger));

    assert!(market.is_buy_enabled().await.unwrap());
    market.set_buy_enabled(false).await.unwrap().wait().await.unwrap();
    assert!(!market.is_buy_enabled().await.unwrap());

    market.set_matching_enabled(false).await.unwrap().wait().await.unwrap();
    assert!(!market.is_matching_enabled().await.unwrap());

    market.add_token_pair_whitelist(PAY, BUY).await.unwrap().wait().await.unwrap();
    let other = Address::repeat_byte(0x03);
    let result = market
        .make_with_position(PAY, Wad::from_number(1), other, Wad::from_number(1), Some(0))
        .await
        .unwrap()
        .wait()
        .await;
    assert!(matches!(result, Err(MarketError::TransactionFailed(_))));
}

#[tokio::test]
async fn test_expiring_market_close() {
    let ledger = sandbox(MarketKind::Expiring);
    ledger.set_time(1_000);
    ledger.set_close_time(2_000);
    let id = seed(&ledger, 1, 1);
    let market = ExpiringMarket::new(MARKET, LedgerConnection::shared(ledger.clone()));

    assert_eq!(market.get_close_time().await.unwrap(), 2_000);
    assert!(!market.is_closed().await.unwrap());

    ledger.set_time(2_001);
    assert!(market.is_closed().await.unwrap());

    // Anyone may cancel once the market is closed
    ledger.set_sender(BOB);
    market.base().kill(id).await.unwrap().wait().await.unwrap();
    assert!(market.base().get_order(id).await.unwrap().is_absent());
}

#[tokio::test]
async fn test_simple_market_has_no_close_time() {
    let ledger = sandbox(MarketKind::Simple);
    let market = ExpiringMarket::new(MARKET, LedgerConnection::shared(ledger));
    assert!(matches!(
        market.is_closed().await,
        Err(MarketError::ExternalQueryFailed(LedgerError::UnknownMethod(_)))
    ));
}

#[tokio::test]
async fn test_approve_through_sandbox() {
    let ledger = sandbox(MarketKind::Matching);
    let market = MatchingMarket::new(MARKET, LedgerConnection::shared(ledger.clone()));

    market::approve(&market, &[PAY, BUY], ledger.as_ref()).await.unwrap();
    assert_eq!(ledger.approvals(), vec![(PAY, MARKET), (BUY, MARKET)]);
}
