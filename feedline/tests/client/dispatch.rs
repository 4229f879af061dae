use feedline::{
    Bar, ContractDetails, FeedlineError, Inbound, LogLevel, OutboundRequest, RequestId,
    RequestKind, TickType,
};
use feedline_core::{MarketDataType, TickAttrib};
use feedline_mock::fixtures;
use rust_decimal::Decimal;

use crate::helpers::*;

fn bar(date: &str) -> Bar {
    Bar {
        date: date.into(),
        open: 1.1,
        high: 2.25,
        low: 0.95,
        close: 2.0,
        volume: 1_200,
        bar_count: 17,
    }
}

#[tokio::test]
async fn abc_lookup_then_market_data_101_and_historical_102() {
    let mut h = harness_with(true, true, stocks(&[ABC]));
    let _inbox = h.start(100).await;

    assert_eq!(
        h.transport.sent_ids(RequestKind::ContractLookup).await,
        vec![RequestId(100)]
    );

    h.answer_contract(RequestId(100), ABC).await;

    assert_eq!(
        h.transport.sent_ids(RequestKind::MarketData).await,
        vec![RequestId(101)]
    );
    assert_eq!(
        h.transport.sent_ids(RequestKind::Historical).await,
        vec![RequestId(102)]
    );
    let reg = h.client.registry();
    let md = reg.table(RequestKind::MarketData).get(RequestId(101)).unwrap();
    let hist = reg.table(RequestKind::Historical).get(RequestId(102)).unwrap();
    assert_eq!(md.instrument.symbol, ABC);
    assert_eq!(hist.instrument.symbol, ABC);
    assert!(!reg.table(RequestKind::ContractLookup).is_pending(RequestId(100)));
    assert_eq!(reg.subscriptions().count(), 1);
}

#[tokio::test]
async fn disabled_flags_skip_follow_up_requests() {
    let mut h = harness_with(false, false, stocks(&[ABC]));
    let _inbox = h.start(100).await;
    h.answer_contract(RequestId(100), ABC).await;

    let sent = h.transport.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(h.client.registry().subscriptions().count(), 1);
}

#[tokio::test]
async fn unknown_contract_details_change_nothing() {
    let mut h = harness(true, true);
    let _inbox = h.start(100).await;
    let before_registry = h.client.registry().clone();
    let before_sent = h.transport.sent().await;

    h.answer_contract(RequestId(999), ABC).await;

    assert_eq!(h.client.registry(), &before_registry);
    assert_eq!(h.transport.sent().await, before_sent);
    assert!(h.log.contains(LogLevel::Warning, "unknown request id 999"));
}

#[tokio::test]
async fn unknown_ids_are_guarded_for_bars_and_ticks() {
    let mut h = harness(true, true);
    let _inbox = h.start(100).await;
    let before = h.client.registry().clone();

    for msg in [
        Inbound::HistoricalData {
            req_id: RequestId(500),
            bar: bar("20240105"),
        },
        Inbound::TickPrice {
            req_id: RequestId(501),
            tick_type: TickType::LAST,
            price: 10.0,
            attrib: TickAttrib::default(),
        },
        Inbound::TickSize {
            req_id: RequestId(502),
            tick_type: TickType::LAST_SIZE,
            size: 3,
        },
    ] {
        h.client.dispatch(msg).await.expect("guarded");
    }

    assert_eq!(h.client.registry(), &before);
    assert!(h.store.upserts().await.is_empty());
    assert_eq!(h.log.count(LogLevel::Warning), 3);
}

#[tokio::test]
async fn mismatched_contract_details_are_dropped() {
    let mut h = harness_with(true, true, stocks(&[ABC]));
    let _inbox = h.start(100).await;

    h.client
        .dispatch(Inbound::ContractDetails {
            req_id: RequestId(100),
            details: fixtures::contract_for("ABD"),
        })
        .await
        .unwrap();

    assert!(h.transport.sent_ids(RequestKind::MarketData).await.is_empty());
    assert!(
        h.client
            .registry()
            .table(RequestKind::ContractLookup)
            .is_pending(RequestId(100))
    );
    assert!(h.log.contains(LogLevel::Warning, "does not match"));
}

#[tokio::test]
async fn market_name_match_is_accepted() {
    let mut h = harness_with(true, false, stocks(&["NMS"]));
    let _inbox = h.start(100).await;

    // Returned symbol differs, but the market name equals the requested symbol.
    h.client
        .dispatch(Inbound::ContractDetails {
            req_id: RequestId(100),
            details: fixtures::contract_for("ABC"),
        })
        .await
        .unwrap();

    assert_eq!(
        h.transport.sent_ids(RequestKind::MarketData).await,
        vec![RequestId(101)]
    );
}

#[tokio::test]
async fn future_details_get_symbol_as_trading_class() {
    let mut h = harness_with(true, false, fixtures::securities()[1..2].to_vec());
    let _inbox = h.start(100).await;

    let mut details = fixtures::contract_for(ES);
    details.contract.trading_class = "XX".into();
    h.client
        .dispatch(Inbound::ContractDetails {
            req_id: RequestId(100),
            details,
        })
        .await
        .unwrap();

    let sent = h.transport.sent().await;
    let Some(OutboundRequest::MarketData { instrument, .. }) = sent.last() else {
        panic!("expected market data request, got {sent:?}");
    };
    assert_eq!(instrument.trading_class, ES);
    assert_eq!(instrument.local_symbol, "ESZ6");
}

#[tokio::test]
async fn stock_details_keep_their_trading_class() {
    let mut h = harness_with(true, false, stocks(&[ABC]));
    let _inbox = h.start(100).await;
    h.answer_contract(RequestId(100), ABC).await;

    let sent = h.transport.sent().await;
    let Some(OutboundRequest::MarketData { instrument, .. }) = sent.last() else {
        panic!("expected market data request, got {sent:?}");
    };
    assert_eq!(instrument.trading_class, "NMS");
}

#[tokio::test]
async fn historical_bar_is_upserted_once_and_leaves_pending() {
    let mut h = harness_with(false, true, stocks(&[ABC]));
    let _inbox = h.start(100).await;
    h.answer_contract(RequestId(100), ABC).await;
    let hist_id = RequestId(101);

    h.client
        .dispatch(Inbound::HistoricalData {
            req_id: hist_id,
            bar: bar("20240105"),
        })
        .await
        .unwrap();

    let upserts = h.store.upserts().await;
    assert_eq!(upserts.len(), 1);
    let q = &upserts[0];
    assert_eq!(q.symbol, ABC);
    assert_eq!(q.date, "20240105");
    assert_eq!(q.open, "1.1".parse::<Decimal>().unwrap());
    assert_eq!(q.high, "2.25".parse::<Decimal>().unwrap());
    assert_eq!(q.low, "0.95".parse::<Decimal>().unwrap());
    assert_eq!(q.close, Decimal::from(2));
    assert_eq!(q.volume, 1_200);
    assert_eq!(q.count, 17);
    assert_eq!(q.source, "IB");

    let table = h.client.registry().table(RequestKind::Historical);
    assert!(table.contains(hist_id));
    assert!(!table.is_pending(hist_id));
    assert!(h.log.contains(LogLevel::Debug, "\"Symbol\": \"ABC\""));

    h.client
        .dispatch(Inbound::HistoricalDataEnd {
            req_id: hist_id,
            start: "20240104".into(),
            end: "20240105".into(),
        })
        .await
        .unwrap();
    assert!(
        !h.client
            .registry()
            .table(RequestKind::Historical)
            .contains(hist_id)
    );
}

#[tokio::test]
async fn quotes_are_labelled_with_the_local_symbol() {
    let mut h = harness_with(false, true, fixtures::securities()[1..2].to_vec());
    let _inbox = h.start(100).await;
    h.answer_contract(RequestId(100), ES).await;

    h.client
        .dispatch(Inbound::HistoricalData {
            req_id: RequestId(101),
            bar: bar("20240105"),
        })
        .await
        .unwrap();

    assert!(h.store.quote("ESZ6", "20240105").await.is_some());
}

#[tokio::test]
async fn store_failure_is_logged_and_abandoned() {
    let mut h = harness_with(false, true, stocks(&[ABC]));
    let _inbox = h.start(100).await;
    h.answer_contract(RequestId(100), ABC).await;
    h.store
        .fail_upserts(Some(FeedlineError::store("mock-store", "write refused")))
        .await;

    let res = h
        .client
        .dispatch(Inbound::HistoricalData {
            req_id: RequestId(101),
            bar: bar("20240105"),
        })
        .await;

    assert!(res.is_ok());
    assert!(h.store.upserts().await.is_empty());
    assert!(h.log.contains(LogLevel::Error, "write refused"));
}

#[tokio::test]
async fn non_finite_bar_is_abandoned() {
    let mut h = harness_with(false, true, stocks(&[ABC]));
    let _inbox = h.start(100).await;
    h.answer_contract(RequestId(100), ABC).await;

    let mut broken = bar("20240105");
    broken.close = f64::INFINITY;
    h.client
        .dispatch(Inbound::HistoricalData {
            req_id: RequestId(101),
            bar: broken,
        })
        .await
        .unwrap();

    assert!(h.store.upserts().await.is_empty());
    assert_eq!(h.log.count(LogLevel::Error), 1);
}

#[tokio::test]
async fn price_ticks_answer_sizes_do_not_and_snapshot_end_removes() {
    let mut h = harness_with(true, false, stocks(&[ABC]));
    let _inbox = h.start(100).await;
    h.answer_contract(RequestId(100), ABC).await;
    let md = RequestId(101);

    h.client
        .dispatch(Inbound::TickSize {
            req_id: md,
            tick_type: TickType::BID_SIZE,
            size: 300,
        })
        .await
        .unwrap();
    assert!(h.client.registry().table(RequestKind::MarketData).is_pending(md));

    h.client
        .dispatch(Inbound::TickPrice {
            req_id: md,
            tick_type: TickType::BID,
            price: 10.25,
            attrib: TickAttrib::from_mask(1),
        })
        .await
        .unwrap();
    let table = h.client.registry().table(RequestKind::MarketData);
    assert!(table.contains(md) && !table.is_pending(md));
    assert!(h.log.contains(LogLevel::Info, "TickPrice. TickerId: 101 ABC tickType: BID"));

    h.client
        .dispatch(Inbound::TickSnapshotEnd { req_id: md })
        .await
        .unwrap();
    assert!(!h.client.registry().table(RequestKind::MarketData).contains(md));
}

#[tokio::test]
async fn contract_end_removes_and_flags_unanswered_lookups() {
    let mut h = harness(false, false);
    let _inbox = h.start(100).await;
    h.answer_contract(RequestId(100), ABC).await;

    h.client
        .dispatch(Inbound::ContractDetailsEnd {
            req_id: RequestId(100),
        })
        .await
        .unwrap();
    h.client
        .dispatch(Inbound::ContractDetailsEnd {
            req_id: RequestId(101),
        })
        .await
        .unwrap();

    assert!(h.client.registry().table(RequestKind::ContractLookup).is_empty());
    assert!(h.log.contains(LogLevel::Warning, "no matching contract for ES"));
}

#[tokio::test]
async fn informational_messages_never_fail() {
    let mut h = harness(false, false);
    let _inbox = h.start(100).await;

    for msg in [
        Inbound::Error {
            req_id: -1,
            code: 2104,
            message: "Market data farm connection is OK:usfarm".into(),
        },
        Inbound::Error {
            req_id: 100,
            code: 200,
            message: "No security definition has been found".into(),
        },
        Inbound::CurrentTime {
            time: 1_704_412_800,
        },
        Inbound::MarketDataType {
            req_id: RequestId(100),
            kind: MarketDataType::from(3),
        },
    ] {
        h.client.dispatch(msg).await.expect("logging only");
    }

    assert!(h.log.contains(LogLevel::Info, "Notice 2104"));
    assert!(h.log.contains(LogLevel::Error, "Id: 100 Code: 200"));
    assert!(h.log.contains(LogLevel::Info, "CurrentTime: 20240105 00:00:00"));
    assert!(h.log.contains(LogLevel::Info, "Type: DELAYED"));
}

#[tokio::test]
async fn details_for_other_kinds_do_not_resolve() {
    // A contract reply under a market-data id is not a known lookup.
    let mut h = harness_with(true, false, stocks(&[ABC]));
    let _inbox = h.start(100).await;
    h.answer_contract(RequestId(100), ABC).await;
    let details: ContractDetails = fixtures::contract_for(ABC);

    h.client
        .dispatch(Inbound::ContractDetails {
            req_id: RequestId(101),
            details,
        })
        .await
        .unwrap();

    assert_eq!(h.transport.sent_ids(RequestKind::MarketData).await.len(), 1);
    assert!(h.log.contains(LogLevel::Warning, "unknown request id 101"));
}
