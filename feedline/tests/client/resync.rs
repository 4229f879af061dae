use std::collections::HashSet;
use std::time::Duration;

use feedline::{
    BackoffConfig, Bar, FeedlineError, Inbound, LogLevel, ProductType, RequestId, RequestKind,
    SecurityRecord, SessionConfig,
};
use feedline_core::TickAttrib;

use crate::helpers::*;

#[tokio::test]
async fn bootstrap_looks_up_enabled_instruments_only() {
    let mut h = harness(true, true);
    let _inbox = h.start(100).await;

    assert_eq!(
        h.transport.sent_symbols(RequestKind::ContractLookup).await,
        vec![ABC.to_string(), ES.to_string()]
    );
    assert_eq!(
        h.transport.sent_ids(RequestKind::ContractLookup).await,
        vec![RequestId(100), RequestId(101)]
    );
    assert!(h.log.contains(LogLevel::Info, "start for realtime true and historical true"));
    assert_eq!(h.store.list_calls().await, 1);
}

#[tokio::test]
async fn future_lookups_are_normalized() {
    let mut h = harness(false, false);
    let _inbox = h.start(100).await;
    let table = h.client.registry().table(RequestKind::ContractLookup);
    let es = table.get(RequestId(101)).unwrap();
    assert_eq!(es.instrument.product_type, ProductType::Future);
    assert_eq!(es.instrument.trading_class, ES);
    let abc = table.get(RequestId(100)).unwrap();
    assert_eq!(abc.instrument.trading_class, "");
}

#[tokio::test(start_paused = true)]
async fn transient_absence_is_retried_with_backoff() {
    let mut h = harness(false, false);
    h.store.set_misses(3).await;
    let started = tokio::time::Instant::now();

    let _inbox = h.start(100).await;

    assert_eq!(h.store.list_calls().await, 4);
    assert_eq!(started.elapsed(), Duration::from_secs(2 + 4 + 8));
    assert_eq!(
        h.transport.sent_ids(RequestKind::ContractLookup).await.len(),
        2
    );
}

#[tokio::test(start_paused = true)]
async fn exhausted_universe_issues_nothing() {
    let mut h = harness(false, false);
    h.store.set_misses(usize::MAX).await;
    let started = tokio::time::Instant::now();

    let _inbox = h.start(100).await;

    assert_eq!(h.store.list_calls().await, 11);
    assert_eq!(started.elapsed(), Duration::from_secs(2046));
    assert!(h.transport.sent().await.is_empty());
    assert!(h.log.contains(LogLevel::Error, "instrument universe unavailable"));
}

#[tokio::test(start_paused = true)]
async fn store_errors_count_as_absence() {
    let cfg = SessionConfig {
        backoff: BackoffConfig {
            max_attempts: 2,
            ..BackoffConfig::default()
        },
        ..SessionConfig::default()
    };
    let mut h = harness_cfg(cfg, fixtures_universe());
    h.store
        .fail_list(Some(FeedlineError::store("mock-store", "unreachable")))
        .await;

    let _inbox = h.start(100).await;

    assert_eq!(h.store.list_calls().await, 3);
    assert_eq!(
        h.log
            .messages(LogLevel::Error)
            .iter()
            .filter(|m| m.contains("unreachable"))
            .count(),
        3
    );
    assert!(h.transport.sent().await.is_empty());
}

fn fixtures_universe() -> Vec<SecurityRecord> {
    feedline_mock::fixtures::securities()
}

#[tokio::test]
async fn verify_twice_reissues_the_same_set_twice() {
    let mut h = harness(true, true);
    let _inbox = h.start(100).await;
    h.transport.clear_sent().await;

    let first = h.client.verify().await.unwrap();
    let second = h.client.verify().await.unwrap();

    assert_eq!(first.contracts, 2);
    assert_eq!(second.contracts, 2);
    assert_eq!(h.transport.probe_count().await, 2);
    assert_eq!(
        h.transport.sent_symbols(RequestKind::ContractLookup).await,
        vec![ABC, ES, ABC, ES]
    );
    assert_eq!(
        h.transport.sent_ids(RequestKind::ContractLookup).await,
        vec![RequestId(102), RequestId(103), RequestId(104), RequestId(105)]
    );
    let table = h.client.registry().table(RequestKind::ContractLookup);
    assert_eq!(table.len(), 2);
    assert!(table.contains(RequestId(104)) && table.contains(RequestId(105)));
}

#[tokio::test]
async fn verify_before_seeding_only_probes() {
    let mut h = harness(true, true);
    let _inbox = h.client.connect().await.unwrap();

    let summary = h.client.verify().await.unwrap();

    assert!(summary.is_empty());
    assert_eq!(h.transport.sent().await.len(), 1);
    assert_eq!(h.transport.probe_count().await, 1);
}

async fn first_tick(h: &mut Harness, req_id: i64) {
    h.client
        .dispatch(Inbound::TickPrice {
            req_id: RequestId(req_id),
            tick_type: feedline::TickType::LAST,
            price: 1.0,
            attrib: TickAttrib::default(),
        })
        .await
        .unwrap();
}

async fn first_bar(h: &mut Harness, req_id: i64) {
    h.client
        .dispatch(Inbound::HistoricalData {
            req_id: RequestId(req_id),
            bar: Bar {
                date: "20240105".into(),
                open: 1.0,
                high: 1.0,
                low: 1.0,
                close: 1.0,
                volume: 1,
                bar_count: 1,
            },
        })
        .await
        .unwrap();
}

fn table_ids(h: &Harness, kind: RequestKind) -> Vec<RequestId> {
    h.client
        .registry()
        .table(kind)
        .iter()
        .map(|r| r.id)
        .collect()
}

#[tokio::test]
async fn reconnect_replays_unfinished_requests_under_fresh_ids() {
    let mut h = harness_with(true, true, stocks(&["AAA", "BBB", "CCC"]));
    let _inbox = h.start(100).await;
    for (id, sym) in [(100, "AAA"), (101, "BBB"), (102, "CCC")] {
        h.answer_contract(RequestId(id), sym).await;
    }
    // Market data 103/105/107, historical 104/106/108; two of them have
    // started streaming.
    first_tick(&mut h, 103).await;
    first_bar(&mut h, 106).await;

    let used: HashSet<RequestId> = h
        .transport
        .sent()
        .await
        .iter()
        .filter_map(|r| r.correlation().map(|(id, _)| id))
        .collect();
    assert_eq!(used.len(), 9);

    h.client.disconnect().await;
    h.transport.clear_sent().await;
    let _inbox2 = h.start(1).await;

    let md = h.transport.sent_ids(RequestKind::MarketData).await;
    let hist = h.transport.sent_ids(RequestKind::Historical).await;
    assert_eq!(
        hist,
        vec![RequestId(109), RequestId(110), RequestId(111)]
    );
    assert_eq!(md, vec![RequestId(112), RequestId(113), RequestId(114)]);
    assert!(
        h.transport
            .sent_ids(RequestKind::ContractLookup)
            .await
            .is_empty()
    );
    let fresh: HashSet<RequestId> = md.iter().chain(hist.iter()).copied().collect();
    assert!(fresh.is_disjoint(&used));

    assert_eq!(
        h.transport.sent_symbols(RequestKind::MarketData).await,
        vec!["AAA", "BBB", "CCC"]
    );
    assert_eq!(
        h.transport.sent_symbols(RequestKind::Historical).await,
        vec!["AAA", "BBB", "CCC"]
    );
    assert!(h.client.registry().table(RequestKind::ContractLookup).is_empty());
    assert_eq!(table_ids(&h, RequestKind::MarketData), md);
    assert_eq!(table_ids(&h, RequestKind::Historical), hist);
}

#[tokio::test]
async fn streams_cut_mid_way_are_requested_again_on_every_reconnect() {
    let mut h = harness_with(true, true, stocks(&[ABC]));
    let _inbox = h.start(100).await;
    h.answer_contract(RequestId(100), ABC).await;
    h.client
        .dispatch(Inbound::ContractDetailsEnd {
            req_id: RequestId(100),
        })
        .await
        .unwrap();
    first_tick(&mut h, 101).await;
    first_bar(&mut h, 102).await;

    for (hist_id, md_id) in [(103, 104), (105, 106), (107, 108)] {
        h.client.disconnect().await;
        h.transport.clear_sent().await;
        let _inbox = h.start(1).await;

        assert_eq!(
            h.transport.sent_ids(RequestKind::Historical).await,
            vec![RequestId(hist_id)]
        );
        assert_eq!(
            h.transport.sent_ids(RequestKind::MarketData).await,
            vec![RequestId(md_id)]
        );
        assert!(
            h.transport
                .sent_ids(RequestKind::ContractLookup)
                .await
                .is_empty()
        );
        assert_eq!(
            table_ids(&h, RequestKind::Historical),
            vec![RequestId(hist_id)]
        );
        assert_eq!(
            table_ids(&h, RequestKind::MarketData),
            vec![RequestId(md_id)]
        );

        // The new streams start before the next cut.
        first_tick(&mut h, md_id).await;
        first_bar(&mut h, hist_id).await;
    }
    assert!(h.log.contains(LogLevel::Info, "2 interrupted stream(s) queued for replay"));
}

#[tokio::test]
async fn reconnect_bootstrap_skips_tracked_symbols() {
    let mut h = harness(false, false);
    let _inbox = h.start(100).await;
    h.answer_contract(RequestId(100), ABC).await;

    h.client.disconnect().await;
    h.transport.clear_sent().await;
    let _inbox2 = h.start(100).await;

    // ABC is subscribed, ES still pending: only ES is looked up again, by replay.
    assert_eq!(
        h.transport.sent_symbols(RequestKind::ContractLookup).await,
        vec![ES]
    );
    assert_eq!(
        h.transport.sent_ids(RequestKind::ContractLookup).await,
        vec![RequestId(102)]
    );
    assert_eq!(h.store.list_calls().await, 2);
}

#[tokio::test]
async fn repeated_next_valid_id_only_reseeds() {
    let mut h = harness(false, false);
    let _inbox = h.start(100).await;

    h.client
        .dispatch(Inbound::NextValidId { order_id: 100 })
        .await
        .unwrap();

    assert_eq!(h.store.list_calls().await, 1);
    assert_eq!(h.transport.sent().await.len(), 2);
    assert_eq!(h.client.ids().requests().peek(), Some(102));
}

#[tokio::test]
async fn id_exhaustion_surfaces_as_error() {
    let mut h = harness(false, false);
    let _inbox = h.client.connect().await.unwrap();

    let err = h
        .client
        .dispatch(Inbound::NextValidId {
            order_id: i64::MAX - 1,
        })
        .await
        .unwrap_err();

    assert_eq!(err, FeedlineError::IdSpaceExhausted);
    assert_eq!(
        h.transport.sent_ids(RequestKind::ContractLookup).await,
        vec![RequestId(i64::MAX - 1)]
    );
}
