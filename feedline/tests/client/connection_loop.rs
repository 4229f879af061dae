use std::time::Duration;

use feedline::{
    FeedlineError, LogLevel, LoopExit, LoopState, RequestId, RequestKind, SessionConfig,
};
use feedline_mock::ConnectBehavior;
use tokio::time::sleep;

use crate::helpers::*;

fn closed(h: &Harness) -> bool {
    h.client
        .session()
        .is_some_and(|s| s.state() == LoopState::Closed)
}

#[tokio::test(start_paused = true)]
async fn oversized_frame_is_a_protocol_violation() {
    let cfg = SessionConfig {
        max_frame_len: 16,
        ..SessionConfig::default()
    };
    let mut h = harness_cfg(cfg, stocks(&[ABC]));
    h.transport
        .script_on_connect(vec![frames::next_valid_id(100), vec![b'x'; 64]])
        .await;

    let exit = h.client.run().await.unwrap();

    assert!(matches!(
        exit,
        LoopExit::ProtocolViolation(FeedlineError::OversizedFrame { .. })
    ));
    assert_eq!(h.transport.disconnect_count().await, 1);
    assert!(closed(&h));
    assert!(h.log.contains(LogLevel::Info, "session 1 closed: protocol violation"));
}

#[tokio::test(start_paused = true)]
async fn undecodable_frame_is_a_protocol_violation() {
    let mut h = harness(false, false);
    h.transport
        .script_on_connect(vec![frames::next_valid_id(100), vec![0xff, 0xfe, 0x00]])
        .await;

    let exit = h.client.run().await.unwrap();

    assert!(matches!(
        exit,
        LoopExit::ProtocolViolation(FeedlineError::Malformed(_))
    ));
    assert_eq!(h.transport.disconnect_count().await, 1);
}

#[tokio::test(start_paused = true)]
async fn shutdown_ends_the_loop_as_interrupted() {
    let mut h = harness(false, false);
    h.transport
        .script_on_connect(vec![frames::next_valid_id(100)])
        .await;
    let stop = h.stop.clone();

    let (exit, ()) = tokio::join!(h.client.run(), async move {
        sleep(Duration::from_secs(1)).await;
        stop.trigger();
    });

    assert_eq!(exit.unwrap(), LoopExit::Interrupted);
    assert_eq!(h.transport.disconnect_count().await, 1);
    assert!(closed(&h));
}

#[tokio::test(start_paused = true)]
async fn dropped_connection_is_connection_lost() {
    let mut h = harness(false, false);
    h.transport
        .script_on_connect(vec![frames::next_valid_id(100)])
        .await;
    let transport = h.transport.clone();

    let (exit, ()) = tokio::join!(h.client.run(), async move {
        sleep(Duration::from_secs(1)).await;
        transport.drop_connection().await;
    });

    assert_eq!(exit.unwrap(), LoopExit::ConnectionLost);
    assert_eq!(h.transport.disconnect_count().await, 1);
    assert!(h.log.contains(LogLevel::Error, "connection lost"));
}

#[tokio::test(start_paused = true)]
async fn idle_session_is_probed_and_replayed() {
    let mut h = harness(false, false);
    h.transport
        .script_on_connect(vec![frames::next_valid_id(100)])
        .await;
    let stop = h.stop.clone();

    let (exit, ()) = tokio::join!(h.client.run(), async move {
        sleep(Duration::from_secs(31)).await;
        stop.trigger();
    });

    assert_eq!(exit.unwrap(), LoopExit::Interrupted);
    assert_eq!(h.transport.probe_count().await, 1);
    assert_eq!(
        h.transport.sent_symbols(RequestKind::ContractLookup).await,
        vec![ABC, ES, ABC, ES]
    );
    assert!(h.log.contains(LogLevel::Info, "probing gateway"));
}

#[tokio::test(start_paused = true)]
async fn regular_traffic_suppresses_the_probe() {
    let mut h = harness(false, false);
    h.transport
        .script_on_connect(vec![frames::next_valid_id(100)])
        .await;
    let transport = h.transport.clone();
    let stop = h.stop.clone();

    let (exit, ()) = tokio::join!(h.client.run(), async move {
        for t in 1..=10 {
            sleep(Duration::from_secs(10)).await;
            transport
                .push_frame(frames::current_time(1_700_000_000 + t))
                .await;
        }
        // Let the loop dispatch the last frame before asking it to stop.
        sleep(Duration::from_secs(1)).await;
        stop.trigger();
    });

    assert_eq!(exit.unwrap(), LoopExit::Interrupted);
    assert_eq!(h.transport.probe_count().await, 0);
    let times = h
        .log
        .messages(LogLevel::Info)
        .into_iter()
        .filter(|m| m.starts_with("CurrentTime"))
        .count();
    assert_eq!(times, 10);
}

#[tokio::test(start_paused = true)]
async fn disconnect_after_run_does_not_release_twice() {
    let mut h = harness(false, false);
    h.stop.trigger();

    let exit = h.client.run().await.unwrap();
    h.client.disconnect().await;
    h.client.disconnect().await;

    assert_eq!(exit, LoopExit::Interrupted);
    assert_eq!(h.transport.disconnect_count().await, 1);
}

#[tokio::test]
async fn failed_connect_is_an_error() {
    let mut h = harness(false, false);
    h.transport
        .set_connect_behavior(ConnectBehavior::Fail(FeedlineError::transport(
            "mock",
            "connection refused",
        )))
        .await;

    let err = h.client.run().await.unwrap_err();

    assert!(matches!(err, FeedlineError::Transport { .. }));
    assert!(h.client.session().is_none());
    assert_eq!(h.transport.disconnect_count().await, 0);
}

#[tokio::test(start_paused = true)]
async fn shutdown_cuts_the_store_backoff_short() {
    let mut h = harness(false, false);
    h.store.set_misses(usize::MAX).await;
    h.transport
        .script_on_connect(vec![frames::next_valid_id(100)])
        .await;
    let stop = h.stop.clone();

    let (exit, ()) = tokio::join!(h.client.run(), async move {
        sleep(Duration::from_secs(5)).await;
        stop.trigger();
    });

    assert_eq!(exit.unwrap(), LoopExit::Interrupted);
    assert_eq!(h.store.list_calls().await, 2);
    assert!(h.transport.sent().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn second_run_replays_under_fresh_ids() {
    let mut h = harness(false, false);
    h.transport
        .script_on_connect(vec![frames::next_valid_id(100)])
        .await;

    for _ in 0..2 {
        let transport = h.transport.clone();
        let (exit, ()) = tokio::join!(h.client.run(), async move {
            sleep(Duration::from_secs(1)).await;
            transport.drop_connection().await;
        });
        assert_eq!(exit.unwrap(), LoopExit::ConnectionLost);
    }

    assert_eq!(
        h.transport.sent_ids(RequestKind::ContractLookup).await,
        vec![RequestId(100), RequestId(101), RequestId(102), RequestId(103)]
    );
    assert_eq!(h.transport.connects().await.len(), 2);
    assert_eq!(h.transport.disconnect_count().await, 2);
    assert_eq!(h.client.session().map(|s| s.generation()), Some(2));
    assert_eq!(h.store.list_calls().await, 2);
}
