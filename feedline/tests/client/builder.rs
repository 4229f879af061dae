use std::sync::Arc;
use std::time::Duration;

use feedline::{Client, FeedlineError, SessionConfig};
use feedline_mock::{MockStore, MockTransport, fixtures};

use crate::helpers::params;

#[test]
fn missing_transport_is_rejected() {
    let built = Client::builder()
        .store(Arc::new(MockStore::new(fixtures::securities())))
        .connection(params())
        .build();
    assert!(matches!(built, Err(FeedlineError::InvalidArg(m)) if m.contains("transport")));
}

#[test]
fn missing_store_is_rejected() {
    let (transport, _ctl) = MockTransport::new_with_controller();
    let built = Client::builder()
        .transport(transport)
        .connection(params())
        .build();
    assert!(matches!(built, Err(FeedlineError::InvalidArg(m)) if m.contains("store")));
}

#[test]
fn missing_connection_is_rejected() {
    let (transport, _ctl) = MockTransport::new_with_controller();
    let built = Client::builder()
        .transport(transport)
        .store(Arc::new(MockStore::new(Vec::new())))
        .build();
    assert!(matches!(built, Err(FeedlineError::InvalidArg(m)) if m.contains("connection")));
}

#[test]
fn zero_poll_interval_is_rejected() {
    let (transport, _ctl) = MockTransport::new_with_controller();
    let built = Client::builder()
        .transport(transport)
        .store(Arc::new(MockStore::new(Vec::new())))
        .connection(params())
        .poll_interval(Duration::ZERO)
        .build();
    assert!(matches!(built, Err(FeedlineError::InvalidArg(_))));
}

#[test]
fn setters_land_in_config() {
    let (transport, _ctl) = MockTransport::new_with_controller();
    let client = Client::builder()
        .transport(transport)
        .store(Arc::new(MockStore::new(Vec::new())))
        .connection(params())
        .realtime(true)
        .historical(false)
        .liveness_threshold(Duration::from_secs(5))
        .build()
        .unwrap();

    let cfg = client.config();
    assert!(cfg.realtime);
    assert!(!cfg.historical);
    assert_eq!(cfg.liveness_threshold, Duration::from_secs(5));
    assert_eq!(cfg.backoff, SessionConfig::default().backoff);
    assert!(client.session().is_none());
    assert!(!client.ids().is_seeded());
}

#[test]
fn default_trigger_reaches_the_context() {
    let (transport, _ctl) = MockTransport::new_with_controller();
    let client = Client::builder()
        .transport(transport)
        .store(Arc::new(MockStore::new(Vec::new())))
        .connection(params())
        .build()
        .unwrap();

    assert!(!client.context().is_shutting_down());
    client.shutdown_trigger().trigger();
    assert!(client.context().is_shutting_down());
}
