// Shared harness so tests can `use crate::helpers::*;`
#![allow(dead_code)]

use std::sync::Arc;

use feedline::{
    Client, ConnectionParams, Inbound, Inbox, ProductType, RequestId, SecurityRecord,
    SessionConfig, ShutdownTrigger,
};
use feedline_mock::{MockStore, MockTransport, MockTransportController, RecordingLog, fixtures};

pub use feedline_mock::frames;

/// Common symbol constants used across tests.
pub const ABC: &str = "ABC";
pub const ES: &str = "ES";

/// Client wired to mock collaborators, plus handles to drive and inspect them.
pub struct Harness {
    pub client: Client,
    pub transport: MockTransportController,
    pub store: Arc<MockStore>,
    pub log: Arc<RecordingLog>,
    pub stop: ShutdownTrigger,
}

pub fn params() -> ConnectionParams {
    ConnectionParams::new("127.0.0.1", 4002, 7)
}

/// Harness over the fixture universe (ABC and ES enabled, XYZ disabled).
pub fn harness(realtime: bool, historical: bool) -> Harness {
    harness_with(realtime, historical, fixtures::securities())
}

/// Harness over a custom universe.
pub fn harness_with(realtime: bool, historical: bool, universe: Vec<SecurityRecord>) -> Harness {
    let cfg = SessionConfig {
        realtime,
        historical,
        ..SessionConfig::default()
    };
    harness_cfg(cfg, universe)
}

/// Harness with a full session configuration.
pub fn harness_cfg(cfg: SessionConfig, universe: Vec<SecurityRecord>) -> Harness {
    let (transport, controller) = MockTransport::new_with_controller();
    let store = Arc::new(MockStore::new(universe));
    let log = Arc::new(RecordingLog::new());
    let stop = ShutdownTrigger::new();
    let client = Client::builder()
        .transport(transport)
        .store(store.clone())
        .log(log.clone())
        .connection(params())
        .config(cfg)
        .shutdown(stop.clone())
        .build()
        .expect("client builds");
    Harness {
        client,
        transport: controller,
        store,
        log,
        stop,
    }
}

/// Enabled stock records for each symbol.
pub fn stocks(symbols: &[&str]) -> Vec<SecurityRecord> {
    symbols
        .iter()
        .map(|s| SecurityRecord::new(*s, ProductType::Stock, "NASDAQ", true))
        .collect()
}

impl Harness {
    /// Connect and hand the gateway's first valid id to the client.
    ///
    /// Keep the returned inbox alive for the duration of the test.
    pub async fn start(&mut self, first_id: i64) -> Inbox {
        let inbox = self.client.connect().await.expect("connect");
        self.client
            .dispatch(Inbound::NextValidId { order_id: first_id })
            .await
            .expect("nextValidId");
        inbox
    }

    /// Deliver the fixture contract details for `symbol` under `req_id`.
    pub async fn answer_contract(&mut self, req_id: RequestId, symbol: &str) {
        self.client
            .dispatch(Inbound::ContractDetails {
                req_id,
                details: fixtures::contract_for(symbol),
            })
            .await
            .expect("contractDetails");
    }
}
