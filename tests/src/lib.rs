//! Shared fixtures for the integration tests.

use dwgpt_core::backend::{BackendDriver, BackendKind, MockBackend};
use dwgpt_core::protocol::Record;
use dwgpt_core::state::ChatSession;
use serde_json::{json, Value};
use std::sync::Arc;

pub fn test_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime")
}

pub fn mock_session() -> (ChatSession, Arc<MockBackend>) {
    let mock = Arc::new(MockBackend::new());
    let driver = BackendDriver::new(BackendKind::Mock, mock.clone());
    (ChatSession::new(driver), mock)
}

pub fn record(value: Value) -> Record {
    value.as_object().cloned().expect("record must be a JSON object")
}

pub fn sample_shipments() -> Vec<Record> {
    vec![
        record(json!({
            "shipment_no": "ABC123",
            "pol": "Nhava Sheva",
            "pod": "Rotterdam",
            "carrier": "Maersk",
            "eta": "2024-05-02",
            "remarks": null
        })),
        record(json!({
            "shipment_no": "ABC124",
            "pol": "Mundra",
            "pod": "Hamburg",
            "carrier": "MSC",
            "eta": null,
            "remarks": "Held at customs, awaiting \"Form 13\""
        })),
    ]
}
