#![allow(dead_code)]

use std::time::Duration;

use serde_json::{json, Value};
use sniffer_server::config::InspectorConfig;
use sniffer_server::frame::ViewFrame;
use sniffer_server::{start_inspector, AppState};
use sniffer_types::{Record, RecordId};
use tokio::task::JoinHandle;

pub fn record(id: RecordId, direction: &str, method: &str) -> Record {
    serde_json::from_value(record_json(id, direction, method)).expect("fixture should decode")
}

pub fn record_json(id: RecordId, direction: &str, method: &str) -> Value {
    json!({
        "message_id": id,
        "direction": direction,
        "time": "2024-05-01T10:20:30.123Z",
        "method": method,
        "message": "helloworld.HelloRequest",
        "peer_address": "127.0.0.1:50122",
        "content": { "name": "world" }
    })
}

/// Starts an inspector that refreshes quickly enough for tests.
pub fn test_state() -> (AppState, JoinHandle<()>) {
    let config = InspectorConfig {
        refresh_delay_ms: 10,
        ..InspectorConfig::default()
    };
    start_inspector(&config).expect("default engine should resolve")
}

/// Waits until the latest rendered frame satisfies `pred`.
pub async fn wait_for_frame(state: &AppState, pred: impl Fn(&ViewFrame) -> bool) -> ViewFrame {
    let mut rx = state.latest.clone();
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            {
                let frame = rx.borrow_and_update();
                if pred(&frame) {
                    return ViewFrame::clone(&frame);
                }
            }
            rx.changed().await.expect("inspector should keep rendering");
        }
    })
    .await
    .expect("expected frame should render")
}
