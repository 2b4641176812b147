//! Inspector task behaviour under tokio's paused clock.

use std::time::Duration;

use serde_json::json;
use sniffer_inspect::{actor, FilterStatus, Frame, InspectError, Inspector, Navigation};
use sniffer_query::ExprEngine;
use sniffer_types::{Record, RecordId};
use tokio::sync::mpsc;

fn record(id: RecordId, direction: &str) -> Record {
    serde_json::from_value(json!({
        "message_id": id,
        "direction": direction,
        "time": "2024-05-01T10:20:30.000Z",
        "method": "/helloworld.Greeter/SayHello",
        "message": "helloworld.HelloReply",
        "peer_address": "127.0.0.1:50122",
        "content": { "message": "Hello" }
    }))
    .expect("fixture should decode")
}

#[derive(Debug, PartialEq)]
struct Seen {
    cycle: u64,
    total: usize,
    visible: usize,
    selected: Option<RecordId>,
}

fn start() -> (actor::InspectorHandle, tokio::task::JoinHandle<()>, mpsc::UnboundedReceiver<Seen>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let inspector = Inspector::new(ExprEngine, move |frame: Frame<'_>| {
        let _ = tx.send(Seen {
            cycle: frame.cycle,
            total: frame.total,
            visible: frame.view.len(),
            selected: frame.selected,
        });
    });
    let (handle, task) = actor::spawn(inspector);
    (handle, task, rx)
}

#[tokio::test(start_paused = true)]
async fn thousand_appends_in_ten_millis_render_once() {
    let (handle, task, mut rx) = start();

    for id in 1..=1000 {
        handle.append(record(id, "send")).await.expect("append should succeed");
        if id % 100 == 0 {
            tokio::time::advance(Duration::from_millis(1)).await;
        }
    }
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert_eq!(
        rx.try_recv().expect("one refresh should have rendered"),
        Seen {
            cycle: 1,
            total: 1000,
            visible: 1000,
            selected: None
        }
    );
    assert!(rx.try_recv().is_err(), "burst should coalesce into one refresh");

    handle.shutdown().await.unwrap();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn steady_appends_refresh_at_most_once_per_delay() {
    let (handle, task, mut rx) = start();

    for id in 1..=20 {
        handle.append(record(id, "recv")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    handle.shutdown().await.unwrap();
    task.await.unwrap();

    let mut cycles = 0;
    while rx.recv().await.is_some() {
        cycles += 1;
    }
    // 20 appends spread over one second with a 250ms delay.
    assert!(cycles >= 3, "expected periodic refreshes, got {cycles}");
    assert!(cycles <= 1 + 1000 / 250, "too many refreshes: {cycles}");
}

#[tokio::test(start_paused = true)]
async fn shutdown_discards_pending_refresh() {
    let (handle, task, mut rx) = start();

    handle.append(record(1, "send")).await.unwrap();
    handle.shutdown().await.unwrap();
    task.await.unwrap();

    assert!(rx.recv().await.is_none(), "no frame should render after shutdown");
}

#[tokio::test(start_paused = true)]
async fn dropping_every_handle_stops_the_task() {
    let (handle, task, _rx) = start();
    let other = handle.clone();

    drop(handle);
    drop(other);
    tokio::time::timeout(Duration::from_secs(1), task)
        .await
        .expect("task should exit once handles are gone")
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn handle_reports_closed_after_shutdown() {
    let (handle, task, _rx) = start();
    let other = handle.clone();

    handle.shutdown().await.unwrap();
    task.await.unwrap();

    assert_eq!(other.clear().await, Err(InspectError::Closed));
    assert!(other.is_closed());
}

#[tokio::test(start_paused = true)]
async fn out_of_order_append_is_reported() {
    let (handle, task, _rx) = start();

    handle.append(record(5, "send")).await.unwrap();
    assert_eq!(
        handle.append(record(4, "send")).await,
        Err(InspectError::InvariantViolation {
            last: 5,
            attempted: 4
        })
    );
    assert_eq!(handle.append(record(6, "send")).await, Ok(2));

    handle.shutdown().await.unwrap();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn quick_filter_returns_generated_text() {
    let (handle, task, mut rx) = start();
    handle.append(record(1, "send")).await.unwrap();
    handle.append(record(2, "recv")).await.unwrap();

    let (text, status) = handle
        .quick_filter("direction", json!("recv"))
        .await
        .expect("direction is a schema field");
    assert_eq!(text, r#"direction == "recv""#);
    assert_eq!(status, FilterStatus::Valid);

    assert_eq!(
        handle.quick_filter("status_code", json!(0)).await,
        Err(InspectError::UnknownField("status_code".into()))
    );

    tokio::time::sleep(Duration::from_secs(1)).await;
    let seen = rx.try_recv().unwrap();
    assert_eq!((seen.total, seen.visible), (2, 1));

    handle.shutdown().await.unwrap();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn navigation_walks_the_rendered_view() {
    let (handle, task, mut rx) = start();
    for id in 1..=3 {
        handle.append(record(id, "send")).await.unwrap();
    }
    tokio::time::sleep(Duration::from_secs(1)).await;

    let first = handle.navigate(Navigation::Next).await.unwrap();
    assert_eq!(first.map(|r| r.message_id), Some(1));
    let second = handle.navigate(Navigation::Next).await.unwrap();
    assert_eq!(second.map(|r| r.message_id), Some(2));
    let back = handle.navigate(Navigation::Previous).await.unwrap();
    assert_eq!(back.map(|r| r.message_id), Some(1));

    tokio::time::sleep(Duration::from_secs(1)).await;
    let mut last = None;
    while let Ok(seen) = rx.try_recv() {
        last = Some(seen);
    }
    assert_eq!(last.and_then(|s| s.selected), Some(1));

    handle.shutdown().await.unwrap();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn clear_after_filter_renders_empty_view() {
    let (handle, task, mut rx) = start();
    handle.append(record(1, "recv")).await.unwrap();
    handle.set_filter(r#"direction == "recv""#).await.unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    handle.select(1).await.unwrap();
    handle.clear().await.unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;

    let mut frames = Vec::new();
    while let Ok(seen) = rx.try_recv() {
        frames.push(seen);
    }
    let last = frames.last().expect("clear should render");
    assert_eq!((last.total, last.visible, last.selected), (0, 0, None));

    handle.shutdown().await.unwrap();
    task.await.unwrap();
}
