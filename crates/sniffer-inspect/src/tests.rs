//! Unit tests for the inspector core.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use serde_json::json;
use sniffer_query::{ExprEngine, KeywordEngine, PredicateEngine};
use sniffer_types::{Record, RecordId, Schema};
use tokio::time::Instant;

use crate::error::InspectError;
use crate::filter::{FilterController, FilterStatus};
use crate::scheduler::{UpdateScheduler, DEFAULT_REFRESH_DELAY};
use crate::selection::{Navigation, SelectionController};
use crate::session::{Frame, Inspector, Render};
use crate::store::RecordStore;

fn record(id: RecordId, direction: &str, method: &str) -> Record {
    serde_json::from_value(json!({
        "message_id": id,
        "direction": direction,
        "time": "2024-05-01T10:20:30.000Z",
        "method": method,
        "message": "helloworld.HelloRequest",
        "peer_address": "127.0.0.1:50122",
        "content": { "name": format!("caller-{id}") }
    }))
    .expect("fixture should decode")
}

fn failed(id: RecordId, error: &str) -> Record {
    let mut r = record(id, "send", "/helloworld.Greeter/SayHello");
    r.error = Some(error.to_string());
    r
}

/// What the render callback saw, with the view reduced to ids.
#[derive(Debug, Clone, PartialEq)]
struct Rendered {
    ids: Vec<RecordId>,
    selected: Option<RecordId>,
    status: FilterStatus,
    total: usize,
    cycle: u64,
}

type Frames = Rc<RefCell<Vec<Rendered>>>;

fn recorder() -> (Frames, impl FnMut(Frame<'_>)) {
    let frames = Frames::default();
    let sink = frames.clone();
    let render = move |frame: Frame<'_>| {
        sink.borrow_mut().push(Rendered {
            ids: frame.view.ids(),
            selected: frame.selected,
            status: frame.status.clone(),
            total: frame.total,
            cycle: frame.cycle,
        });
    };
    (frames, render)
}

fn inspector() -> (Inspector<ExprEngine, impl Render>, Frames) {
    let (frames, render) = recorder();
    (Inspector::new(ExprEngine, render), frames)
}

/// Runs the pending refresh at its deadline.
fn refresh<E: PredicateEngine, R: Render>(inspector: &mut Inspector<E, R>) -> bool {
    let due = inspector.next_deadline().expect("a refresh should be pending");
    inspector.poll(due)
}

fn store_of(records: impl IntoIterator<Item = Record>) -> RecordStore {
    let mut store = RecordStore::new();
    for r in records {
        store.append(r).expect("fixture ids are increasing");
    }
    store
}

// ── RecordStore ──────────────────────────────────────────────────────

#[test]
fn store_keeps_append_order() {
    let store = store_of([
        record(1, "send", "/a.A/X"),
        record(5, "recv", "/a.A/Y"),
        record(9, "send", "/a.A/Z"),
    ]);
    let ids: Vec<_> = store.snapshot().iter().map(|r| r.message_id).collect();
    assert_eq!(ids, vec![1, 5, 9]);
    assert_eq!(store.len(), 3);
    assert_eq!(store.get(5).map(|r| r.method.as_str()), Some("/a.A/Y"));
    assert!(store.get(4).is_none());
}

#[test]
fn store_rejects_non_increasing_id_and_stays_unchanged() {
    let mut store = store_of([record(1, "send", "/a.A/X"), record(2, "recv", "/a.A/X")]);

    for attempted in [2, 1] {
        let err = store
            .append(record(attempted, "send", "/a.A/X"))
            .expect_err("id should be rejected");
        assert_eq!(err, InspectError::InvariantViolation { last: 2, attempted });
    }
    assert_eq!(store.len(), 2);
    assert_eq!(store.last_id(), Some(2));
    assert_eq!(store.append(record(3, "send", "/a.A/X")), Ok(3));
}

#[test]
fn store_clear_keeps_high_water_mark() {
    let mut store = store_of([record(1, "send", "/a.A/X"), record(2, "recv", "/a.A/X")]);
    let generation = store.generation();

    store.clear();
    assert!(store.is_empty());
    assert_eq!(store.generation(), generation + 1);
    assert!(store.append(record(2, "send", "/a.A/X")).is_err());
    assert_eq!(store.append(record(3, "send", "/a.A/X")), Ok(1));
}

// ── FilterController ─────────────────────────────────────────────────

#[test]
fn empty_filter_shows_whole_store() {
    let store = store_of([record(1, "send", "/a.A/X"), record(2, "recv", "/a.A/Y")]);
    let mut filter = FilterController::new(ExprEngine, Schema::record());

    assert_eq!(filter.set_filter_text("   "), &FilterStatus::Empty);
    filter.recompute(&store);
    assert_eq!(filter.view().ids(), vec![1, 2]);
}

#[test]
fn syntax_error_empties_view_whatever_the_store() {
    let store = store_of([record(1, "send", "/a.A/X")]);
    let mut filter = FilterController::new(ExprEngine, Schema::record());

    let status = filter.set_filter_text(r#"direction == "#).clone();
    // Trimmed to `direction ==`; the missing operand is at the end.
    assert!(matches!(status, FilterStatus::SyntaxError { position: Some(12), .. }), "{status:?}");
    filter.recompute(&store);
    assert!(filter.view().is_empty());
    filter.recompute(&RecordStore::new());
    assert!(filter.view().is_empty());
}

#[test]
fn deeply_nested_filter_is_a_recoverable_syntax_error() {
    let store = store_of([record(1, "send", "/a.A/X")]);
    let mut filter = FilterController::new(ExprEngine, Schema::record());

    let nested = format!("{}true{}", "(".repeat(5_000), ")".repeat(5_000));
    let status = filter.set_filter_text(&nested).clone();
    assert!(matches!(status, FilterStatus::SyntaxError { .. }), "{status:?}");
    filter.recompute(&store);
    assert!(filter.view().is_empty());

    let status = filter.set_filter_text(&format!("{}true", "!".repeat(20_000))).clone();
    assert!(matches!(status, FilterStatus::SyntaxError { .. }), "{status:?}");

    assert_eq!(filter.set_filter_text("(true)"), &FilterStatus::Valid);
    filter.recompute(&store);
    assert_eq!(filter.view().ids(), vec![1]);
}

#[test]
fn type_error_empties_view() {
    let store = store_of([record(1, "send", "/a.A/X")]);
    let mut filter = FilterController::new(ExprEngine, Schema::record());

    let status = filter.set_filter_text("direction == 1").clone();
    assert!(matches!(status, FilterStatus::TypeError { .. }), "{status:?}");
    filter.recompute(&store);
    assert!(filter.view().is_empty());
}

#[test]
fn filter_text_is_trimmed() {
    let mut filter = FilterController::new(ExprEngine, Schema::record());
    filter.set_filter_text("  direction == \"send\"\n");
    assert_eq!(filter.text(), r#"direction == "send""#);
    assert_eq!(filter.status(), &FilterStatus::Valid);
}

#[test]
fn evaluation_errors_exclude_only_the_failing_record() {
    let store = store_of([
        record(1, "send", "/a.A/X"),
        failed(2, "rpc error: code = Internal"),
        record(3, "recv", "/a.A/X"),
    ]);
    let mut filter = FilterController::new(ExprEngine, Schema::record());

    assert_eq!(filter.set_filter_text(r#"error != """#), &FilterStatus::Valid);
    filter.recompute(&store);
    assert_eq!(filter.view().ids(), vec![2]);
}

#[test]
fn recompute_resumes_from_tail_until_store_is_cleared() {
    let mut store = store_of([record(1, "recv", "/a.A/X"), record(2, "send", "/a.A/X")]);
    let mut filter = FilterController::new(ExprEngine, Schema::record());
    filter.set_filter_text(r#"direction == "recv""#);

    filter.recompute(&store);
    assert_eq!(filter.view().ids(), vec![1]);

    store.append(record(3, "recv", "/a.A/X")).unwrap();
    store.append(record(4, "send", "/a.A/X")).unwrap();
    filter.recompute(&store);
    assert_eq!(filter.view().ids(), vec![1, 3]);

    store.clear();
    store.append(record(5, "recv", "/a.A/X")).unwrap();
    filter.recompute(&store);
    assert_eq!(filter.view().ids(), vec![5]);
}

#[test]
fn changing_filter_rescans_whole_store() {
    let store = store_of([record(1, "recv", "/a.A/X"), record(2, "send", "/a.A/X")]);
    let mut filter = FilterController::new(ExprEngine, Schema::record());

    filter.set_filter_text(r#"direction == "recv""#);
    filter.recompute(&store);
    assert_eq!(filter.view().ids(), vec![1]);

    filter.set_filter_text(r#"direction == "send""#);
    filter.recompute(&store);
    assert_eq!(filter.view().ids(), vec![2]);
}

#[test]
fn quick_filter_on_each_string_field_keeps_the_record() {
    // Padded on both sides: quick filter text is trimmed before parsing.
    let source = failed(7, r#"  desc = "quoted \ value" "#);
    let store = store_of([record(3, "recv", "/routeguide.RouteGuide/GetFeature"), source.clone()]);

    for engine in [sniffer_query::Engine::Expr(ExprEngine), sniffer_query::Engine::Keyword(KeywordEngine)] {
        let mut filter = FilterController::new(engine, Schema::record());
        for field in ["direction", "time", "method", "message", "peer_address", "error"] {
            let value = source.field(field).expect("fixture carries every string field");
            let status = filter.build_quick_filter(field, &value).clone();
            assert_eq!(status, FilterStatus::Valid, "{} quick filter on {field}", engine.name());
            filter.recompute(&store);
            assert!(
                filter.view().contains(7),
                "{} quick filter `{}` should keep the record",
                engine.name(),
                filter.text()
            );
        }
    }
}

// ── SelectionController ──────────────────────────────────────────────

fn view_of(ids: &[RecordId]) -> crate::View {
    let store = store_of(ids.iter().map(|&id| record(id, "send", "/a.A/X")));
    let mut filter = FilterController::new(ExprEngine, Schema::record());
    filter.recompute(&store);
    filter.view().clone()
}

#[test]
fn navigate_on_empty_view_is_a_no_op() {
    let mut selection = SelectionController::new();
    selection.select(4);
    assert!(selection.navigate(Navigation::Next, &view_of(&[])).is_none());
    assert_eq!(selection.selected(), Some(4));
}

#[test]
fn navigate_without_visible_selection_picks_first() {
    let view = view_of(&[2, 4, 6]);
    let mut selection = SelectionController::new();
    let picked = selection.navigate(Navigation::Previous, &view).map(|r| r.message_id);
    assert_eq!(picked, Some(2));

    selection.select(5);
    let picked = selection.navigate(Navigation::Next, &view).map(|r| r.message_id);
    assert_eq!(picked, Some(2));
}

#[test]
fn navigate_clamps_at_both_ends() {
    let view = view_of(&[2, 4, 6]);
    let mut selection = SelectionController::new();

    selection.select(6);
    for _ in 0..2 {
        selection.navigate(Navigation::Next, &view);
        assert_eq!(selection.selected(), Some(6));
    }

    selection.select(2);
    for _ in 0..2 {
        selection.navigate(Navigation::Previous, &view);
        assert_eq!(selection.selected(), Some(2));
    }

    selection.navigate(Navigation::Next, &view);
    assert_eq!(selection.selected(), Some(4));
}

#[test]
fn reconcile_drops_selection_missing_from_view() {
    let view = view_of(&[2, 4]);
    let mut selection = SelectionController::new();

    assert!(!selection.reconcile(&view));
    selection.select(4);
    assert!(!selection.reconcile(&view));
    assert_eq!(selection.selected(), Some(4));

    selection.select(3);
    assert!(selection.reconcile(&view));
    assert_eq!(selection.selected(), None);
}

// ── UpdateScheduler ──────────────────────────────────────────────────

#[test]
fn trigger_while_pending_keeps_first_deadline() {
    let start = Instant::now();
    let mut scheduler = UpdateScheduler::default();

    let deadline = scheduler.trigger(start).expect("live scheduler arms");
    assert_eq!(deadline, start + DEFAULT_REFRESH_DELAY);
    assert_eq!(scheduler.trigger(start + Duration::from_millis(200)), Some(deadline));

    assert!(!scheduler.take_due(start + Duration::from_millis(249)));
    assert!(scheduler.take_due(deadline));
    assert!(!scheduler.take_due(deadline));
    assert_eq!(scheduler.deadline(), None);
    assert_eq!(scheduler.cycles(), 1);
}

#[test]
fn steady_triggers_refresh_once_per_delay() {
    let start = Instant::now();
    let delay = Duration::from_millis(100);
    let mut scheduler = UpdateScheduler::new(delay);

    // One trigger and one due-check every 10ms for one second.
    for step in 0..=100u32 {
        let now = start + Duration::from_millis(10) * step;
        scheduler.take_due(now);
        scheduler.trigger(now);
    }
    assert!(scheduler.cycles() <= 1 + 1000 / 100);
    assert!(scheduler.cycles() >= 9);
}

#[test]
fn disposed_scheduler_never_fires() {
    let start = Instant::now();
    let mut scheduler = UpdateScheduler::default();
    let deadline = scheduler.trigger(start).unwrap();

    scheduler.dispose();
    assert!(scheduler.is_disposed());
    assert!(!scheduler.take_due(deadline));
    assert_eq!(scheduler.trigger(deadline), None);
    assert_eq!(scheduler.deadline(), None);
    assert_eq!(scheduler.cycles(), 0);
}

// ── Inspector ────────────────────────────────────────────────────────

#[test]
fn nothing_renders_before_the_deadline() {
    let (mut inspector, frames) = inspector();
    inspector.append(record(1, "send", "/a.A/X")).unwrap();

    assert!(!inspector.poll(Instant::now()));
    assert!(frames.borrow().is_empty());
    assert!(refresh(&mut inspector));
    assert_eq!(frames.borrow().len(), 1);
    assert_eq!(inspector.next_deadline(), None);
}

#[test]
fn rejected_append_does_not_schedule() {
    let (mut inspector, _frames) = inspector();
    inspector.append(record(1, "send", "/a.A/X")).unwrap();
    refresh(&mut inspector);

    assert!(inspector.append(record(1, "send", "/a.A/X")).is_err());
    assert_eq!(inspector.next_deadline(), None);
}

#[test]
fn burst_of_appends_renders_once_with_every_record() {
    let (mut inspector, frames) = inspector();
    let start = Instant::now();

    for id in 1..=1000 {
        inspector.append(record(id, "send", "/a.A/X")).unwrap();
    }
    assert!(!inspector.poll(start + Duration::from_millis(10)));
    assert!(inspector.poll(start + DEFAULT_REFRESH_DELAY + Duration::from_secs(1)));
    assert!(!inspector.poll(start + Duration::from_secs(5)));

    let frames = frames.borrow();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].total, 1000);
    assert_eq!(frames[0].ids.len(), 1000);
    assert_eq!(inspector.cycles(), 1);
}

#[test]
fn direction_filter_then_navigate_selects_match() {
    let (mut inspector, frames) = inspector();
    inspector.append(record(1, "send", "/x.X/Call")).unwrap();
    inspector.append(record(2, "recv", "/y.Y/Call")).unwrap();
    assert_eq!(inspector.set_filter_text(r#"direction == "recv""#), &FilterStatus::Valid);
    refresh(&mut inspector);
    assert_eq!(inspector.view().ids(), vec![2]);

    let picked = inspector.navigate(Navigation::Next).map(|r| r.message_id);
    assert_eq!(picked, Some(2));
    refresh(&mut inspector);
    assert_eq!(frames.borrow().last().and_then(|f| f.selected), Some(2));
}

#[test]
fn clear_keeps_valid_filter_and_drops_selection() {
    let (mut inspector, frames) = inspector();
    inspector.append(failed(1, "rpc error: code = Unavailable")).unwrap();
    inspector.append(record(2, "recv", "/a.A/X")).unwrap();
    inspector.set_filter_text(r#"error != """#);
    refresh(&mut inspector);
    inspector.navigate(Navigation::Next);
    assert_eq!(inspector.selected(), Some(1));

    inspector.clear();
    refresh(&mut inspector);

    let last = frames.borrow().last().cloned().expect("clear should render");
    assert!(last.ids.is_empty());
    assert_eq!(last.total, 0);
    assert_eq!(last.status, FilterStatus::Valid);
    assert_eq!(last.selected, None);
    assert_eq!(inspector.filter_text(), r#"error != """#);
}

#[test]
fn reconcile_runs_against_the_fresh_view() {
    let (mut inspector, frames) = inspector();
    inspector.append(record(1, "send", "/a.A/X")).unwrap();
    refresh(&mut inspector);

    // Selected before it arrives; kept because the view is recomputed first.
    inspector.select(2);
    inspector.append(record(2, "recv", "/a.A/X")).unwrap();
    refresh(&mut inspector);
    assert_eq!(frames.borrow().last().and_then(|f| f.selected), Some(2));

    // Filtered out in the same window it was selected in.
    inspector.set_filter_text(r#"direction == "send""#);
    refresh(&mut inspector);
    let last = frames.borrow().last().cloned().unwrap();
    assert_eq!(last.ids, vec![1]);
    assert_eq!(last.selected, None);
}

#[test]
fn quick_filter_rejects_unknown_field() {
    let (mut inspector, _frames) = inspector();
    let err = inspector
        .apply_quick_filter("grpc_status", &sniffer_types::FieldValue::Text("OK"))
        .expect_err("field is not in the schema");
    assert_eq!(err, InspectError::UnknownField("grpc_status".into()));
    assert_eq!(inspector.next_deadline(), None);
}

#[test]
fn dispose_cancels_pending_refresh() {
    let (mut inspector, frames) = inspector();
    inspector.append(record(1, "send", "/a.A/X")).unwrap();
    let due = inspector.next_deadline().unwrap();

    inspector.dispose();
    assert!(!inspector.poll(due));
    inspector.append(record(2, "send", "/a.A/X")).unwrap();
    assert_eq!(inspector.next_deadline(), None);
    assert!(frames.borrow().is_empty());
}

#[test]
fn frame_cycle_counts_refreshes() {
    let (mut inspector, frames) = inspector();
    for id in 1..=3 {
        inspector.append(record(id, "send", "/a.A/X")).unwrap();
        refresh(&mut inspector);
    }
    let cycles: Vec<_> = frames.borrow().iter().map(|f| f.cycle).collect();
    assert_eq!(cycles, vec![1, 2, 3]);
}
