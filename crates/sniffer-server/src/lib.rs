//! gRPC capture viewer server library logic.

pub mod api;
pub mod api_sse;
pub mod config;
pub mod frame;
pub mod tail;

use axum::{
    routing::{get, post},
    Extension, Json, Router,
};
use config::InspectorConfig;
use frame::ViewFrame;
use serde_json::{json, Value};
use sniffer_inspect::{actor, Frame, Inspector, InspectorHandle};
use sniffer_query::UnknownEngineError;
use sniffer_types::Schema;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Frames buffered per SSE subscriber before it starts skipping.
pub const FRAME_BROADCAST_CAPACITY: usize = 64;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Command side of the inspector task.
    pub inspector: InspectorHandle,
    /// Broadcast channel of rendered frames (SSE stream).
    pub frames_tx: broadcast::Sender<Arc<ViewFrame>>,
    /// The most recently rendered frame.
    pub latest: watch::Receiver<Arc<ViewFrame>>,
}

impl AppState {
    pub fn latest_frame(&self) -> ViewFrame {
        ViewFrame::clone(&self.latest.borrow())
    }
}

/// Spawns the inspector task and wires its renderer to the HTTP surface.
///
/// The configured initial filter is applied before the task starts. Returns
/// the shared state and the task's join handle.
pub fn start_inspector(
    config: &InspectorConfig,
) -> Result<(AppState, JoinHandle<()>), UnknownEngineError> {
    let engine = config.engine()?;
    let (frames_tx, _) = broadcast::channel(FRAME_BROADCAST_CAPACITY);
    let (latest_tx, latest) = watch::channel(Arc::new(ViewFrame::default()));

    let sink = frames_tx.clone();
    let render = move |frame: Frame<'_>| {
        let frame = Arc::new(ViewFrame::from_frame(&frame));
        latest_tx.send_replace(frame.clone());
        // No subscribers is the normal case between SSE connections.
        let _ = sink.send(frame);
    };

    let mut inspector = Inspector::with_options(engine, Schema::record(), config.refresh_delay(), render);
    if let Some(text) = &config.initial_filter {
        let status = inspector.set_filter_text(text);
        if status.is_error() {
            tracing::warn!(filter = %text, status = ?status, "initial filter is not valid");
        }
    }

    tracing::info!(
        engine = engine.name(),
        refresh_delay_ms = config.refresh_delay_ms,
        "starting inspector"
    );
    let (handle, task) = actor::spawn(inspector);

    Ok((
        AppState {
            inspector: handle,
            frames_tx,
            latest,
        },
        task,
    ))
}

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/view", get(api::get_view_handler))
        .route("/api/filter", post(api::set_filter_handler))
        .route("/api/quick-filter", post(api::quick_filter_handler))
        .route("/api/select", post(api::select_handler))
        .route("/api/navigate", post(api::navigate_handler))
        .route("/api/clear", post(api::clear_handler))
        .route("/events/stream", get(api_sse::get_frame_stream_handler))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
