//! SSE stream of rendered frames.

use crate::AppState;
use axum::{
    extract::Extension,
    response::{
        sse::{Event, KeepAlive},
        Sse,
    },
};
use futures_util::Stream;
use std::{convert::Infallible, sync::Arc};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Handler for `GET /events/stream`.
///
/// Sends one `frame` event per refresh cycle. A subscriber that falls behind
/// skips the frames it missed; the next one it receives is complete.
pub async fn get_frame_stream_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.frames_tx.subscribe();
    let stream = BroadcastStream::new(rx);

    let mapped_stream = stream.filter_map(|result| match result {
        Ok(frame) => match serde_json::to_string(&*frame) {
            Ok(data) => Some(Ok(Event::default().event("frame").data(data))),
            Err(e) => {
                tracing::error!("failed to serialize frame: {}", e);
                None
            }
        },
        Err(lagged) => {
            tracing::debug!(error = %lagged, "frame stream subscriber lagged");
            None
        }
    });

    Sse::new(mapped_stream).keep_alive(KeepAlive::default())
}
