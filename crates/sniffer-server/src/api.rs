//! JSON handlers driving the inspector.

use crate::frame::ViewFrame;
use crate::AppState;
use axum::{
    extract::{Extension, Json},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sniffer_inspect::{FilterStatus, InspectError, Navigation};
use sniffer_types::{Record, RecordId};
use std::sync::Arc;
use thiserror::Error;

/// Request body for `POST /api/filter`.
#[derive(Debug, Deserialize)]
pub struct FilterRequest {
    pub text: String,
}

/// Request body for `POST /api/quick-filter`.
#[derive(Debug, Deserialize)]
pub struct QuickFilterRequest {
    /// Schema field name, e.g. `method`.
    pub field: String,
    /// The value to match, as it appears in the record.
    pub value: Value,
}

/// Response body for filter changes.
#[derive(Debug, Serialize)]
pub struct FilterResponse {
    /// The filter text now in effect.
    pub text: String,
    pub status: FilterStatus,
}

/// Request body for `POST /api/select`.
#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    pub id: RecordId,
}

/// Request body for `POST /api/navigate`.
#[derive(Debug, Deserialize)]
pub struct NavigateRequest {
    pub direction: Navigation,
}

/// Response body for `POST /api/navigate`.
#[derive(Debug, Serialize)]
pub struct NavigateResponse {
    /// The newly selected record, or `null` when nothing is visible.
    pub selected: Option<Record>,
}

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("inspector unavailable")]
    Unavailable,
}

impl From<InspectError> for ApiError {
    fn from(e: InspectError) -> Self {
        match e {
            InspectError::Closed => Self::Unavailable,
            other => Self::BadRequest(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        };

        let body = Json(serde_json::json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

/// Handler for `GET /api/view`.
///
/// Returns the most recently rendered frame.
pub async fn get_view_handler(Extension(state): Extension<Arc<AppState>>) -> Json<ViewFrame> {
    Json(state.latest_frame())
}

/// Handler for `POST /api/filter`.
pub async fn set_filter_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<FilterRequest>,
) -> Result<Json<FilterResponse>, ApiError> {
    let status = state.inspector.set_filter(payload.text.as_str()).await?;
    Ok(Json(FilterResponse {
        text: payload.text.trim().to_string(),
        status,
    }))
}

/// Handler for `POST /api/quick-filter`.
///
/// Replaces the filter with an equality test on one field of a record.
pub async fn quick_filter_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<QuickFilterRequest>,
) -> Result<Json<FilterResponse>, ApiError> {
    let (text, status) = state
        .inspector
        .quick_filter(payload.field, payload.value)
        .await?;
    Ok(Json(FilterResponse { text, status }))
}

/// Handler for `POST /api/select`.
pub async fn select_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<SelectRequest>,
) -> Result<StatusCode, ApiError> {
    state.inspector.select(payload.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for `POST /api/navigate`.
pub async fn navigate_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<NavigateRequest>,
) -> Result<Json<NavigateResponse>, ApiError> {
    let selected = state.inspector.navigate(payload.direction).await?;
    Ok(Json(NavigateResponse {
        selected: selected.map(|r| Record::clone(&r)),
    }))
}

/// Handler for `POST /api/clear`.
pub async fn clear_handler(Extension(state): Extension<Arc<AppState>>) -> Result<StatusCode, ApiError> {
    state.inspector.clear().await?;
    Ok(StatusCode::NO_CONTENT)
}
