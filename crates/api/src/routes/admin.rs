//! Administrative sweep routes.

use axum::{Json, Router, extract::State, routing::post};
use meridian_core::processing::SweepCounts;
use serde::Deserialize;

use crate::AppState;
use crate::error::ApiError;

/// Creates the admin routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/admin/process-eligible", post(process_eligible))
}

/// Request body for a sweep run.
#[derive(Debug, Default, Deserialize)]
pub struct SweepRequest {
    /// Maximum transactions to advance.
    pub limit: Option<usize>,
    /// Count eligible work without acting on it.
    #[serde(default)]
    pub dry_run: bool,
}

/// POST `/admin/process-eligible` - Run one sweep iteration now.
async fn process_eligible(
    State(state): State<AppState>,
    body: Option<Json<SweepRequest>>,
) -> Result<Json<SweepCounts>, ApiError> {
    let Json(body) = body.unwrap_or_default();
    let limit = body.limit.unwrap_or(100);
    let counts = state.service.process_eligible(limit, body.dry_run).await;
    Ok(Json(counts))
}
