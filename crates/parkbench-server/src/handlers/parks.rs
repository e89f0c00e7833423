//! Public roster endpoint, served from the short-TTL cache.

use std::sync::Arc;

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::handlers::ApiError;
use crate::util::{now_ts, ts_to_rfc3339};
use crate::AppState;

pub async fn list_parks(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let parks = state.roster.get(&state.db).await?;

    let body = json!({
        "parks": parks,
        "lastUpdated": ts_to_rfc3339(now_ts()),
        "total": parks.len(),
    });

    // Matches the cache TTL; clients may reuse the response for 5 seconds.
    Ok((
        [(header::CACHE_CONTROL, "public, max-age=5")],
        Json(body),
    ))
}
