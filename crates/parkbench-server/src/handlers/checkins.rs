//! Check-in/check-out routes. Thin glue: parse, authenticate, call the
//! engine, map its errors to status codes.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::handlers::{authenticate, require_verified, ApiError};
use crate::AppState;

const MIN_DURATION_MINUTES: i64 = 15;
const MAX_DURATION_MINUTES: i64 = 12 * 60;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckinData {
    pub visitor_ids: Vec<String>,
    pub location_id: String,
    pub duration_minutes: i64,
}

pub async fn checkin(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<CheckinData>,
) -> Result<Json<Value>, ApiError> {
    let auth = authenticate(&state, &headers).await?;
    require_verified(&auth)?;

    if payload.visitor_ids.is_empty() {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "invalid_visitors",
            "Select at least one visitor",
        ));
    }
    if !(MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&payload.duration_minutes) {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "invalid_duration",
            "Duration must be between 15 minutes and 12 hours",
        ));
    }

    let created = state
        .engine
        .check_in(
            &auth.user.id,
            &payload.visitor_ids,
            &payload.location_id,
            payload.duration_minutes,
        )
        .await?;

    Ok(Json(json!({
        "success": true,
        "checkins": created,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutData {
    pub checkin_ids: Vec<String>,
}

pub async fn checkout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<CheckoutData>,
) -> Result<Json<Value>, ApiError> {
    let auth = authenticate(&state, &headers).await?;
    require_verified(&auth)?;

    if payload.checkin_ids.is_empty() {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "invalid_checkins",
            "Select at least one check-in",
        ));
    }

    let updated = state
        .engine
        .check_out(&auth.user.id, &payload.checkin_ids)
        .await?;

    Ok(Json(json!({
        "success": true,
        "checkins": updated,
    })))
}

pub async fn checkin_all(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let auth = authenticate(&state, &headers).await?;
    require_verified(&auth)?;

    let created = state.engine.check_in_all(&auth.user.id).await?;

    Ok(Json(json!({
        "success": true,
        "checkins": created,
    })))
}

pub async fn checkout_all(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let auth = authenticate(&state, &headers).await?;
    require_verified(&auth)?;

    let updated = state.engine.check_out_all(&auth.user.id).await?;

    Ok(Json(json!({
        "success": true,
        "checkins": updated,
    })))
}
