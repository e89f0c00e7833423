//! Visitor profile management for the signed-in user.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use sea_orm::TransactionTrait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::events::RosterEvent;
use crate::handlers::{authenticate, ApiError};
use crate::store;
use crate::util::now_ts;
use crate::AppState;

pub async fn list(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let auth = authenticate(&state, &headers).await?;

    let visitors = store::find_visitors_by_owner(&state.db, &auth.user.id).await?;

    Ok(Json(json!({
        "success": true,
        "visitors": visitors,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVisitorData {
    pub name: String,
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<CreateVisitorData>,
) -> Result<Json<Value>, ApiError> {
    let auth = authenticate(&state, &headers).await?;

    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "invalid_name",
            "Visitor name cannot be blank",
        ));
    }
    if name.len() > 50 {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "invalid_name",
            "The field Name must be a string with a maximum length of 50.",
        ));
    }

    let created = store::create_visitor(&state.db, &auth.user.id, name).await?;

    Ok(Json(json!({
        "success": true,
        "visitor": created,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveVisitorData {
    pub visitor_id: String,
}

/// Soft-delete a visitor profile, checking out any active visit first so the
/// roster never shows a deleted visitor.
pub async fn remove(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<RemoveVisitorData>,
) -> Result<Json<Value>, ApiError> {
    let auth = authenticate(&state, &headers).await?;

    let ids = [payload.visitor_id.clone()];
    let now = now_ts();

    let txn = state.db.begin().await?;

    let owned = store::find_visitors_by_ids_for_owner(&txn, &ids, &auth.user.id).await?;
    if owned.is_empty() {
        return Err(ApiError::new(
            StatusCode::NOT_FOUND,
            "visitor_not_found",
            "Visitor not found",
        ));
    }

    let active = store::find_active_checkins_for_visitors(&txn, &ids).await?;
    let active_ids: Vec<String> = active.into_iter().map(|c| c.id).collect();
    store::set_checkout_time(&txn, &active_ids, now).await?;

    store::stamp_visitors_deleted(&txn, &ids, &auth.user.id, now).await?;

    txn.commit().await?;

    if !active_ids.is_empty() {
        state.roster.invalidate().await;
        state.events.publish(RosterEvent::RosterChanged { at: now });
    }

    Ok(Json(json!({ "success": true })))
}
