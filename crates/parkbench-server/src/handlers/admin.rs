//! Maintenance liveness view.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use sea_orm::EntityTrait;
use serde_json::{json, Value};

use entity::cron_job_run;

use crate::handlers::{authenticate, ApiError};
use crate::util::ts_to_rfc3339;
use crate::AppState;

pub async fn cron_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    authenticate(&state, &headers).await?;

    let runs = cron_job_run::Entity::find().all(&state.db).await?;

    let jobs: Vec<Value> = runs
        .iter()
        .map(|run| {
            json!({
                "jobName": run.job_name,
                "lastRunAt": ts_to_rfc3339(run.last_run_at),
            })
        })
        .collect();

    Ok(Json(json!({
        "success": true,
        "jobs": jobs,
    })))
}
