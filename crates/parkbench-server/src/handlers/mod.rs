use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use sea_orm::{ColumnTrait, DbErr, EntityTrait, QueryFilter};
use serde_json::json;

use entity::{session, user, FilterAlive};

use crate::error::CheckinError;
use crate::util::now_ts;
use crate::AppState;

pub mod admin;
pub mod auth;
pub mod checkins;
pub mod events;
pub mod parks;
pub mod visitors;

/// JSON error shape shared by every handler:
/// `{"success": false, "error": {"code": ..., "message": ...}}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: &str) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthorized", message)
    }

    pub fn internal(context: &str, err: &impl std::fmt::Display) -> Self {
        tracing::error!("{context}: {err}");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "Internal server error",
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "success": false,
            "error": {
                "code": self.code,
                "message": self.message,
            }
        });

        (self.status, Json(body)).into_response()
    }
}

impl From<CheckinError> for ApiError {
    fn from(err: CheckinError) -> Self {
        let (status, code) = match &err {
            CheckinError::AlreadyCheckedIn { .. } => (StatusCode::BAD_REQUEST, "already_checked_in"),
            CheckinError::VisitorNotFound(_) => (StatusCode::NOT_FOUND, "visitor_not_found"),
            CheckinError::LocationNotFound(_) => (StatusCode::NOT_FOUND, "location_not_found"),
            CheckinError::Unauthorized(_) => (StatusCode::FORBIDDEN, "unauthorized"),
            CheckinError::Unknown(_) => (StatusCode::INTERNAL_SERVER_ERROR, "unknown"),
        };

        Self::new(status, code, err.to_string())
    }
}

impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        Self::internal("storage error", &err)
    }
}

pub struct Authenticated {
    pub user: user::Model,
    pub session: session::Model,
}

pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = raw.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

/// Validate the request bearer token against the `sessions` table and load
/// the owning user.
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Authenticated, ApiError> {
    let Some(token) = extract_bearer_token(headers) else {
        return Err(ApiError::unauthorized("Missing bearer token"));
    };

    let Some(sess) = session::Entity::find()
        .filter(session::Column::AccessToken.eq(&token))
        .one(&state.db)
        .await?
    else {
        return Err(ApiError::unauthorized("Invalid token"));
    };

    if sess.expires_at <= now_ts() {
        return Err(ApiError::unauthorized("Token expired"));
    }

    let Some(u) = user::Entity::find_by_id(sess.user_id.clone())
        .alive()
        .one(&state.db)
        .await?
    else {
        return Err(ApiError::unauthorized("Invalid token"));
    };

    Ok(Authenticated {
        user: u,
        session: sess,
    })
}

/// Checkin mutations require a verified email address.
pub fn require_verified(auth: &Authenticated) -> Result<(), ApiError> {
    if auth.user.email_verified_at.is_none() {
        return Err(ApiError::new(
            StatusCode::FORBIDDEN,
            "email_not_verified",
            "Verify your email address to continue",
        ));
    }
    Ok(())
}

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "ok": true,
        "service": "parkbench",
    }))
}
