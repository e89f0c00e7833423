//! Passwordless authentication: magic-link sign-in, registration, and email
//! verification.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, TransactionTrait};
use serde::Deserialize;
use serde_json::{json, Value};

use entity::{session, user, visitor, FilterAlive};

use crate::email;
use crate::handlers::{authenticate, ApiError};
use crate::tokens;
use crate::util::{generate_token, now_ts, uuid_v4};
use crate::AppState;

/// Session lifetime: 24 hours.
const SESSION_TTL_SECS: i64 = 24 * 60 * 60;

fn invalid_token_error() -> ApiError {
    // Not found, expired, and already used all collapse to this one shape.
    ApiError::new(
        StatusCode::BAD_REQUEST,
        "invalid_token",
        "This sign-in link is invalid or has expired",
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SigninData {
    pub email: String,
}

pub async fn signin(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SigninData>,
) -> Result<Json<Value>, ApiError> {
    let email_addr = payload.email.trim().to_lowercase();
    if email_addr.is_empty() {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "invalid_email",
            "Email cannot be blank",
        ));
    }

    // Anti-enumeration: the response is identical whether or not the address
    // maps to an account; only real accounts get a token issued.
    let found = user::Entity::find()
        .alive()
        .filter(user::Column::Email.eq(&email_addr))
        .one(&state.db)
        .await?;

    if found.is_some() {
        let raw = tokens::issue_magic_link_token(&state.db, &email_addr).await?;
        let link = format!(
            "{}/auth/magic?token={raw}&email={email_addr}",
            state.config.base_url
        );
        let (subject, html, text) = email::magic_link_email(&link);
        if let Err(err) = state.mailer.send(&email_addr, &subject, html, text).await {
            tracing::error!("Failed to send magic link email: {err}");
        }
    }

    Ok(Json(json!({
        "success": true,
        "message": "If that address is registered, a sign-in link is on its way",
    })))
}

#[derive(Debug, Deserialize)]
pub struct MagicQuery {
    pub token: String,
    pub email: String,
}

pub async fn magic(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MagicQuery>,
) -> Result<Json<Value>, ApiError> {
    let email_addr = query.email.trim().to_lowercase();

    let verified = tokens::verify_magic_link_token(&state.db, &query.token, &email_addr).await?;
    if verified.is_none() {
        return Err(invalid_token_error());
    }

    let Some(u) = user::Entity::find()
        .alive()
        .filter(user::Column::Email.eq(&email_addr))
        .one(&state.db)
        .await?
    else {
        // Same shape as a bad token; a token for a purged account reveals
        // nothing.
        return Err(invalid_token_error());
    };

    // Receiving the link proves control of the mailbox.
    if u.email_verified_at.is_none() {
        tokens::mark_email_verified(&state.db, &u.id).await?;
    }

    let now = now_ts();
    let access_token = generate_token();
    let active = session::ActiveModel {
        id: Set(uuid_v4()),
        user_id: Set(u.id.clone()),
        access_token: Set(access_token.clone()),
        expires_at: Set(now + SESSION_TTL_SECS),
        created_at: Set(now),
        updated_at: Set(now),
    };
    active.insert(&state.db).await?;

    Ok(Json(json!({
        "success": true,
        "access_token": access_token,
        "token_type": "Bearer",
        "expires_in": SESSION_TTL_SECS,
        "user": {
            "id": u.id,
            "name": u.name,
            "email": u.email,
        },
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterData {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub visitor_names: Vec<String>,
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterData>,
) -> Result<Json<Value>, ApiError> {
    let email_addr = payload.email.trim().to_lowercase();
    if email_addr.is_empty() {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "invalid_email",
            "Email cannot be blank",
        ));
    }

    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "invalid_name",
            "Name cannot be blank",
        ));
    }
    if name.len() > 50 {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "invalid_name",
            "The field Name must be a string with a maximum length of 50.",
        ));
    }

    let existing = user::Entity::find()
        .alive()
        .filter(user::Column::Email.eq(&email_addr))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "already_registered",
            "A user with this email already exists",
        ));
    }

    let now = now_ts();
    let user_id = uuid_v4();

    let txn = state.db.begin().await?;

    let active = user::ActiveModel {
        id: Set(user_id.clone()),
        name: Set(name),
        email: Set(email_addr.clone()),
        email_verification_token_hash: Set(None),
        email_verification_expires_at: Set(None),
        email_verified_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        deleted_at: Set(None),
    };
    active.insert(&txn).await?;

    for visitor_name in &payload.visitor_names {
        let visitor_name = visitor_name.trim();
        if visitor_name.is_empty() {
            continue;
        }
        let active = visitor::ActiveModel {
            id: Set(uuid_v4()),
            name: Set(visitor_name.to_string()),
            owner_id: Set(user_id.clone()),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        };
        active.insert(&txn).await?;
    }

    txn.commit().await?;

    send_verification_link(&state, &user_id, &email_addr).await?;

    Ok(Json(json!({
        "success": true,
        "id": user_id,
    })))
}

async fn send_verification_link(
    state: &AppState,
    user_id: &str,
    email_addr: &str,
) -> Result<(), ApiError> {
    let raw = tokens::issue_email_verification(&state.db, user_id).await?;
    let link = format!("{}/auth/verify?token={raw}", state.config.base_url);
    let (subject, html, text) = email::verification_email(&link);
    if let Err(err) = state.mailer.send(email_addr, &subject, html, text).await {
        tracing::error!("Failed to send verification email: {err}");
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    pub token: String,
}

pub async fn verify_email(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VerifyQuery>,
) -> Result<Json<Value>, ApiError> {
    if tokens::verify_email(&state.db, &query.token).await? {
        Ok(Json(json!({
            "success": true,
            "message": "Email verified",
        })))
    } else {
        Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "invalid_token",
            "This verification link is invalid or has expired",
        ))
    }
}

pub async fn resend_verification(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let auth = authenticate(&state, &headers).await?;

    if auth.user.email_verified_at.is_some() {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "already_verified",
            "Email is already verified",
        ));
    }

    send_verification_link(&state, &auth.user.id, &auth.user.email).await?;

    Ok(Json(json!({ "success": true })))
}

pub async fn signout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let auth = authenticate(&state, &headers).await?;

    session::Entity::delete_by_id(auth.session.id)
        .exec(&state.db)
        .await?;

    Ok(Json(json!({ "success": true })))
}
