//! Expiring, single-use, hashed secret tokens.
//!
//! Magic-link sign-in and email verification share the same lifecycle: only
//! a sha-256 of the raw token is stored, a token is live until its expiry or
//! first use, and issuing a new token retires any unused predecessor for the
//! same subject. Verification is a single conditional update, so the check
//! and the mark-used write cannot race apart.

use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set};

use entity::{magic_link_token, user};

use crate::crypto::hash_token;
use crate::util::{generate_token, now_ts, uuid_v4};

pub const MAGIC_LINK_TTL_MINUTES: i64 = 10;
pub const EMAIL_VERIFICATION_TTL_MINUTES: i64 = 60;

/// Create a magic-link token for `email` and return the raw value for the
/// outbound link. Any unused token for the same address is marked used
/// first; only one token per address is ever live.
pub async fn issue_magic_link_token<C: ConnectionTrait>(
    conn: &C,
    email: &str,
) -> Result<String, DbErr> {
    let now = now_ts();

    magic_link_token::Entity::update_many()
        .col_expr(magic_link_token::Column::UsedAt, Expr::value(Some(now)))
        .filter(magic_link_token::Column::Email.eq(email))
        .filter(magic_link_token::Column::UsedAt.is_null())
        .filter(magic_link_token::Column::DeletedAt.is_null())
        .exec(conn)
        .await?;

    let raw = generate_token();

    let active = magic_link_token::ActiveModel {
        id: Set(uuid_v4()),
        email: Set(email.to_string()),
        token_hash: Set(hash_token(&raw)),
        expires_at: Set(now + MAGIC_LINK_TTL_MINUTES * 60),
        used_at: Set(None),
        created_at: Set(now),
        deleted_at: Set(None),
    };
    active.insert(conn).await?;

    Ok(raw)
}

/// Consume a magic-link token. Returns the verified email on success.
///
/// The mark-used write carries every validity condition, so a second call
/// with the same raw token always fails, including when it races the first.
/// Not-found, wrong subject, expired, and already-used are deliberately
/// indistinguishable to the caller.
pub async fn verify_magic_link_token<C: ConnectionTrait>(
    conn: &C,
    raw_token: &str,
    email: &str,
) -> Result<Option<String>, DbErr> {
    let now = now_ts();

    let res = magic_link_token::Entity::update_many()
        .col_expr(magic_link_token::Column::UsedAt, Expr::value(Some(now)))
        .filter(magic_link_token::Column::TokenHash.eq(hash_token(raw_token)))
        .filter(magic_link_token::Column::Email.eq(email))
        .filter(magic_link_token::Column::UsedAt.is_null())
        .filter(magic_link_token::Column::ExpiresAt.gt(now))
        .filter(magic_link_token::Column::DeletedAt.is_null())
        .exec(conn)
        .await?;

    Ok((res.rows_affected == 1).then(|| email.to_string()))
}

/// Put a fresh verification token on the user row, replacing any previous
/// one, and return the raw value for the outbound link.
pub async fn issue_email_verification<C: ConnectionTrait>(
    conn: &C,
    user_id: &str,
) -> Result<String, DbErr> {
    let now = now_ts();
    let raw = generate_token();

    user::Entity::update_many()
        .col_expr(
            user::Column::EmailVerificationTokenHash,
            Expr::value(Some(hash_token(&raw))),
        )
        .col_expr(
            user::Column::EmailVerificationExpiresAt,
            Expr::value(Some(now + EMAIL_VERIFICATION_TTL_MINUTES * 60)),
        )
        .col_expr(user::Column::UpdatedAt, Expr::value(now))
        .filter(user::Column::Id.eq(user_id))
        .filter(user::Column::DeletedAt.is_null())
        .exec(conn)
        .await?;

    Ok(raw)
}

/// Consume an email-verification token. Single-use is enforced by clearing
/// the token columns in the same conditional update that stamps
/// `email_verified_at`.
pub async fn verify_email<C: ConnectionTrait>(conn: &C, raw_token: &str) -> Result<bool, DbErr> {
    let now = now_ts();

    let res = user::Entity::update_many()
        .col_expr(user::Column::EmailVerifiedAt, Expr::value(Some(now)))
        .col_expr(
            user::Column::EmailVerificationTokenHash,
            Expr::value::<Option<String>>(None),
        )
        .col_expr(
            user::Column::EmailVerificationExpiresAt,
            Expr::value::<Option<i64>>(None),
        )
        .col_expr(user::Column::UpdatedAt, Expr::value(now))
        .filter(user::Column::EmailVerificationTokenHash.eq(hash_token(raw_token)))
        .filter(user::Column::EmailVerificationExpiresAt.gt(now))
        .filter(user::Column::EmailVerifiedAt.is_null())
        .filter(user::Column::DeletedAt.is_null())
        .exec(conn)
        .await?;

    Ok(res.rows_affected == 1)
}

/// Stamp a user verified outside the token flow. Receiving a magic link
/// proves control of the mailbox, so sign-in verifies as a side effect.
pub async fn mark_email_verified<C: ConnectionTrait>(conn: &C, user_id: &str) -> Result<(), DbErr> {
    let now = now_ts();

    user::Entity::update_many()
        .col_expr(user::Column::EmailVerifiedAt, Expr::value(Some(now)))
        .col_expr(
            user::Column::EmailVerificationTokenHash,
            Expr::value::<Option<String>>(None),
        )
        .col_expr(
            user::Column::EmailVerificationExpiresAt,
            Expr::value::<Option<i64>>(None),
        )
        .col_expr(user::Column::UpdatedAt, Expr::value(now))
        .filter(user::Column::Id.eq(user_id))
        .filter(user::Column::EmailVerifiedAt.is_null())
        .filter(user::Column::DeletedAt.is_null())
        .exec(conn)
        .await?;

    Ok(())
}
