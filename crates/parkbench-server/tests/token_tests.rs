mod common;

use common::{seed_user, test_db};

use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use entity::{magic_link_token, user};
use parkbench_server::tokens;
use parkbench_server::util::now_ts;

#[tokio::test]
async fn magic_link_round_trip_is_single_use() {
    let db = test_db().await;
    seed_user(&db, "Uma", "uma@example.com").await;

    let raw = tokens::issue_magic_link_token(&db, "uma@example.com")
        .await
        .unwrap();

    let first = tokens::verify_magic_link_token(&db, &raw, "uma@example.com")
        .await
        .unwrap();
    assert_eq!(first.as_deref(), Some("uma@example.com"));

    // The second attempt always fails, even though the token was just valid.
    let second = tokens::verify_magic_link_token(&db, &raw, "uma@example.com")
        .await
        .unwrap();
    assert!(second.is_none());
}

#[tokio::test]
async fn verification_fails_for_the_wrong_subject() {
    let db = test_db().await;

    let raw = tokens::issue_magic_link_token(&db, "uma@example.com")
        .await
        .unwrap();

    let result = tokens::verify_magic_link_token(&db, &raw, "vera@example.com")
        .await
        .unwrap();
    assert!(result.is_none());

    // The token is still live for its real subject.
    let result = tokens::verify_magic_link_token(&db, &raw, "uma@example.com")
        .await
        .unwrap();
    assert!(result.is_some());
}

#[tokio::test]
async fn verification_fails_for_an_unknown_token() {
    let db = test_db().await;

    let result = tokens::verify_magic_link_token(&db, "not-a-real-token", "uma@example.com")
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn expired_token_is_invalid_and_future_token_is_valid() {
    let db = test_db().await;

    let raw = tokens::issue_magic_link_token(&db, "uma@example.com")
        .await
        .unwrap();

    // Just past the boundary: expired.
    magic_link_token::Entity::update_many()
        .col_expr(magic_link_token::Column::ExpiresAt, Expr::value(now_ts() - 1))
        .filter(magic_link_token::Column::Email.eq("uma@example.com"))
        .exec(&db)
        .await
        .unwrap();

    let result = tokens::verify_magic_link_token(&db, &raw, "uma@example.com")
        .await
        .unwrap();
    assert!(result.is_none());

    // Just inside the boundary: valid.
    let raw = tokens::issue_magic_link_token(&db, "uma@example.com")
        .await
        .unwrap();
    magic_link_token::Entity::update_many()
        .col_expr(magic_link_token::Column::ExpiresAt, Expr::value(now_ts() + 2))
        .filter(magic_link_token::Column::UsedAt.is_null())
        .filter(magic_link_token::Column::Email.eq("uma@example.com"))
        .exec(&db)
        .await
        .unwrap();

    let result = tokens::verify_magic_link_token(&db, &raw, "uma@example.com")
        .await
        .unwrap();
    assert!(result.is_some());
}

#[tokio::test]
async fn issuing_a_new_token_retires_the_previous_one() {
    let db = test_db().await;

    let first = tokens::issue_magic_link_token(&db, "uma@example.com")
        .await
        .unwrap();
    let second = tokens::issue_magic_link_token(&db, "uma@example.com")
        .await
        .unwrap();

    // The older token was marked used at issue time, well before its expiry.
    let result = tokens::verify_magic_link_token(&db, &first, "uma@example.com")
        .await
        .unwrap();
    assert!(result.is_none());

    let result = tokens::verify_magic_link_token(&db, &second, "uma@example.com")
        .await
        .unwrap();
    assert!(result.is_some());
}

async fn unverified_user(db: &sea_orm::DatabaseConnection, email: &str) -> user::Model {
    let u = seed_user(db, "Uma", email).await;
    user::Entity::update_many()
        .col_expr(user::Column::EmailVerifiedAt, Expr::value::<Option<i64>>(None))
        .filter(user::Column::Id.eq(u.id.clone()))
        .exec(db)
        .await
        .unwrap();
    user::Entity::find_by_id(u.id).one(db).await.unwrap().unwrap()
}

#[tokio::test]
async fn email_verification_round_trip_is_single_use() {
    let db = test_db().await;
    let u = unverified_user(&db, "uma@example.com").await;

    let raw = tokens::issue_email_verification(&db, &u.id).await.unwrap();

    assert!(tokens::verify_email(&db, &raw).await.unwrap());
    // Token columns are cleared by the same update; a replay finds nothing.
    assert!(!tokens::verify_email(&db, &raw).await.unwrap());

    let after = user::Entity::find_by_id(u.id).one(&db).await.unwrap().unwrap();
    assert!(after.email_verified_at.is_some());
    assert!(after.email_verification_token_hash.is_none());
    assert!(after.email_verification_expires_at.is_none());
}

#[tokio::test]
async fn expired_email_verification_is_rejected() {
    let db = test_db().await;
    let u = unverified_user(&db, "uma@example.com").await;

    let raw = tokens::issue_email_verification(&db, &u.id).await.unwrap();

    user::Entity::update_many()
        .col_expr(
            user::Column::EmailVerificationExpiresAt,
            Expr::value(now_ts() - 1),
        )
        .filter(user::Column::Id.eq(u.id.clone()))
        .exec(&db)
        .await
        .unwrap();

    assert!(!tokens::verify_email(&db, &raw).await.unwrap());

    let after = user::Entity::find_by_id(u.id).one(&db).await.unwrap().unwrap();
    assert!(after.email_verified_at.is_none());
}

#[tokio::test]
async fn reissuing_verification_invalidates_the_previous_link() {
    let db = test_db().await;
    let u = unverified_user(&db, "uma@example.com").await;

    let first = tokens::issue_email_verification(&db, &u.id).await.unwrap();
    let second = tokens::issue_email_verification(&db, &u.id).await.unwrap();

    assert!(!tokens::verify_email(&db, &first).await.unwrap());
    assert!(tokens::verify_email(&db, &second).await.unwrap());
}
