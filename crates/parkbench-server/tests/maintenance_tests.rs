mod common;

use common::{seed_user, seed_visitor, test_db, test_state};

use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};

use entity::{cron_job_run, magic_link_token, visitor};
use parkbench_server::maintenance::{
    prune_magic_link_tokens, purge_soft_deleted, record_job_run, run_all,
    SOFT_DELETE_RETENTION_DAYS,
};
use parkbench_server::tokens;
use parkbench_server::util::now_ts;

const DAY_SECS: i64 = 24 * 60 * 60;

#[tokio::test]
async fn purge_removes_only_old_tombstones() {
    let db = test_db().await;
    let owner = seed_user(&db, "Uma", "uma@example.com").await;
    let old = seed_visitor(&db, &owner.id, "Old").await;
    let recent = seed_visitor(&db, &owner.id, "Recent").await;
    let alive = seed_visitor(&db, &owner.id, "Alive").await;

    let now = now_ts();
    visitor::Entity::update_many()
        .col_expr(
            visitor::Column::DeletedAt,
            Expr::value(Some(now - (SOFT_DELETE_RETENTION_DAYS + 1) * DAY_SECS)),
        )
        .filter(visitor::Column::Id.eq(old.id.clone()))
        .exec(&db)
        .await
        .unwrap();
    visitor::Entity::update_many()
        .col_expr(visitor::Column::DeletedAt, Expr::value(Some(now - DAY_SECS)))
        .filter(visitor::Column::Id.eq(recent.id.clone()))
        .exec(&db)
        .await
        .unwrap();

    let purged = purge_soft_deleted(&db).await.unwrap();
    assert_eq!(purged, 1);

    assert!(visitor::Entity::find_by_id(old.id).one(&db).await.unwrap().is_none());
    assert!(visitor::Entity::find_by_id(recent.id)
        .one(&db)
        .await
        .unwrap()
        .is_some());
    assert!(visitor::Entity::find_by_id(alive.id)
        .one(&db)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn prune_drops_tokens_past_the_retention_window() {
    let db = test_db().await;

    tokens::issue_magic_link_token(&db, "old@example.com")
        .await
        .unwrap();
    tokens::issue_magic_link_token(&db, "fresh@example.com")
        .await
        .unwrap();

    let ancient = now_ts() - (SOFT_DELETE_RETENTION_DAYS + 1) * DAY_SECS;
    magic_link_token::Entity::update_many()
        .col_expr(magic_link_token::Column::ExpiresAt, Expr::value(ancient))
        .filter(magic_link_token::Column::Email.eq("old@example.com"))
        .exec(&db)
        .await
        .unwrap();

    let pruned = prune_magic_link_tokens(&db).await.unwrap();
    assert_eq!(pruned, 1);

    let remaining = magic_link_token::Entity::find().count(&db).await.unwrap();
    assert_eq!(remaining, 1);
}

#[tokio::test]
async fn record_job_run_upserts_a_single_row() {
    let db = test_db().await;

    record_job_run(&db, "expire_stale_checkins").await;
    let first = cron_job_run::Entity::find_by_id("expire_stale_checkins".to_string())
        .one(&db)
        .await
        .unwrap()
        .unwrap();

    // Backdate, then run again; the same row must move forward.
    cron_job_run::ActiveModel {
        job_name: Set("expire_stale_checkins".to_string()),
        last_run_at: Set(first.last_run_at - 100),
    }
    .update(&db)
    .await
    .unwrap();

    record_job_run(&db, "expire_stale_checkins").await;

    let rows = cron_job_run::Entity::find().all(&db).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].last_run_at >= first.last_run_at - 100);
    assert!(rows[0].last_run_at >= first.last_run_at);
}

#[tokio::test]
async fn run_all_records_every_job() {
    let state = test_state().await;

    run_all(&state).await;

    let rows = cron_job_run::Entity::find().all(&state.db).await.unwrap();
    let mut names: Vec<&str> = rows.iter().map(|r| r.job_name.as_str()).collect();
    names.sort_unstable();
    assert_eq!(
        names,
        vec![
            "expire_stale_checkins",
            "prune_magic_link_tokens",
            "purge_soft_deletes",
        ]
    );
}
