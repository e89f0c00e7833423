//! Scheduled maintenance: stale-checkin expiry, token pruning, and the
//! hard purge of old soft-deleted rows. Each sweep records its last run in
//! `cron_job_runs` so liveness is observable from the outside.

use std::sync::Arc;
use std::time::Duration;

use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set};
use tracing::{error, info, warn};

use entity::{checkin, cron_job_run, location, magic_link_token, user, visitor};

use crate::util::now_ts;
use crate::AppState;

/// Hard-delete tombstoned rows after this many days.
pub const SOFT_DELETE_RETENTION_DAYS: i64 = 30;

const DAY_SECS: i64 = 24 * 60 * 60;

pub async fn run_periodic(state: Arc<AppState>) {
    let mut ticker =
        tokio::time::interval(Duration::from_secs(state.config.maintenance_interval_secs));
    loop {
        ticker.tick().await;
        run_all(&state).await;
    }
}

/// Run every maintenance job once. Failures are logged, never fatal; the
/// next tick retries.
pub async fn run_all(state: &AppState) {
    match state.engine.expire_stale_checkins().await {
        Ok(count) => {
            if count > 0 {
                info!("Expired {count} stale check-ins");
            }
            record_job_run(&state.db, "expire_stale_checkins").await;
        }
        Err(err) => error!("Error expiring stale check-ins: {err}"),
    }

    match prune_magic_link_tokens(&state.db).await {
        Ok(count) => {
            if count > 0 {
                info!("Pruned {count} old magic-link tokens");
            }
            record_job_run(&state.db, "prune_magic_link_tokens").await;
        }
        Err(err) => error!("Error pruning magic-link tokens: {err}"),
    }

    match purge_soft_deleted(&state.db).await {
        Ok(count) => {
            if count > 0 {
                info!("Purged {count} soft-deleted rows");
            }
            record_job_run(&state.db, "purge_soft_deletes").await;
        }
        Err(err) => error!("Error purging soft-deleted rows: {err}"),
    }
}

/// Magic-link tokens are dead weight minutes after issue; keep the rows for
/// the retention window, then drop them outright.
pub async fn prune_magic_link_tokens<C: ConnectionTrait>(conn: &C) -> Result<u64, DbErr> {
    let cutoff = now_ts() - SOFT_DELETE_RETENTION_DAYS * DAY_SECS;

    let res = magic_link_token::Entity::delete_many()
        .filter(magic_link_token::Column::ExpiresAt.lt(cutoff))
        .exec(conn)
        .await?;

    Ok(res.rows_affected)
}

/// Hard-delete rows whose tombstone is older than the retention window.
///
/// Children go first; deleting a user cascades over whatever its visitors
/// and checkins still hold.
pub async fn purge_soft_deleted<C: ConnectionTrait>(conn: &C) -> Result<u64, DbErr> {
    let cutoff = now_ts() - SOFT_DELETE_RETENTION_DAYS * DAY_SECS;
    let mut total = 0;

    let res = checkin::Entity::delete_many()
        .filter(checkin::Column::DeletedAt.is_not_null())
        .filter(checkin::Column::DeletedAt.lt(cutoff))
        .exec(conn)
        .await?;
    total += res.rows_affected;

    let res = visitor::Entity::delete_many()
        .filter(visitor::Column::DeletedAt.is_not_null())
        .filter(visitor::Column::DeletedAt.lt(cutoff))
        .exec(conn)
        .await?;
    total += res.rows_affected;

    let res = location::Entity::delete_many()
        .filter(location::Column::DeletedAt.is_not_null())
        .filter(location::Column::DeletedAt.lt(cutoff))
        .exec(conn)
        .await?;
    total += res.rows_affected;

    let res = magic_link_token::Entity::delete_many()
        .filter(magic_link_token::Column::DeletedAt.is_not_null())
        .filter(magic_link_token::Column::DeletedAt.lt(cutoff))
        .exec(conn)
        .await?;
    total += res.rows_affected;

    let res = user::Entity::delete_many()
        .filter(user::Column::DeletedAt.is_not_null())
        .filter(user::Column::DeletedAt.lt(cutoff))
        .exec(conn)
        .await?;
    total += res.rows_affected;

    Ok(total)
}

pub async fn record_job_run<C: ConnectionTrait>(conn: &C, job_name: &str) {
    let active = cron_job_run::ActiveModel {
        job_name: Set(job_name.to_string()),
        last_run_at: Set(now_ts()),
    };

    let res = cron_job_run::Entity::insert(active)
        .on_conflict(
            OnConflict::column(cron_job_run::Column::JobName)
                .update_column(cron_job_run::Column::LastRunAt)
                .to_owned(),
        )
        .exec(conn)
        .await;

    if let Err(err) = res {
        warn!("Failed to record cron run for {job_name}: {err}");
    }
}
