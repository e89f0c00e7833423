//! The check-in/check-out state engine.
//!
//! A visitor moves `AVAILABLE -> CHECKED_IN -> AVAILABLE`; checkout stamps
//! the row, never deletes it, and there is no pause or transfer between
//! parks. Every operation validates ownership through the user -> visitor ->
//! checkin chain, applies all of its row writes inside one transaction, and
//! finishes by invalidating the roster cache and publishing a change event.

use std::collections::HashSet;
use std::sync::Arc;

use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, TransactionTrait};

use entity::checkin;

use crate::error::CheckinError;
use crate::events::{ChangeBroadcaster, RosterEvent};
use crate::roster::RosterCache;
use crate::store::{self, NewCheckin};
use crate::util::now_ts;

/// Duration applied when checking in all of a user's visitors at once.
pub const DEFAULT_MASS_CHECKIN_MINUTES: i64 = 120;

#[derive(Clone)]
pub struct CheckinEngine {
    db: DatabaseConnection,
    roster: Arc<RosterCache>,
    events: Arc<ChangeBroadcaster>,
}

fn dedup_preserving_order(ids: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}

impl CheckinEngine {
    pub fn new(
        db: DatabaseConnection,
        roster: Arc<RosterCache>,
        events: Arc<ChangeBroadcaster>,
    ) -> Self {
        Self { db, roster, events }
    }

    async fn roster_changed(&self, at: i64) {
        self.roster.invalidate().await;
        self.events.publish(RosterEvent::RosterChanged { at });
    }

    /// Check `visitor_ids` in at `location_id` for `duration_minutes`.
    ///
    /// The availability check runs inside the same transaction as the
    /// inserts; a competing check-in for the same visitor commits first or
    /// sees ours, so the one-active-checkin rule holds across concurrent
    /// requests.
    pub async fn check_in(
        &self,
        user_id: &str,
        visitor_ids: &[String],
        location_id: &str,
        duration_minutes: i64,
    ) -> Result<Vec<checkin::Model>, CheckinError> {
        if visitor_ids.is_empty() {
            return Ok(Vec::new());
        }
        let unique_ids = dedup_preserving_order(visitor_ids);

        let txn = self.db.begin().await?;

        let visitors = store::find_visitors_by_ids_for_owner(&txn, &unique_ids, user_id).await?;
        if visitors.len() != unique_ids.len() {
            return Err(CheckinError::Unauthorized(
                "One or more visitors not found or not owned by you".to_string(),
            ));
        }

        let locations = store::find_locations_by_ids(&txn, &[location_id.to_string()]).await?;
        if locations.is_empty() {
            return Err(CheckinError::LocationNotFound(
                "One or more locations not found".to_string(),
            ));
        }

        let active = store::find_active_checkins_for_visitors(&txn, &unique_ids).await?;
        if !active.is_empty() {
            let busy: HashSet<&str> = active.iter().map(|c| c.visitor_id.as_str()).collect();
            let mut names: Vec<String> = visitors
                .iter()
                .filter(|v| busy.contains(v.id.as_str()))
                .map(|v| v.name.clone())
                .collect();
            names.sort();
            return Err(CheckinError::AlreadyCheckedIn { names });
        }

        let now = now_ts();
        let est_checkout_at = now + duration_minutes * 60;
        let rows = unique_ids
            .into_iter()
            .map(|visitor_id| NewCheckin {
                visitor_id,
                location_id: location_id.to_string(),
                checkin_at: now,
                est_checkout_at,
            })
            .collect();

        let created = store::insert_checkins(&txn, rows).await?;
        txn.commit().await?;

        self.roster_changed(now).await;
        Ok(created)
    }

    /// Check out the given checkins. Every id must resolve to an active,
    /// non-deleted checkin of a visitor the caller owns; a count mismatch
    /// rejects the whole batch.
    pub async fn check_out(
        &self,
        user_id: &str,
        checkin_ids: &[String],
    ) -> Result<Vec<checkin::Model>, CheckinError> {
        if checkin_ids.is_empty() {
            return Ok(Vec::new());
        }
        let unique_ids = dedup_preserving_order(checkin_ids);

        let txn = self.db.begin().await?;

        let owned = store::find_active_checkins_by_ids_for_owner(&txn, &unique_ids, user_id).await?;
        if owned.len() != unique_ids.len() {
            return Err(CheckinError::Unauthorized(
                "One or more check-ins not found or not owned by you".to_string(),
            ));
        }

        let now = now_ts();
        let updated = store::set_checkout_time(&txn, &unique_ids, now).await?;
        txn.commit().await?;

        self.roster_changed(now).await;
        Ok(updated)
    }

    /// Check in every available visitor of `user_id` at one location.
    ///
    /// Visitors already checked in are skipped, so running this twice in a
    /// row returns a full list and then an empty one. Returns an empty list,
    /// not an error, when there is nothing to do.
    pub async fn check_in_all(&self, user_id: &str) -> Result<Vec<checkin::Model>, CheckinError> {
        let visitors = store::find_visitors_by_owner(&self.db, user_id).await?;
        if visitors.is_empty() {
            return Ok(Vec::new());
        }

        let all_ids: Vec<String> = visitors.iter().map(|v| v.id.clone()).collect();
        let active = store::find_active_checkins_for_visitors(&self.db, &all_ids).await?;
        let busy: HashSet<&str> = active.iter().map(|c| c.visitor_id.as_str()).collect();
        let available: Vec<String> = all_ids
            .iter()
            .filter(|id| !busy.contains(id.as_str()))
            .cloned()
            .collect();
        if available.is_empty() {
            return Ok(Vec::new());
        }

        let location_id = self.resolve_target_location(user_id).await?;

        let txn = self.db.begin().await?;

        // Re-check availability inside the transaction; a competing check-in
        // may have landed since the read above. Anyone who got busy in the
        // meantime is skipped, not an error.
        let still_active = store::find_active_checkins_for_visitors(&txn, &available).await?;
        let busy: HashSet<&str> = still_active.iter().map(|c| c.visitor_id.as_str()).collect();
        let remaining: Vec<String> = available
            .into_iter()
            .filter(|id| !busy.contains(id.as_str()))
            .collect();
        if remaining.is_empty() {
            return Ok(Vec::new());
        }

        let now = now_ts();
        let est_checkout_at = now + DEFAULT_MASS_CHECKIN_MINUTES * 60;
        let rows = remaining
            .into_iter()
            .map(|visitor_id| NewCheckin {
                visitor_id,
                location_id: location_id.clone(),
                checkin_at: now,
                est_checkout_at,
            })
            .collect();

        let created = store::insert_checkins(&txn, rows).await?;
        txn.commit().await?;

        self.roster_changed(now).await;
        Ok(created)
    }

    /// Most recently used location first, then the alphabetically-first one.
    /// A system with no locations at all is a deployment problem, not a
    /// business outcome.
    async fn resolve_target_location(&self, user_id: &str) -> Result<String, CheckinError> {
        if let Some(location_id) = store::most_recent_location_id_for_owner(&self.db, user_id).await?
        {
            // The remembered location may have been retired since.
            let found = store::find_locations_by_ids(&self.db, &[location_id.clone()]).await?;
            if !found.is_empty() {
                return Ok(location_id);
            }
        }

        match store::first_location_by_name(&self.db).await? {
            Some(location) => Ok(location.id),
            None => Err(CheckinError::Unknown(
                "No locations available for check-in".to_string(),
            )),
        }
    }

    /// Check out every active checkin under the user's visitors. Returns an
    /// empty list when none are active.
    pub async fn check_out_all(&self, user_id: &str) -> Result<Vec<checkin::Model>, CheckinError> {
        let active = store::find_active_checkins_for_owner(&self.db, user_id).await?;
        if active.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<String> = active.into_iter().map(|c| c.id).collect();

        let txn = self.db.begin().await?;
        let now = now_ts();
        let updated = store::set_checkout_time(&txn, &ids, now).await?;
        txn.commit().await?;

        self.roster_changed(now).await;
        Ok(updated)
    }

    /// Check out rows whose estimated checkout time has passed, stamping the
    /// estimate as the actual checkout time. Returns the number of rows
    /// expired.
    pub async fn expire_stale_checkins(&self) -> Result<u64, CheckinError> {
        let now = now_ts();

        let expired = checkin::Entity::update_many()
            .col_expr(
                checkin::Column::ActualCheckoutAt,
                Expr::col(checkin::Column::EstCheckoutAt).into(),
            )
            .col_expr(checkin::Column::UpdatedAt, Expr::value(now))
            .filter(checkin::Column::ActualCheckoutAt.is_null())
            .filter(checkin::Column::EstCheckoutAt.lte(now))
            .filter(checkin::Column::DeletedAt.is_null())
            .exec(&self.db)
            .await?;

        if expired.rows_affected > 0 {
            self.roster_changed(now).await;
        }

        Ok(expired.rows_affected)
    }
}
