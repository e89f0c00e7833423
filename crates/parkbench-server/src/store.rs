//! The narrow set of persistence operations the engine needs.
//!
//! Every function is generic over [`ConnectionTrait`] so the same query runs
//! on the pooled connection or inside a transaction. Default reads exclude
//! soft-deleted rows through `alive()`; there is no raw query path here that
//! can forget the tombstone filter.

use std::collections::{HashMap, HashSet};

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};

use entity::{checkin, location, visitor, FilterAlive};

use crate::roster::{ActiveVisitorCheckin, ParkWithVisitors};
use crate::util::{now_ts, uuid_v4};

/// Row data for a checkin about to be created.
pub struct NewCheckin {
    pub visitor_id: String,
    pub location_id: String,
    pub checkin_at: i64,
    pub est_checkout_at: i64,
}

pub async fn find_visitors_by_owner<C: ConnectionTrait>(
    conn: &C,
    owner_id: &str,
) -> Result<Vec<visitor::Model>, DbErr> {
    visitor::Entity::find()
        .alive()
        .filter(visitor::Column::OwnerId.eq(owner_id))
        .order_by_asc(visitor::Column::Name)
        .all(conn)
        .await
}

pub async fn find_visitors_by_ids_for_owner<C: ConnectionTrait>(
    conn: &C,
    ids: &[String],
    owner_id: &str,
) -> Result<Vec<visitor::Model>, DbErr> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    visitor::Entity::find()
        .alive()
        .filter(visitor::Column::Id.is_in(ids.to_vec()))
        .filter(visitor::Column::OwnerId.eq(owner_id))
        .all(conn)
        .await
}

pub async fn find_active_checkins_for_visitors<C: ConnectionTrait>(
    conn: &C,
    visitor_ids: &[String],
) -> Result<Vec<checkin::Model>, DbErr> {
    if visitor_ids.is_empty() {
        return Ok(Vec::new());
    }

    checkin::Entity::find()
        .alive()
        .filter(checkin::Column::VisitorId.is_in(visitor_ids.to_vec()))
        .filter(checkin::Column::ActualCheckoutAt.is_null())
        .all(conn)
        .await
}

/// Active checkins among `ids` whose visitors belong to `owner_id`.
///
/// A count mismatch against the requested ids is how callers detect
/// not-found and not-owned without distinguishing the two.
pub async fn find_active_checkins_by_ids_for_owner<C: ConnectionTrait>(
    conn: &C,
    ids: &[String],
    owner_id: &str,
) -> Result<Vec<checkin::Model>, DbErr> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let checkins = checkin::Entity::find()
        .alive()
        .filter(checkin::Column::Id.is_in(ids.to_vec()))
        .filter(checkin::Column::ActualCheckoutAt.is_null())
        .all(conn)
        .await?;

    if checkins.is_empty() {
        return Ok(checkins);
    }

    let visitor_ids: Vec<String> = checkins.iter().map(|c| c.visitor_id.clone()).collect();
    let owned = find_visitors_by_ids_for_owner(conn, &visitor_ids, owner_id).await?;
    let owned_ids: HashSet<String> = owned.into_iter().map(|v| v.id).collect();

    Ok(checkins
        .into_iter()
        .filter(|c| owned_ids.contains(&c.visitor_id))
        .collect())
}

pub async fn find_active_checkins_for_owner<C: ConnectionTrait>(
    conn: &C,
    owner_id: &str,
) -> Result<Vec<checkin::Model>, DbErr> {
    let visitors = find_visitors_by_owner(conn, owner_id).await?;
    let ids: Vec<String> = visitors.into_iter().map(|v| v.id).collect();
    find_active_checkins_for_visitors(conn, &ids).await
}

pub async fn find_locations_by_ids<C: ConnectionTrait>(
    conn: &C,
    ids: &[String],
) -> Result<Vec<location::Model>, DbErr> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    location::Entity::find()
        .alive()
        .filter(location::Column::Id.is_in(ids.to_vec()))
        .all(conn)
        .await
}

/// Most recently used location across any of the owner's checkins, active or
/// not.
pub async fn most_recent_location_id_for_owner<C: ConnectionTrait>(
    conn: &C,
    owner_id: &str,
) -> Result<Option<String>, DbErr> {
    let visitors = find_visitors_by_owner(conn, owner_id).await?;
    let ids: Vec<String> = visitors.into_iter().map(|v| v.id).collect();
    if ids.is_empty() {
        return Ok(None);
    }

    let recent = checkin::Entity::find()
        .alive()
        .filter(checkin::Column::VisitorId.is_in(ids))
        .order_by_desc(checkin::Column::CreatedAt)
        .one(conn)
        .await?;

    Ok(recent.map(|c| c.location_id))
}

pub async fn first_location_by_name<C: ConnectionTrait>(
    conn: &C,
) -> Result<Option<location::Model>, DbErr> {
    location::Entity::find()
        .alive()
        .order_by_asc(location::Column::Name)
        .one(conn)
        .await
}

pub async fn insert_checkins<C: ConnectionTrait>(
    conn: &C,
    rows: Vec<NewCheckin>,
) -> Result<Vec<checkin::Model>, DbErr> {
    let now = now_ts();
    let mut created = Vec::with_capacity(rows.len());

    for row in rows {
        let active = checkin::ActiveModel {
            id: Set(uuid_v4()),
            visitor_id: Set(row.visitor_id),
            location_id: Set(row.location_id),
            checkin_at: Set(row.checkin_at),
            est_checkout_at: Set(row.est_checkout_at),
            actual_checkout_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        };
        created.push(active.insert(conn).await?);
    }

    Ok(created)
}

/// Stamp `actual_checkout_at` across a set of active checkins and return the
/// updated rows. Rows already checked out are left untouched.
pub async fn set_checkout_time<C: ConnectionTrait>(
    conn: &C,
    ids: &[String],
    at: i64,
) -> Result<Vec<checkin::Model>, DbErr> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    checkin::Entity::update_many()
        .col_expr(checkin::Column::ActualCheckoutAt, Expr::value(Some(at)))
        .col_expr(checkin::Column::UpdatedAt, Expr::value(at))
        .filter(checkin::Column::Id.is_in(ids.to_vec()))
        .filter(checkin::Column::ActualCheckoutAt.is_null())
        .filter(checkin::Column::DeletedAt.is_null())
        .exec(conn)
        .await?;

    checkin::Entity::find()
        .alive()
        .filter(checkin::Column::Id.is_in(ids.to_vec()))
        .all(conn)
        .await
}

pub async fn create_visitor<C: ConnectionTrait>(
    conn: &C,
    owner_id: &str,
    name: &str,
) -> Result<visitor::Model, DbErr> {
    let now = now_ts();
    let active = visitor::ActiveModel {
        id: Set(uuid_v4()),
        name: Set(name.to_string()),
        owner_id: Set(owner_id.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        deleted_at: Set(None),
    };
    active.insert(conn).await
}

/// Soft-delete visitors owned by `owner_id`. Returns the number of rows
/// stamped.
pub async fn stamp_visitors_deleted<C: ConnectionTrait>(
    conn: &C,
    ids: &[String],
    owner_id: &str,
    at: i64,
) -> Result<u64, DbErr> {
    if ids.is_empty() {
        return Ok(0);
    }

    let res = visitor::Entity::update_many()
        .col_expr(visitor::Column::DeletedAt, Expr::value(Some(at)))
        .col_expr(visitor::Column::UpdatedAt, Expr::value(at))
        .filter(visitor::Column::Id.is_in(ids.to_vec()))
        .filter(visitor::Column::OwnerId.eq(owner_id))
        .filter(visitor::Column::DeletedAt.is_null())
        .exec(conn)
        .await?;

    Ok(res.rows_affected)
}

/// The "who is at the park now" aggregate: every location with at least one
/// active, non-deleted checkin, locations sorted by name and each visitor
/// list sorted by visitor name.
pub async fn load_roster<C: ConnectionTrait>(conn: &C) -> Result<Vec<ParkWithVisitors>, DbErr> {
    let active = checkin::Entity::find()
        .alive()
        .filter(checkin::Column::ActualCheckoutAt.is_null())
        .all(conn)
        .await?;

    if active.is_empty() {
        return Ok(Vec::new());
    }

    let visitor_ids: Vec<String> = active.iter().map(|c| c.visitor_id.clone()).collect();
    let visitors = visitor::Entity::find()
        .alive()
        .filter(visitor::Column::Id.is_in(visitor_ids))
        .all(conn)
        .await?;
    let visitors_by_id: HashMap<String, visitor::Model> =
        visitors.into_iter().map(|v| (v.id.clone(), v)).collect();

    let location_ids: Vec<String> = active.iter().map(|c| c.location_id.clone()).collect();
    let locations = location::Entity::find()
        .alive()
        .filter(location::Column::Id.is_in(location_ids))
        .order_by_asc(location::Column::Name)
        .all(conn)
        .await?;

    let mut parks = Vec::with_capacity(locations.len());
    for loc in locations {
        let mut park_visitors: Vec<ActiveVisitorCheckin> = active
            .iter()
            .filter(|c| c.location_id == loc.id)
            .filter_map(|c| {
                visitors_by_id.get(&c.visitor_id).map(|v| ActiveVisitorCheckin {
                    id: v.id.clone(),
                    name: v.name.clone(),
                    checkin: c.clone(),
                })
            })
            .collect();

        // A visitor soft-deleted mid-visit drops out of the list; a location
        // left with nobody on it drops out entirely.
        if park_visitors.is_empty() {
            continue;
        }

        park_visitors.sort_by(|a, b| a.name.cmp(&b.name));
        parks.push(ParkWithVisitors {
            id: loc.id,
            name: loc.name,
            visitors: park_visitors,
        });
    }

    Ok(parks)
}
