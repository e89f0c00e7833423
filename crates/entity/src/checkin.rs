use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A time-bounded record of a visitor being present at a location.
///
/// A checkin is "active" while `actual_checkout_at` is null. At most one
/// active, non-deleted row may exist per visitor at any time; the engine
/// enforces this inside the transaction that inserts new rows.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "checkins")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: String,

    pub visitor_id: String,

    pub location_id: String,

    /// Unix timestamp (seconds).
    pub checkin_at: i64,

    /// Unix timestamp (seconds). Always `>= checkin_at`.
    pub est_checkout_at: i64,

    /// Unix timestamp (seconds). Set exactly once, on checkout.
    pub actual_checkout_at: Option<i64>,

    /// Unix timestamp (seconds).
    pub created_at: i64,

    /// Unix timestamp (seconds).
    pub updated_at: i64,

    /// Unix timestamp (seconds). Soft-delete tombstone.
    pub deleted_at: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl crate::SoftDeleteEntity for Entity {
    fn deleted_at_column() -> Self::Column {
        Column::DeletedAt
    }
}
