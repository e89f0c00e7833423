use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Single-use magic-link sign-in token.
///
/// Only the sha-256 of the raw token is stored. A token is valid while
/// `used_at` is null and `expires_at` is in the future; verification marks
/// it used in the same conditional update that checks both.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "magic_link_tokens")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: String,

    pub email: String,

    #[sea_orm(unique)]
    pub token_hash: String,

    /// Unix timestamp (seconds).
    pub expires_at: i64,

    /// Unix timestamp (seconds). Set exactly once; never cleared.
    pub used_at: Option<i64>,

    /// Unix timestamp (seconds).
    pub created_at: i64,

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
