use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Bearer session issued after a successful magic-link verification.
///
/// Sessions are hard-deleted on sign-out; they carry no history worth
/// keeping, so the soft-delete policy does not apply here.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "sessions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: String,

    pub user_id: String,

    #[sea_orm(unique)]
    pub access_token: String,

    /// Unix timestamp (seconds).
    pub expires_at: i64,

    /// Unix timestamp (seconds).
    pub created_at: i64,

    /// Unix timestamp (seconds).
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
