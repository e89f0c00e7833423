use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Parent/guardian account.
///
/// Authentication is passwordless; the only secret material on this row is
/// the hashed email-verification token, which follows the same single-use
/// expiring pattern as magic-link tokens.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: String,

    pub name: String,

    #[sea_orm(unique)]
    pub email: String,

    /// Sha-256 hex of the outstanding verification token; never the raw token.
    pub email_verification_token_hash: Option<String>,

    /// Unix timestamp (seconds).
    pub email_verification_expires_at: Option<i64>,

    /// Unix timestamp (seconds). Set once on successful verification.
    pub email_verified_at: Option<i64>,

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
