use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Liveness record for scheduled maintenance jobs.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "cron_job_runs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub job_name: String,

    /// Unix timestamp (seconds).
    pub last_run_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
