pub use sea_orm_migration::prelude::*;

mod m20260801_000001_core_tables;
mod m20260801_000002_auth_tables;
mod m20260803_000003_cron_job_runs;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260801_000001_core_tables::Migration),
            Box::new(m20260801_000002_auth_tables::Migration),
            Box::new(m20260803_000003_cron_job_runs::Migration),
        ]
    }
}
