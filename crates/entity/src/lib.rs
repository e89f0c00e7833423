use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Select};

pub mod user;
pub mod visitor;
pub mod location;
pub mod checkin;
pub mod magic_link_token;
pub mod session;
pub mod cron_job_run;

pub use user::Entity as User;
pub use visitor::Entity as Visitor;
pub use location::Entity as Location;
pub use checkin::Entity as Checkin;
pub use magic_link_token::Entity as MagicLinkToken;
pub use session::Entity as Session;
pub use cron_job_run::Entity as CronJobRun;

/// Marker for tables that use `deleted_at` tombstones instead of row removal.
pub trait SoftDeleteEntity: EntityTrait {
    fn deleted_at_column() -> Self::Column;
}

/// Adds the default `deleted_at IS NULL` filter to a select.
///
/// Every default read goes through `alive()` so a new query cannot forget the
/// tombstone filter. Admin/audit reads that want deleted rows call the plain
/// `find()` explicitly.
pub trait FilterAlive {
    fn alive(self) -> Self;
}

impl<E: SoftDeleteEntity> FilterAlive for Select<E> {
    fn alive(self) -> Self {
        self.filter(E::deleted_at_column().is_null())
    }
}
