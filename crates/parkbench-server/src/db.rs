use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

use crate::config::Config;

pub async fn connect(config: &Config) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.database_url.clone());

    // Keep the pool small and timeouts short; this is a low-traffic app and
    // a stuck acquire should surface quickly.
    options.max_connections(5);
    options.min_connections(1);
    options.connect_timeout(Duration::from_secs(5));
    options.acquire_timeout(Duration::from_secs(5));
    options.idle_timeout(Duration::from_secs(30));
    options.sqlx_logging(false);

    Database::connect(options).await
}
