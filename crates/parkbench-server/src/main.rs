use std::net::SocketAddr;

use migration::{Migrator, MigratorTrait};
use tracing::info;
use tracing_subscriber::EnvFilter;

use parkbench_server::config::Config;
use parkbench_server::{db, maintenance, router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::load();

    let db = db::connect(&config).await?;
    Migrator::up(&db, None).await?;

    let state = AppState::new(config, db);

    tokio::spawn(maintenance::run_periodic(state.clone()));

    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on {addr}");

    axum::serve(listener, router(state)).await?;

    Ok(())
}
