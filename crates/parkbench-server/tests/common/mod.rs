//! Shared fixtures: an in-memory database with the full schema applied and
//! seed helpers for the handful of rows most tests need.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};

use entity::{location, user, visitor};
use parkbench_server::config::Config;
use parkbench_server::engine::CheckinEngine;
use parkbench_server::events::ChangeBroadcaster;
use parkbench_server::roster::RosterCache;
use parkbench_server::util::{now_ts, uuid_v4};
use parkbench_server::AppState;

pub async fn test_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    // A single connection keeps the in-memory database shared across the
    // whole test, transactions included.
    options.max_connections(1);
    options.sqlx_logging(false);

    let db = Database::connect(options).await.expect("connect test db");
    Migrator::up(&db, None).await.expect("run migrations");
    db
}

pub fn test_config() -> Config {
    Config {
        port: 0,
        database_url: "sqlite::memory:".to_string(),
        base_url: "http://localhost:8080".to_string(),
        brevo_api_key: None,
        brevo_sender_email: None,
        brevo_sender_name: None,
        maintenance_interval_secs: 60,
    }
}

pub async fn test_state() -> Arc<AppState> {
    AppState::new(test_config(), test_db().await)
}

pub struct TestEngine {
    pub engine: CheckinEngine,
    pub roster: Arc<RosterCache>,
    pub events: Arc<ChangeBroadcaster>,
}

pub fn engine_for(db: &DatabaseConnection) -> TestEngine {
    engine_with_ttl(db, Duration::from_secs(5))
}

pub fn engine_with_ttl(db: &DatabaseConnection, ttl: Duration) -> TestEngine {
    let roster = Arc::new(RosterCache::new(ttl));
    let events = Arc::new(ChangeBroadcaster::new());
    let engine = CheckinEngine::new(db.clone(), roster.clone(), events.clone());
    TestEngine {
        engine,
        roster,
        events,
    }
}

pub async fn seed_user(db: &DatabaseConnection, name: &str, email: &str) -> user::Model {
    let now = now_ts();
    user::ActiveModel {
        id: Set(uuid_v4()),
        name: Set(name.to_string()),
        email: Set(email.to_string()),
        email_verification_token_hash: Set(None),
        email_verification_expires_at: Set(None),
        email_verified_at: Set(Some(now)),
        created_at: Set(now),
        updated_at: Set(now),
        deleted_at: Set(None),
    }
    .insert(db)
    .await
    .expect("seed user")
}

pub async fn seed_visitor(db: &DatabaseConnection, owner_id: &str, name: &str) -> visitor::Model {
    let now = now_ts();
    visitor::ActiveModel {
        id: Set(uuid_v4()),
        name: Set(name.to_string()),
        owner_id: Set(owner_id.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        deleted_at: Set(None),
    }
    .insert(db)
    .await
    .expect("seed visitor")
}

pub async fn seed_location(db: &DatabaseConnection, name: &str) -> location::Model {
    let now = now_ts();
    location::ActiveModel {
        id: Set(uuid_v4()),
        name: Set(name.to_string()),
        nickname: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        deleted_at: Set(None),
    }
    .insert(db)
    .await
    .expect("seed location")
}
