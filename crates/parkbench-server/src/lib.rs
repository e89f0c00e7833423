pub mod config;
pub mod crypto;
pub mod db;
pub mod email;
pub mod engine;
pub mod error;
pub mod events;
pub mod handlers;
pub mod maintenance;
pub mod roster;
pub mod store;
pub mod tokens;
pub mod util;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use sea_orm::DatabaseConnection;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::email::Mailer;
use crate::engine::CheckinEngine;
use crate::events::ChangeBroadcaster;
use crate::roster::{RosterCache, ROSTER_CACHE_TTL};

/// Shared application services, built once at startup and handed to every
/// handler. The roster cache and the broadcaster are the only mutable
/// in-process state.
pub struct AppState {
    pub config: Config,
    pub db: DatabaseConnection,
    pub engine: CheckinEngine,
    pub roster: Arc<RosterCache>,
    pub events: Arc<ChangeBroadcaster>,
    pub mailer: Mailer,
}

impl AppState {
    pub fn new(config: Config, db: DatabaseConnection) -> Arc<Self> {
        let roster = Arc::new(RosterCache::new(ROSTER_CACHE_TTL));
        let events = Arc::new(ChangeBroadcaster::new());
        let mailer = Mailer::from_config(&config);
        let engine = CheckinEngine::new(db.clone(), roster.clone(), events.clone());

        Arc::new(Self {
            config,
            db,
            engine,
            roster,
            events,
            mailer,
        })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/auth/signin", post(handlers::auth::signin))
        .route("/auth/magic", get(handlers::auth::magic))
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/verify", get(handlers::auth::verify_email))
        .route(
            "/auth/resend-verification",
            post(handlers::auth::resend_verification),
        )
        .route("/auth/signout", post(handlers::auth::signout))
        .route("/checkin", post(handlers::checkins::checkin))
        .route("/checkout", post(handlers::checkins::checkout))
        .route("/checkin-all", post(handlers::checkins::checkin_all))
        .route("/checkout-all", post(handlers::checkins::checkout_all))
        .route("/api/parks", get(handlers::parks::list_parks))
        .route("/api/events", get(handlers::events::subscribe))
        .route(
            "/profile/visitors",
            get(handlers::visitors::list)
                .post(handlers::visitors::create)
                .delete(handlers::visitors::remove),
        )
        .route("/admin/cron", get(handlers::admin::cron_status))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
