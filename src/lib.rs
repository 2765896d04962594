use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{services::ServeDir, trace::TraceLayer};

pub mod config;
pub mod db;
pub mod errors;
pub mod feed;
pub mod handlers;
pub mod hasher;
pub mod models;

use feed::FeedCache;

// ── Shared application state ───────────────────────────────────────────────

/// Everything a handler needs, built once at startup.
///
/// The pool is safe for concurrent use; the config and feed cache settings
/// never change after construction.
pub struct AppState {
    pub db: sqlx::SqlitePool,
    pub config: config::AppConfig,
    pub feed: FeedCache,
}

impl AppState {
    pub fn new(db: sqlx::SqlitePool, config: config::AppConfig) -> Self {
        let feed = FeedCache::new(
            config.feed_dir.clone(),
            config.pretty_addr.clone(),
            config.feed_limit,
            feed::FEED_MAX_AGE,
        );
        Self { db, config, feed }
    }
}

// ── Router ─────────────────────────────────────────────────────────────────

pub fn router(state: Arc<AppState>) -> Router {
    let static_files = ServeDir::new(state.config.asset_dir.join("static"));

    Router::new()
        .route("/", get(handlers::listing::index))
        .route("/hits", get(handlers::listing::hits))
        .route("/hits/", get(handlers::listing::hits))
        .route(
            "/admin/add",
            get(handlers::admin::add_form).post(handlers::admin::add_link),
        )
        .route(
            "/admin/add/",
            get(handlers::admin::add_form).post(handlers::admin::add_link),
        )
        .route("/rss", get(handlers::rss::feed))
        .route("/rss/", get(handlers::rss::feed))
        .nest_service("/s", static_files)
        // "/:/<hash>" can't be expressed as a route because a leading ':'
        // marks a path parameter, so short links go through the fallback.
        .fallback(handlers::redirect::fallback)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
