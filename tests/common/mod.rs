#![allow(dead_code)]

use std::{path::Path, sync::Arc};

use axum::{body::Body, http::Request, response::Response, Router};
use linkblog::{config::AppConfig, db, AppState};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    SqlitePool,
};
use tower::ServiceExt;

pub const PRETTY_ADDR: &str = "http://links.test";

/// A fresh in-memory database with the schema applied.
///
/// A single connection that never expires keeps the in-memory database alive
/// for the whole test.
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    pool
}

/// A database file in `dir` shared by several connections, for tests that
/// need queries to actually run side by side.
pub async fn file_pool(dir: &Path, connections: u32) -> SqlitePool {
    let options = SqliteConnectOptions::new()
        .filename(dir.join("links.db"))
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(std::time::Duration::from_secs(10));
    let pool = SqlitePoolOptions::new()
        .max_connections(connections)
        .connect_with(options)
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    pool
}

/// Make every hit-counter update fail.
pub async fn block_hit_updates(pool: &SqlitePool) {
    sqlx::query(
        "CREATE TRIGGER block_hits BEFORE UPDATE ON links
         BEGIN SELECT RAISE(FAIL, 'hits are read-only'); END",
    )
    .execute(pool)
    .await
    .unwrap();
}

pub async fn hits_for(pool: &SqlitePool, hash: &str) -> i64 {
    db::get_link(pool, hash).await.unwrap().unwrap().hits
}

pub fn test_config(feed_dir: &Path) -> AppConfig {
    AppConfig {
        listen_addr: "127.0.0.1:0".into(),
        database_url: "sqlite::memory:".into(),
        pretty_addr: PRETTY_ADDR.into(),
        feed_limit: 50,
        asset_dir: feed_dir.to_path_buf(),
        feed_dir: feed_dir.to_path_buf(),
    }
}

pub fn test_app(pool: SqlitePool, feed_dir: &Path) -> Router {
    linkblog::router(Arc::new(AppState::new(pool, test_config(feed_dir))))
}

pub async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn row_count(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM links")
        .fetch_one(pool)
        .await
        .unwrap()
}
