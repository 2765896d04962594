use crate::{
    db,
    models::{ListOrder, Record},
    AppState,
};
use askama::Template;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tokio_stream::StreamExt;

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    records: Vec<Record>,
}

#[derive(Template)]
#[template(path = "hits.html")]
struct HitsTemplate {
    records: Vec<Record>,
}

/// GET /
/// Every link, newest first.
pub async fn index(State(state): State<Arc<AppState>>) -> Response {
    let records: Vec<Record> = db::list_recent(&state.db, ListOrder::Time, None)
        .collect()
        .await;
    IndexTemplate { records }.into_response()
}

/// GET /hits/
/// Every link, most visited first.
pub async fn hits(State(state): State<Arc<AppState>>) -> Response {
    let records: Vec<Record> = db::list_recent(&state.db, ListOrder::Hits, None)
        .collect()
        .await;
    HitsTemplate { records }.into_response()
}
