use crate::{db, errors::StoreError, AppState};
use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// Path prefix in front of every short link.
pub const SHORT_LINK_PREFIX: &str = "/:/";

/// Router fallback.
///
/// Requests under `/:/` (any method) are short links: look the identifier up,
/// count the hit and answer with a 301. Any other unrouted path gets the
/// recent-links index, like `/`.
pub async fn fallback(State(state): State<Arc<AppState>>, uri: Uri) -> Response {
    match uri.path().strip_prefix(SHORT_LINK_PREFIX) {
        Some(hash) if !hash.is_empty() => redirect(&state, hash).await,
        Some(_) => not_found(),
        None => super::listing::index(State(state)).await,
    }
}

async fn redirect(state: &AppState, hash: &str) -> Response {
    let url = match db::resolve_link(&state.db, hash).await {
        Ok(url) => url,
        Err(StoreError::NotFound) => return not_found(),
        Err(e) => {
            tracing::error!("DB error resolving '{}': {:?}", hash, e);
            return super::internal_error();
        }
    };

    match HeaderValue::try_from(url.as_str()) {
        Ok(location) => (
            StatusCode::MOVED_PERMANENTLY,
            [(header::LOCATION, location)],
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Stored URL for '{}' is not a valid Location: {}", hash, e);
            super::internal_error()
        }
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "404 not found").into_response()
}
