use crate::AppState;
use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

const RSS_CONTENT_TYPE: &str = "application/rss+xml; charset=utf-8";

/// GET /rss/
///
/// Serves the cached feed, rebuilding it first when missing or stale. The
/// fingerprint is sent as the ETag and honoured in `If-None-Match`.
pub async fn feed(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let artifact = match state.feed.get(&state.db).await {
        Ok(a) => a,
        Err(e) => {
            tracing::error!("Failed to produce RSS feed: {:?}", e);
            return super::internal_error();
        }
    };

    let etag = match HeaderValue::try_from(format!("\"{}\"", artifact.fingerprint)) {
        Ok(v) => v,
        Err(e) => {
            tracing::error!("Feed fingerprint is not a valid header value: {}", e);
            return super::internal_error();
        }
    };

    if matches_etag(&headers, &etag) {
        return (StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response();
    }

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(RSS_CONTENT_TYPE)),
            (header::ETAG, etag),
        ],
        artifact.body,
    )
        .into_response()
}

/// `true` when any tag in `If-None-Match` names the current fingerprint.
fn matches_etag(headers: &HeaderMap, etag: &HeaderValue) -> bool {
    let Some(etag) = etag.to_str().ok() else {
        return false;
    };
    headers
        .get_all(header::IF_NONE_MATCH)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|tag| tag.trim().trim_start_matches("W/"))
        .any(|tag| tag == "*" || tag == etag)
}
