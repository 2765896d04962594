pub mod admin;
pub mod listing;
pub mod redirect;
pub mod rss;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Generic 500 used once the real error has been logged.
pub(crate) fn internal_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
}
