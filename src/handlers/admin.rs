use crate::{
    db,
    errors::{StoreError, ValidationError},
    handlers::redirect::SHORT_LINK_PREFIX,
    models::Link,
    AppState,
};
use askama::Template;
use axum::{
    extract::{rejection::FormRejection, Form, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;

// ── Template structs ───────────────────────────────────────────────────────

#[derive(Template)]
#[template(path = "add.html")]
struct AddTemplate {
    message: Option<String>,
}

#[derive(Template)]
#[template(path = "added.html")]
struct AddedTemplate {
    link: Link,
    short_url: String,
}

// ── Form types ─────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct AddLinkForm {
    #[serde(default)]
    url: String,
    #[serde(default)]
    desc: String,
}

impl AddLinkForm {
    /// `(url, description)` as submitted, or an error if either is blank.
    /// The URL is not trimmed: the identifier is derived from the exact value.
    fn validate(&self) -> Result<(&str, &str), ValidationError> {
        if self.url.trim().is_empty() || self.desc.trim().is_empty() {
            return Err(ValidationError::MissingFields);
        }
        Ok((&self.url, &self.desc))
    }
}

// ── Handlers ───────────────────────────────────────────────────────────────

/// GET /admin/add/
pub async fn add_form() -> Response {
    AddTemplate { message: None }.into_response()
}

/// POST /admin/add/
///
/// A body that isn't a urlencoded form is treated like an empty submission.
pub async fn add_link(
    State(state): State<Arc<AppState>>,
    form: Result<Form<AddLinkForm>, FormRejection>,
) -> Response {
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            tracing::debug!("Unreadable add form: {}", rejection);
            AddLinkForm::default()
        }
    };

    let (url, desc) = match form.validate() {
        Ok(fields) => fields,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                AddTemplate {
                    message: Some(e.to_string()),
                },
            )
                .into_response();
        }
    };

    match db::insert_link(&state.db, url, desc, chrono::Utc::now()).await {
        Ok(hash) => {
            tracing::info!("Added link {} -> {}", hash, url);
            let link = match db::get_link(&state.db, &hash).await {
                Ok(Some(link)) => link,
                Ok(None) => {
                    tracing::error!("Link '{}' missing right after insert", hash);
                    return super::internal_error();
                }
                Err(e) => {
                    tracing::error!("Failed to read back link '{}': {:?}", hash, e);
                    return super::internal_error();
                }
            };
            let short_url = format!("{}{}{}", state.config.pretty_addr, SHORT_LINK_PREFIX, hash);
            AddedTemplate { link, short_url }.into_response()
        }
        Err(e @ StoreError::DuplicateKey) => (
            StatusCode::CONFLICT,
            AddTemplate {
                message: Some(e.to_string()),
            },
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to add link for '{}': {:?}", url, e);
            super::internal_error()
        }
    }
}
