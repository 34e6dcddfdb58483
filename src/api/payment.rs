//! Gateway callback endpoints. Every outcome is a 303 redirect.

use axum::extract::rejection::{FormRejection, QueryRejection};
use axum::extract::{Form, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use super::AppState;
use crate::payment::{CallbackFields, CallbackOutcome};

pub async fn callback_post(
    State(s): State<AppState>,
    headers: HeaderMap,
    form: Result<Form<CallbackFields>, FormRejection>,
) -> Response {
    let base = base_url(s.public_base_url.as_deref(), &headers);
    match form {
        Ok(Form(fields)) => respond(&s, fields, &base).await,
        Err(e) => {
            tracing::error!(error = %e, "unreadable payment callback body");
            redirect(&CallbackOutcome::system_error(&base).redirect_url)
        }
    }
}

pub async fn callback_get(
    State(s): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<CallbackFields>, QueryRejection>,
) -> Response {
    let base = base_url(s.public_base_url.as_deref(), &headers);
    match query {
        Ok(Query(fields)) => respond(&s, fields, &base).await,
        Err(e) => {
            tracing::error!(error = %e, "unreadable payment callback query");
            redirect(&CallbackOutcome::system_error(&base).redirect_url)
        }
    }
}

async fn respond(s: &AppState, fields: CallbackFields, base: &str) -> Response {
    let outcome = match s.payments.handle(fields, base).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(error = %e, "payment callback failed");
            CallbackOutcome::system_error(base)
        }
    };
    redirect(&outcome.redirect_url)
}

fn redirect(location: &str) -> Response {
    (
        StatusCode::SEE_OTHER,
        [
            (header::LOCATION, location),
            (header::CACHE_CONTROL, "no-cache, no-store, must-revalidate"),
            (header::PRAGMA, "no-cache"),
            (header::EXPIRES, "0"),
        ],
    )
        .into_response()
}

/// Configured public URL, else scheme and host of the incoming request.
pub fn base_url(configured: Option<&str>, headers: &HeaderMap) -> String {
    if let Some(url) = configured {
        return url.trim_end_matches('/').to_string();
    }
    let host = headers.get(header::HOST).and_then(|h| h.to_str().ok()).unwrap_or_default();
    let proto = headers
        .get("x-forwarded-proto")
        .and_then(|h| h.to_str().ok())
        .unwrap_or(if host.contains("localhost") { "http" } else { "https" });
    format!("{}://{}", proto, host)
}
