//! Identity-linking routes — signed entry point for the chat-vendor flow.
//!
//! SYSTEM CONTEXT
//! ==============
//! When a user asks the chat vendor to connect their identity, the platform
//! mints a signed URL pointing back here. The vendor shows it to the user,
//! whose browser lands on `link_identity` with the token in the path. All
//! responses on this surface disable caching: the URLs are user-specific.

use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::header::CACHE_CONTROL;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use serde_json::Value;

use crate::services::signing::{self, SigningError};
use crate::state::{AppState, LinkingConfig};

/// How long a minted linking URL stays valid.
pub const LINK_MAX_AGE: Duration = Duration::from_secs(15 * 60);

// =============================================================================
// URL + PAGE HELPERS
// =============================================================================

/// Build the absolute signed URL handed to the chat vendor. `endpoint` is the
/// route prefix (e.g. `/extensions/chat/link`); `params` is recovered intact
/// by `link_identity` after signature verification.
///
/// # Errors
///
/// Returns a signing error if the params cannot be serialized.
pub fn build_linking_url(config: &LinkingConfig, endpoint: &str, params: &Value) -> Result<String, SigningError> {
    let token = signing::sign(&config.secret, signing::LINKING_SALT, params)?;
    Ok(format!("{}{endpoint}/{token}", config.external_base_url))
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn page(title: &str, body_text: &str) -> String {
    format!(
        "<!doctype html>\n<html><head><meta charset=\"utf-8\"><title>{title}</title></head>\
         <body><h1>{title}</h1><p>{}</p></body></html>",
        escape_html(body_text)
    )
}

fn no_store(mut response: Response) -> Response {
    response
        .headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

/// Render a generic HTML error page with the given status.
pub fn render_error_page(status: StatusCode, body_text: &str) -> Response {
    no_store((status, Html(page("Something went wrong", body_text))).into_response())
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `GET /extensions/chat/link/:signed_params` — verify the token and show
/// the linking confirmation page.
pub async fn link_identity(State(state): State<AppState>, Path(signed_params): Path<String>) -> Response {
    let Some(config) = &state.linking else {
        return render_error_page(StatusCode::SERVICE_UNAVAILABLE, "Identity linking is not configured.");
    };

    let params = match signing::unsign(&config.secret, signing::LINKING_SALT, &signed_params, LINK_MAX_AGE) {
        Ok(params) => params,
        Err(SigningError::Expired) => {
            return render_error_page(StatusCode::BAD_REQUEST, "This linking link has expired. Request a new one.");
        }
        Err(SigningError::Malformed | SigningError::BadSignature) => {
            return render_error_page(StatusCode::BAD_REQUEST, "This linking link is not valid.");
        }
    };

    let app = params.get("app_slug").and_then(Value::as_str).unwrap_or("an installed app");
    let external_id = params.get("external_id").and_then(Value::as_str).unwrap_or("your chat account");
    tracing::info!(app, "serving identity-linking confirmation");

    no_store(
        Html(page(
            "Link your identity",
            &format!("Confirm connecting {external_id} with {app}."),
        ))
        .into_response(),
    )
}

#[cfg(test)]
#[path = "linking_test.rs"]
mod tests;
