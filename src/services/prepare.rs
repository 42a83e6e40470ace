//! Component preparation — resolve dynamic schema content before serving.
//!
//! DESIGN
//! ======
//! Components declare their UI as a JSON schema when the app is published.
//! Parts of that schema are dynamic: select fields can point at an options
//! endpoint on the app's own backend, and link URIs must be scoped to the
//! requesting installation. The preparer walks the schema per component kind
//! and fills those parts in, mutating the in-memory row only.
//!
//! ERROR HANDLING
//! ==============
//! A misbehaving app backend (unreachable, non-2xx, malformed options) is a
//! structured `Api` failure: the aggregation records the component and moves
//! on. A schema that violates shapes enforced at publish time is `Internal`
//! and aborts the request.

use std::time::Duration;

use serde_json::Value;
use uuid::Uuid;

use crate::services::component::ComponentRow;
use crate::services::installation::InstallationRow;

// =============================================================================
// TRAIT & ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum PrepareError {
    /// The app's backend rejected or failed the preparation request.
    /// Recoverable: the component is still served, flagged as errored.
    #[error("app backend error: {0}")]
    Api(String),

    /// The stored schema is in a shape publish-time validation should have
    /// rejected. Not recoverable; aborts the whole aggregation.
    #[error("component preparation failed: {0}")]
    Internal(String),
}

impl PrepareError {
    /// True for failures that flag the component instead of aborting the request.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Api(_))
    }
}

/// Resolves a component's dynamic content prior to serialization.
/// One implementation per deployment; selection of behavior happens on
/// `component.kind`, not on the implementing type.
#[async_trait::async_trait]
pub trait ComponentPreparer: Send + Sync {
    async fn run(&self, component: &mut ComponentRow, install: &InstallationRow) -> Result<(), PrepareError>;
}

// =============================================================================
// SCHEMA PREPARER
// =============================================================================

/// Production preparer: resolves select-field options from the app's backend
/// and scopes link URIs to the installation.
pub struct SchemaPreparer {
    http: reqwest::Client,
}

impl SchemaPreparer {
    /// Build a preparer with a per-request timeout on outbound calls.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(timeout: Duration) -> Result<Self, PrepareError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PrepareError::Internal(format!("http client build failed: {e}")))?;
        Ok(Self { http })
    }

    async fn resolve_field_lists(&self, section: &mut Value, install: &InstallationRow) -> Result<(), PrepareError> {
        for key in ["required_fields", "optional_fields"] {
            let Some(fields) = section.get_mut(key).and_then(Value::as_array_mut) else {
                continue;
            };
            for field in fields {
                self.resolve_field(field, install).await?;
            }
        }
        Ok(())
    }

    async fn resolve_field(&self, field: &mut Value, install: &InstallationRow) -> Result<(), PrepareError> {
        let Some(uri) = select_options_uri(field) else {
            return Ok(());
        };

        let url = options_url(&install.webhook_url, &uri, install.uuid);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| PrepareError::Api(format!("options fetch failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(PrepareError::Api(format!("options endpoint returned {}", resp.status())));
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| PrepareError::Api(format!("options response not JSON: {e}")))?;
        field["choices"] = parse_choices(&body)?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl ComponentPreparer for SchemaPreparer {
    async fn run(&self, component: &mut ComponentRow, install: &InstallationRow) -> Result<(), PrepareError> {
        match component.kind.as_str() {
            "issue-link" => {
                for section in ["link", "create"] {
                    if let Some(value) = component.schema.get_mut(section) {
                        self.resolve_field_lists(value, install).await?;
                    }
                }
            }
            "alert-rule-action" => {
                if let Some(settings) = component.schema.get_mut("settings") {
                    self.resolve_field_lists(settings, install).await?;
                }
            }
            "stacktrace-link" => {
                let Some(uri) = component.schema.get("uri").and_then(Value::as_str) else {
                    return Err(PrepareError::Internal(format!(
                        "stacktrace-link component {} has no uri",
                        component.uuid
                    )));
                };
                component.schema["uri"] = Value::String(with_installation_param(uri, install.uuid));
            }
            // Unknown kinds have no dynamic content.
            _ => {}
        }
        Ok(())
    }
}

// =============================================================================
// SCHEMA WALK HELPERS
// =============================================================================

/// Return the options URI for a select field that loads its choices remotely.
fn select_options_uri(field: &Value) -> Option<String> {
    if field.get("type").and_then(Value::as_str) != Some("select") {
        return None;
    }
    field.get("uri").and_then(Value::as_str).map(str::to_owned)
}

/// Join the app's webhook base with an options URI and the installation scope.
fn options_url(webhook_url: &str, uri: &str, install_uuid: Uuid) -> String {
    let base = webhook_url.trim_end_matches('/');
    let sep = if uri.contains('?') { '&' } else { '?' };
    format!("{base}{uri}{sep}installationId={install_uuid}")
}

/// Append the installation scope to a component-declared URI.
fn with_installation_param(uri: &str, install_uuid: Uuid) -> String {
    let sep = if uri.contains('?') { '&' } else { '?' };
    format!("{uri}{sep}installationId={install_uuid}")
}

/// Validate an options response body: `{"choices": [[value, label], ...]}`.
fn parse_choices(body: &Value) -> Result<Value, PrepareError> {
    let choices = body
        .get("choices")
        .and_then(Value::as_array)
        .ok_or_else(|| PrepareError::Api("options response missing choices array".to_owned()))?;

    for choice in choices {
        let ok = choice.as_array().is_some_and(|pair| pair.len() == 2);
        if !ok {
            return Err(PrepareError::Api(format!("malformed choice entry: {choice}")));
        }
    }
    Ok(Value::Array(choices.clone()))
}

#[cfg(test)]
#[path = "prepare_test.rs"]
mod tests;
