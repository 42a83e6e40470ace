//! Component listing routes — per-app and organization-wide.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::services::component::{self, ComponentRow, OrgComponents};
use crate::state::AppState;

const DEFAULT_PAGE_LIMIT: usize = 25;
const MAX_PAGE_LIMIT: usize = 100;

// =============================================================================
// PAGINATION & SERIALIZATION
// =============================================================================

#[derive(Deserialize)]
pub struct ComponentListQuery {
    /// Restrict to components of exactly this type. Organization endpoint only.
    pub filter: Option<String>,
    #[serde(default)]
    pub offset: usize,
    pub limit: Option<usize>,
}

impl ComponentListQuery {
    fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT)
    }
}

/// Rendered component as returned to the caller.
#[derive(Serialize)]
pub struct ComponentView {
    pub uuid: Uuid,
    #[serde(rename = "type")]
    pub kind: String,
    pub app: String,
    pub schema: serde_json::Value,
    /// True when preparation of this component failed recoverably.
    pub error: bool,
}

#[derive(Serialize)]
pub struct ComponentPage {
    pub components: Vec<ComponentView>,
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
}

fn render(row: ComponentRow, errors: &[String]) -> ComponentView {
    let uuid_str = row.uuid.to_string();
    let error = errors.iter().any(|e| *e == uuid_str);
    ComponentView { uuid: row.uuid, kind: row.kind, app: row.app_slug, schema: row.schema, error }
}

/// Slice an in-memory sequence by offset/limit into a page envelope.
fn paginate(rows: Vec<ComponentRow>, errors: &[String], offset: usize, limit: usize) -> ComponentPage {
    let total = rows.len();
    let components = rows
        .into_iter()
        .skip(offset)
        .take(limit)
        .map(|row| render(row, errors))
        .collect();
    ComponentPage { components, total, offset, limit }
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `GET /api/apps/:app_id/components` — list one app's declared components.
///
/// No preparation runs here: the declared schema is returned as stored, so
/// the error flag is always false on this surface.
pub async fn app_components(
    State(state): State<AppState>,
    Path(app_id): Path<i64>,
    Query(query): Query<ComponentListQuery>,
) -> Result<Json<ComponentPage>, StatusCode> {
    component::app_slug(&state.pool, app_id)
        .await
        .map_err(component_error_to_status)?;

    let rows = component::list_for_app(&state.pool, app_id, None)
        .await
        .map_err(|e| component_error_to_status(e.into()))?;

    Ok(Json(paginate(rows, &[], query.offset, query.limit())))
}

/// `GET /api/organizations/:org_id/components` — aggregate prepared
/// components across every app installed for the organization.
pub async fn org_components(
    State(state): State<AppState>,
    Path(org_id): Path<i64>,
    Query(query): Query<ComponentListQuery>,
) -> Result<Json<ComponentPage>, StatusCode> {
    let OrgComponents { components, errors } = component::aggregate_for_organization(
        &state.pool,
        state.preparer.as_ref(),
        org_id,
        query.filter.as_deref(),
    )
    .await
    .map_err(component_error_to_status)?;

    Ok(Json(paginate(components, &errors, query.offset, query.limit())))
}

pub(crate) fn component_error_to_status(err: component::ComponentError) -> StatusCode {
    match err {
        component::ComponentError::AppNotFound(_) => StatusCode::NOT_FOUND,
        component::ComponentError::Database(_) | component::ComponentError::Prepare(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[cfg(test)]
#[path = "components_test.rs"]
mod tests;
