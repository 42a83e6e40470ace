//! Component service — per-app listing and organization-wide aggregation.
//!
//! DESIGN
//! ======
//! The organization endpoint walks installations in id order and, within
//! each, that app's components in id order, preparing every component as it
//! goes. The walk order is the pagination order, so it must not depend on
//! preparation outcomes: a component whose preparation fails with a
//! recoverable error stays in the sequence and is flagged by uuid instead.
//!
//! ERROR HANDLING
//! ==============
//! Recoverable preparation failures accumulate in `OrgComponents::errors`
//! and the walk continues. Database errors and unrecoverable preparation
//! failures abort the whole aggregation.

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::services::installation::{self, InstallationRow};
use crate::services::prepare::{ComponentPreparer, PrepareError};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ComponentError {
    #[error("app not found: {0}")]
    AppNotFound(i64),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Prepare(#[from] PrepareError),
}

/// Row returned from component queries, joined with the owning app's slug
/// for serialization. `schema` is the declared UI payload; preparation
/// mutates it in memory and the mutation is never written back.
#[derive(Debug, Clone)]
pub struct ComponentRow {
    pub id: i64,
    pub uuid: Uuid,
    pub app_id: i64,
    pub app_slug: String,
    pub kind: String,
    pub schema: serde_json::Value,
}

/// Aggregation result: the ordered component sequence plus the uuids of
/// components whose preparation failed recoverably. The error set is carried
/// as an explicit value so the pipeline stays a pure fold over its inputs.
#[derive(Debug, Default)]
pub struct OrgComponents {
    pub components: Vec<ComponentRow>,
    pub errors: Vec<String>,
}

// =============================================================================
// QUERIES
// =============================================================================

/// Check that an app exists, returning its slug.
///
/// # Errors
///
/// Returns `AppNotFound` for missing ids, or a database error.
pub async fn app_slug(pool: &PgPool, app_id: i64) -> Result<String, ComponentError> {
    sqlx::query_scalar::<_, String>("SELECT slug FROM apps WHERE id = $1")
        .bind(app_id)
        .fetch_optional(pool)
        .await?
        .ok_or(ComponentError::AppNotFound(app_id))
}

/// List an app's declared components in id order, optionally restricted to
/// one kind. Equality on `kind` is exact; no filter returns every component.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_for_app(
    pool: &PgPool,
    app_id: i64,
    kind_filter: Option<&str>,
) -> Result<Vec<ComponentRow>, sqlx::Error> {
    let rows = match kind_filter {
        Some(kind) => {
            sqlx::query_as::<_, (i64, Uuid, i64, String, String, serde_json::Value)>(
                "SELECT c.id, c.uuid, c.app_id, a.slug, c.kind, c.schema
                 FROM app_components c
                 JOIN apps a ON a.id = c.app_id
                 WHERE c.app_id = $1 AND c.kind = $2
                 ORDER BY c.id ASC",
            )
            .bind(app_id)
            .bind(kind)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, (i64, Uuid, i64, String, String, serde_json::Value)>(
                "SELECT c.id, c.uuid, c.app_id, a.slug, c.kind, c.schema
                 FROM app_components c
                 JOIN apps a ON a.id = c.app_id
                 WHERE c.app_id = $1
                 ORDER BY c.id ASC",
            )
            .bind(app_id)
            .fetch_all(pool)
            .await?
        }
    };

    Ok(rows
        .into_iter()
        .map(|(id, uuid, app_id, app_slug, kind, schema)| ComponentRow { id, uuid, app_id, app_slug, kind, schema })
        .collect())
}

// =============================================================================
// AGGREGATION
// =============================================================================

/// Aggregate all components visible to an organization, prepared and in
/// stable order: installations by id ascending, then components by id
/// ascending within each installation.
///
/// # Errors
///
/// Returns a database error if a lookup fails, or an unrecoverable
/// preparation error. Recoverable preparation failures do not error; they
/// are reported per component in the returned value.
pub async fn aggregate_for_organization(
    pool: &PgPool,
    preparer: &dyn ComponentPreparer,
    org_id: i64,
    kind_filter: Option<&str>,
) -> Result<OrgComponents, ComponentError> {
    let installs = installation::list_installed_for_organization(pool, org_id).await?;

    let mut batch = Vec::with_capacity(installs.len());
    for install in installs {
        let components = list_for_app(pool, install.app_id, kind_filter).await?;
        batch.push((install, components));
    }

    let result = prepare_batch(preparer, batch).await?;
    info!(
        %org_id,
        components = result.components.len(),
        errors = result.errors.len(),
        "aggregated organization components"
    );
    Ok(result)
}

/// Prepare an already-fetched batch of (installation, components) pairs,
/// in the order given, folding recoverable failures into the error list.
///
/// Separated from the fetch so the ordering and partial-failure contract is
/// testable without a database.
///
/// # Errors
///
/// Returns the first unrecoverable preparation error encountered.
pub async fn prepare_batch(
    preparer: &dyn ComponentPreparer,
    batch: Vec<(InstallationRow, Vec<ComponentRow>)>,
) -> Result<OrgComponents, ComponentError> {
    let mut out = OrgComponents::default();

    for (install, components) in batch {
        for mut component in components {
            match preparer.run(&mut component, &install).await {
                Ok(()) => {}
                Err(err) if err.is_recoverable() => {
                    tracing::warn!(
                        component = %component.uuid,
                        install = %install.uuid,
                        error = %err,
                        "component preparation failed; serving flagged"
                    );
                    out.errors.push(component.uuid.to_string());
                }
                Err(err) => return Err(err.into()),
            }
            // Failed preparation never drops a component from the sequence.
            out.components.push(component);
        }
    }

    Ok(out)
}

#[cfg(test)]
#[path = "component_test.rs"]
mod tests;
