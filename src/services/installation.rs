//! Installation lookup — which apps an organization has installed.

use sqlx::PgPool;
use uuid::Uuid;

/// Row returned from installation queries, joined with the owning app.
/// Carries the app's slug and webhook base URL because the preparer
/// resolves dynamic component content against the app's backend.
#[derive(Debug, Clone)]
pub struct InstallationRow {
    pub id: i64,
    pub uuid: Uuid,
    pub app_id: i64,
    pub organization_id: i64,
    pub app_slug: String,
    pub webhook_url: String,
}

/// List all active installations for an organization, oldest first.
///
/// "Active" means accepted (`status = 'installed'`) and not tombstoned.
/// Ordering by installation id is load-bearing: the aggregation endpoint
/// paginates the combined component sequence, so the walk order must be
/// stable across requests.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_installed_for_organization(pool: &PgPool, org_id: i64) -> Result<Vec<InstallationRow>, sqlx::Error> {
    let rows = sqlx::query_as::<_, (i64, Uuid, i64, i64, String, String)>(
        "SELECT i.id, i.uuid, i.app_id, i.organization_id, a.slug, a.webhook_url
         FROM app_installations i
         JOIN apps a ON a.id = i.app_id
         WHERE i.organization_id = $1
           AND i.status = 'installed'
           AND i.deleted_at IS NULL
         ORDER BY i.id ASC",
    )
    .bind(org_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, uuid, app_id, organization_id, app_slug, webhook_url)| InstallationRow {
            id,
            uuid,
            app_id,
            organization_id,
            app_slug,
            webhook_url,
        })
        .collect())
}

#[cfg(test)]
#[path = "installation_test.rs"]
mod tests;
