mod db;
mod routes;
mod services;
mod state;

use std::sync::Arc;
use std::time::Duration;

use services::prepare::SchemaPreparer;

const DEFAULT_PREPARER_TIMEOUT_SECS: u64 = 10;

fn preparer_timeout() -> Duration {
    let secs = std::env::var("PREPARER_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(DEFAULT_PREPARER_TIMEOUT_SECS);
    Duration::from_secs(secs)
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()
        .expect("invalid PORT");
    let max_connections = std::env::var("DB_MAX_CONNECTIONS")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(db::DEFAULT_MAX_CONNECTIONS);

    let pool = db::init_pool(&database_url, max_connections)
        .await
        .expect("database init failed");

    let preparer = SchemaPreparer::new(preparer_timeout()).expect("preparer init failed");

    // Linking is non-fatal: the surface answers 503 if config is missing.
    let linking = state::LinkingConfig::from_env();
    if linking.is_none() {
        tracing::warn!("LINKING_SECRET/EXTERNAL_BASE_URL not set — identity linking disabled");
    }

    let state = state::AppState::new(pool, Arc::new(preparer), linking);

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "apphub listening");
    axum::serve(listener, app).await.expect("server failed");
}
