use std::time::Duration;

use axum::{extract::Extension, http::StatusCode, Json};
use serde::Serialize;
use sqlx::PgPool;

use crate::server::app::AppState;

const DB_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Health {
    Healthy,
    Unhealthy,
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: Health,
    database: DatabaseProbe,
    pool: PoolStats,
}

#[derive(Serialize)]
pub struct DatabaseProbe {
    reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'static str>,
}

#[derive(Serialize)]
pub struct PoolStats {
    open: u32,
    idle: usize,
    max: u32,
}

async fn probe_database(pool: &PgPool) -> DatabaseProbe {
    let error = match tokio::time::timeout(DB_PROBE_TIMEOUT, sqlx::query("SELECT 1").execute(pool)).await {
        Ok(Ok(_)) => None,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Database probe failed");
            Some("query failed")
        }
        Err(_) => Some("query timed out"),
    };

    DatabaseProbe {
        reachable: error.is_none(),
        error,
    }
}

/// 200 while the database answers, 503 otherwise.
pub async fn health_handler(
    Extension(state): Extension<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let database = probe_database(&state.db_pool).await;
    let pool = PoolStats {
        open: state.db_pool.size(),
        idle: state.db_pool.num_idle(),
        max: state.db_pool.options().get_max_connections(),
    };

    let (code, status) = if database.reachable {
        (StatusCode::OK, Health::Healthy)
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Health::Unhealthy)
    };

    (
        code,
        Json(HealthResponse {
            status,
            database,
            pool,
        }),
    )
}
