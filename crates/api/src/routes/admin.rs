//! Admin overview.

use axum::{Json, extract::State};
use secrecy::ExposeSecret;
use serde::Serialize;
use tracing::instrument;
use url::Url;

use crate::db::StatsRepository;
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::models::dashboard::TableCounts;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub database: PoolStats,
    pub counts: TableCounts,
    pub system_settings: usize,
    pub environment: EnvironmentInfo,
    pub server: ServerInfo,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolStats {
    pub pool_size: u32,
    pub idle_connections: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentInfo {
    pub database_url: String,
    pub base_url: String,
    pub sentry: SentryInfo,
}

#[derive(Debug, Serialize)]
pub struct SentryInfo {
    pub configured: bool,
    pub environment: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
    pub uptime_seconds: u64,
    pub version: &'static str,
}

/// Database URL with the password masked.
fn redact_database_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut url) => {
            if url.password().is_some() {
                // set_password only fails for cannot-be-a-base URLs
                let _ = url.set_password(Some("****"));
            }
            url.to_string()
        }
        Err(_) => "<unparseable>".to_string(),
    }
}

/// Pool, table and settings counts plus runtime details.
///
/// GET /api/admin/stats
#[instrument(skip_all, fields(admin = %admin.0.id))]
pub async fn stats(State(state): State<AppState>, admin: RequireAdmin) -> Result<Json<AdminStats>> {
    let counts = StatsRepository::new(state.pool()).table_counts().await?;
    let settings = state.settings().get_all().await?;
    let config = state.config();

    Ok(Json(AdminStats {
        database: PoolStats {
            pool_size: state.pool().size(),
            idle_connections: state.pool().num_idle(),
        },
        counts,
        system_settings: settings.len(),
        environment: EnvironmentInfo {
            database_url: redact_database_url(config.database_url.expose_secret()),
            base_url: config.base_url.clone(),
            sentry: SentryInfo {
                configured: config.sentry.dsn.is_some(),
                environment: config.sentry.environment.clone(),
            },
        },
        server: ServerInfo {
            uptime_seconds: state.uptime().as_secs(),
            version: env!("CARGO_PKG_VERSION"),
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redacts_password() {
        assert_eq!(
            redact_database_url("postgres://loyalty:hunter2@db:5432/loyalty"),
            "postgres://loyalty:****@db:5432/loyalty"
        );
    }

    #[test]
    fn test_leaves_passwordless_url() {
        assert_eq!(
            redact_database_url("postgres://db/loyalty"),
            "postgres://db/loyalty"
        );
        assert_eq!(redact_database_url("not a url"), "<unparseable>");
    }
}
