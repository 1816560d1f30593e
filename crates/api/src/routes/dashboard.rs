//! Member dashboard.

use axum::{Json, extract::State};
use tracing::instrument;

use crate::db::{StatsRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::dashboard::DashboardStats;
use crate::state::AppState;

/// Spend summary, favourites and trend for the signed-in member.
///
/// GET /api/dashboard/stats
///
/// Also asks the loyalty platform to refresh the member in the background.
#[instrument(skip_all, fields(user_id = %current.id))]
pub async fn stats(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<DashboardStats>> {
    let customer = UserRepository::new(state.pool())
        .get_customer(current.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer not found".to_string()))?;

    let stats_repo = StatsRepository::new(state.pool());
    let windows = stats_repo.spending_windows(customer.id).await?;
    let favorite_products = stats_repo.favorite_products(customer.id).await?;

    if let Some(endpoint) = state.sync_endpoint().await {
        state
            .sync()
            .spawn_member_pull(endpoint, current.email.to_string());
    }

    let member_since = customer
        .enrollment_date
        .and_hms_opt(0, 0, 0)
        .map_or_else(chrono::Utc::now, |dt| dt.and_utc());

    Ok(Json(DashboardStats {
        total_spent: customer.total_spent,
        visit_count: customer.visit_count,
        member_since,
        favorite_products,
        spending_trend: windows.trend(),
        tier: customer.tier,
        points: customer.points,
    }))
}
