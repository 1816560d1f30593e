//! Loyalty points balance and history.

use axum::{Json, extract::State};
use tracing::instrument;

use crate::db::{HistoryRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::history::{PageInfo, PointsEntry, PointsSummary};
use crate::state::AppState;

use super::{ApiQuery, HistoryQuery};

/// Points balance, lifetime sums and the orders that moved points.
///
/// GET /api/loyalty/points
#[instrument(skip_all, fields(user_id = %current.id))]
pub async fn points(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    ApiQuery(query): ApiQuery<HistoryQuery>,
) -> Result<Json<PointsSummary>> {
    let customer = UserRepository::new(state.pool())
        .get_customer(current.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer not found".to_string()))?;

    let page = query.pagination();
    let repo = HistoryRepository::new(state.pool());
    let ((history, total), totals) = tokio::try_join!(
        repo.points_history(customer.id, page),
        repo.totals(customer.id),
    )?;

    Ok(Json(PointsSummary {
        current_balance: customer.points,
        total_earned: totals.total_points_earned,
        total_redeemed: totals.total_points_redeemed,
        total_transactions: totals.total_transactions,
        tier: customer.tier,
        member_status: customer.member_status,
        enrollment_date: customer.enrollment_date,
        history: history.into_iter().map(PointsEntry::from).collect(),
        pagination: PageInfo {
            page: page.page,
            limit: page.limit,
            total,
            total_pages: page.total_pages(total),
        },
    }))
}
