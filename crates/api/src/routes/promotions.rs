//! Promotion route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use tracing::instrument;

use loyalty_core::{CustomerId, PromotionId};

use crate::db::activity::{ActivityKind, ActivityLog};
use crate::db::{PromotionRepository, UserRepository};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::{ClientIp, OptionalAuth, RequireMember};
use crate::models::reward::Promotion;
use crate::state::AppState;

use super::user_agent;

#[derive(Debug, Serialize)]
pub struct PromotionsResponse {
    pub promotions: Vec<Promotion>,
}

#[derive(Debug, Serialize)]
pub struct EnrollResponse {
    pub success: bool,
    pub message: String,
}

/// Why `promotion` cannot be enrolled in at `now`.
fn enrollment_error(promotion: &Promotion, now: chrono::DateTime<chrono::Utc>) -> Option<AppError> {
    if !promotion.is_running(now) {
        return Some(AppError::NotFound("Promotion not found".to_string()));
    }
    if !promotion.is_enrollment_required {
        return Some(AppError::BadRequest(
            "This promotion does not require enrollment".to_string(),
        ));
    }
    None
}

/// Running promotions, with enrollment state for a signed-in member.
///
/// GET /api/promotions
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(current): OptionalAuth,
) -> Result<Json<PromotionsResponse>> {
    let viewer: Option<CustomerId> = match current {
        Some(user) => UserRepository::new(state.pool())
            .get_customer(user.id)
            .await?
            .map(|customer| customer.id),
        None => None,
    };

    let promotions = PromotionRepository::new(state.pool())
        .list_running(viewer)
        .await?;
    Ok(Json(PromotionsResponse { promotions }))
}

/// Enroll the member in a promotion.
///
/// POST /api/promotions/{id}/enroll
#[instrument(skip_all, fields(customer_id = %member.customer_id, promotion_id = %id))]
pub async fn enroll(
    State(state): State<AppState>,
    member: RequireMember,
    ClientIp(ip): ClientIp,
    headers: axum::http::HeaderMap,
    Path(id): Path<PromotionId>,
) -> Result<Json<EnrollResponse>> {
    let repo = PromotionRepository::new(state.pool());
    let promotion = repo
        .get(id, Some(member.customer_id))
        .await?
        .ok_or_else(|| AppError::NotFound("Promotion not found".to_string()))?;

    if let Some(err) = enrollment_error(&promotion, chrono::Utc::now()) {
        return Err(err);
    }

    repo.enroll(member.customer_id, id).await?;

    ActivityLog::new(state.pool())
        .record(
            member.user.id,
            ActivityKind::PromotionEnroll,
            &format!("Enrolled in promotion {}", promotion.name),
            &ip,
            user_agent(&headers),
        )
        .await;
    add_breadcrumb("promotion", "Enrolled in promotion");

    Ok(Json(EnrollResponse {
        success: true,
        message: "Successfully enrolled in promotion".to_string(),
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;

    use loyalty_core::UsageType;

    use super::*;

    fn promotion(is_active: bool, enrollment_required: bool) -> Promotion {
        Promotion {
            id: PromotionId::new(1),
            name: "double-points".to_string(),
            display_name: Some("Double Points".to_string()),
            description: None,
            is_active,
            is_automatic: false,
            is_enrollment_required: enrollment_required,
            start_date: Utc::now() - Duration::days(1),
            end_date: Some(Utc::now() + Duration::days(7)),
            image_url: None,
            usage_type: UsageType::Unlimited,
            total_reward_points: 0,
            point_factor: Decimal::TWO,
            promotion_code: None,
            terms: None,
            is_enrolled: false,
            enrollment_status: None,
            cumulative_usage: None,
        }
    }

    #[test]
    fn test_inactive_promotion_is_not_found() {
        let err = enrollment_error(&promotion(false, true), Utc::now()).unwrap();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_automatic_promotion_rejects_enrollment() {
        let err = enrollment_error(&promotion(true, false), Utc::now()).unwrap();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_running_promotion_accepts_enrollment() {
        assert!(enrollment_error(&promotion(true, true), Utc::now()).is_none());
    }
}
