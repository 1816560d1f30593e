//! Promotion and enrollment queries.

use sqlx::PgPool;

use loyalty_core::{CustomerId, PromotionId};

use super::RepositoryError;
use crate::models::reward::Promotion;

// `$1` is the viewing customer; NULL matches no enrollment row.
const PROMOTION_SELECT: &str = r"
    SELECT p.id, p.name, p.display_name, p.description, p.is_active,
           p.is_automatic, p.is_enrollment_required, p.start_date, p.end_date,
           p.image_url, p.usage_type, p.total_reward_points, p.point_factor,
           p.promotion_code, p.terms,
           (cp.id IS NOT NULL) AS is_enrolled,
           cp.status AS enrollment_status,
           cp.cumulative_usage
    FROM promotions p
    LEFT JOIN customer_promotions cp
        ON cp.promotion_id = p.id AND cp.customer_id = $1";

const RUNNING: &str =
    "p.is_active AND p.start_date <= NOW() AND (p.end_date IS NULL OR p.end_date >= NOW())";

/// Repository for promotions.
pub struct PromotionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PromotionRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Running promotions, soonest ending first, annotated for `viewer`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_running(
        &self,
        viewer: Option<CustomerId>,
    ) -> Result<Vec<Promotion>, RepositoryError> {
        let sql = format!(
            "{PROMOTION_SELECT} WHERE {RUNNING} ORDER BY p.end_date ASC NULLS LAST, p.id"
        );
        let rows = sqlx::query_as::<_, Promotion>(&sql)
            .bind(viewer)
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    /// Get a promotion by ID regardless of its window.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        id: PromotionId,
        viewer: Option<CustomerId>,
    ) -> Result<Option<Promotion>, RepositoryError> {
        let sql = format!("{PROMOTION_SELECT} WHERE p.id = $2");
        let row = sqlx::query_as::<_, Promotion>(&sql)
            .bind(viewer)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row)
    }

    /// Enroll a customer in a promotion.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the customer is already enrolled.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn enroll(
        &self,
        customer_id: CustomerId,
        promotion_id: PromotionId,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO customer_promotions (customer_id, promotion_id, status)
            VALUES ($1, $2, 'Enrolled')
            ",
        )
        .bind(customer_id)
        .bind(promotion_id)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "Already enrolled in this promotion"))?;
        Ok(())
    }
}
