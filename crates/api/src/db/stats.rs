//! Aggregate queries for the member dashboard and admin overview.

use sqlx::PgPool;

use loyalty_core::CustomerId;

use super::RepositoryError;
use crate::models::dashboard::{SpendingWindows, TableCounts};

/// Favourite products shown on the dashboard.
const FAVORITE_LIMIT: i64 = 5;

/// Read-only aggregate queries.
pub struct StatsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StatsRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Spend over the last 30 days and the 30 days before, ignoring
    /// cancelled and refunded orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn spending_windows(
        &self,
        customer_id: CustomerId,
    ) -> Result<SpendingWindows, RepositoryError> {
        let windows = sqlx::query_as::<_, SpendingWindows>(
            r"
            SELECT
                COALESCE(SUM(total_amount) FILTER (
                    WHERE order_date >= NOW() - INTERVAL '30 days'
                ), 0) AS current,
                COALESCE(SUM(total_amount) FILTER (
                    WHERE order_date >= NOW() - INTERVAL '60 days'
                      AND order_date < NOW() - INTERVAL '30 days'
                ), 0) AS previous
            FROM orders
            WHERE customer_id = $1 AND status NOT IN ('cancelled', 'refunded')
            ",
        )
        .bind(customer_id)
        .fetch_one(self.pool)
        .await?;
        Ok(windows)
    }

    /// Names of the customer's most purchased products by quantity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn favorite_products(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<String>, RepositoryError> {
        let names = sqlx::query_scalar::<_, String>(
            r"
            SELECT oi.product_name
            FROM order_items oi
            JOIN orders o ON o.id = oi.order_id
            WHERE o.customer_id = $1 AND o.status NOT IN ('cancelled', 'refunded')
            GROUP BY oi.product_name
            ORDER BY SUM(oi.quantity) DESC, oi.product_name
            LIMIT $2
            ",
        )
        .bind(customer_id)
        .bind(FAVORITE_LIMIT)
        .fetch_all(self.pool)
        .await?;
        Ok(names)
    }

    /// Row counts of the main tables.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn table_counts(&self) -> Result<TableCounts, RepositoryError> {
        let counts = sqlx::query_as::<_, TableCounts>(
            r"
            SELECT
                (SELECT COUNT(*) FROM users) AS users,
                (SELECT COUNT(*) FROM customers) AS customers,
                (SELECT COUNT(*) FROM orders) AS orders,
                (SELECT COUNT(*) FROM products WHERE is_active) AS products,
                (SELECT COUNT(*) FROM store_locations WHERE is_active) AS stores
            ",
        )
        .fetch_one(self.pool)
        .await?;
        Ok(counts)
    }
}
