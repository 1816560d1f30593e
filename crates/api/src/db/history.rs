//! Transaction and points history over the `orders` table.

use sqlx::{PgPool, Postgres, QueryBuilder};

use loyalty_core::CustomerId;

use super::{Pagination, RepositoryError};
use crate::models::history::{
    CategorySpend, MonthlySpend, ProductQuantity, Transaction, TransactionFilter,
    TransactionTotals, YearSpending,
};

const TRANSACTION_SELECT: &str = r"
    SELECT o.id, o.order_number, o.total_amount AS total, o.points_earned,
           o.points_redeemed, o.payment_method, o.status, o.order_date AS created_at
    FROM orders o";

/// Orders that count as spend.
const SETTLED: &str = "o.status NOT IN ('cancelled', 'refunded')";

/// Rows kept in each analytics breakdown.
const BREAKDOWN_LIMIT: i64 = 10;

/// Read-only history queries for one customer.
pub struct HistoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> HistoryRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of the customer's transactions, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn transactions(
        &self,
        customer_id: CustomerId,
        filter: &TransactionFilter,
        page: Pagination,
    ) -> Result<(Vec<Transaction>, i64), RepositoryError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM orders o");
        push_filter(&mut count, customer_id, filter);
        let total = count.build_query_scalar::<i64>().fetch_one(self.pool).await?;

        let mut query = QueryBuilder::<Postgres>::new(TRANSACTION_SELECT);
        push_filter(&mut query, customer_id, filter);
        push_page(&mut query, page);
        let rows = query
            .build_query_as::<Transaction>()
            .fetch_all(self.pool)
            .await?;
        Ok((rows, total))
    }

    /// One page of orders that earned or spent points, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn points_history(
        &self,
        customer_id: CustomerId,
        page: Pagination,
    ) -> Result<(Vec<Transaction>, i64), RepositoryError> {
        const MOVED: &str = " AND (o.points_earned > 0 OR o.points_redeemed > 0)";

        let mut count =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM orders o WHERE o.customer_id = ");
        count.push_bind(customer_id).push(MOVED);
        let total = count.build_query_scalar::<i64>().fetch_one(self.pool).await?;

        let mut query = QueryBuilder::<Postgres>::new(TRANSACTION_SELECT);
        query.push(" WHERE o.customer_id = ").push_bind(customer_id).push(MOVED);
        push_page(&mut query, page);
        let rows = query
            .build_query_as::<Transaction>()
            .fetch_all(self.pool)
            .await?;
        Ok((rows, total))
    }

    /// Lifetime spend and points sums.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn totals(&self, customer_id: CustomerId) -> Result<TransactionTotals, RepositoryError> {
        let sql = format!(
            r"
            SELECT
                COALESCE(SUM(o.total_amount), 0) AS total_spent,
                COUNT(*) AS total_transactions,
                COALESCE(AVG(o.total_amount), 0) AS average_order_value,
                COALESCE(SUM(o.points_earned), 0)::BIGINT AS total_points_earned,
                COALESCE(SUM(o.points_redeemed), 0)::BIGINT AS total_points_redeemed
            FROM orders o
            WHERE o.customer_id = $1 AND {SETTLED}
            "
        );
        let totals = sqlx::query_as::<_, TransactionTotals>(&sql)
            .bind(customer_id)
            .fetch_one(self.pool)
            .await?;
        Ok(totals)
    }

    /// Spend per calendar month over the last 12 months, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn monthly_spending(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<MonthlySpend>, RepositoryError> {
        let sql = format!(
            r"
            SELECT TO_CHAR(o.order_date, 'YYYY-MM') AS month,
                   COALESCE(SUM(o.total_amount), 0) AS amount
            FROM orders o
            WHERE o.customer_id = $1 AND {SETTLED}
              AND o.order_date >= NOW() - INTERVAL '12 months'
            GROUP BY month
            ORDER BY month DESC
            "
        );
        let rows = sqlx::query_as::<_, MonthlySpend>(&sql)
            .bind(customer_id)
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    /// Spend per product category; lines without a catalog product fall
    /// under "Other".
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn category_spending(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<CategorySpend>, RepositoryError> {
        let sql = format!(
            r"
            SELECT COALESCE(p.category, 'Other') AS category,
                   COALESCE(SUM(oi.total_price), 0) AS amount
            FROM order_items oi
            JOIN orders o ON o.id = oi.order_id
            LEFT JOIN products p ON p.id = oi.product_id
            WHERE o.customer_id = $1 AND {SETTLED}
            GROUP BY 1
            ORDER BY amount DESC
            LIMIT $2
            "
        );
        let rows = sqlx::query_as::<_, CategorySpend>(&sql)
            .bind(customer_id)
            .bind(BREAKDOWN_LIMIT)
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    /// Most purchased products by quantity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn top_products(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<ProductQuantity>, RepositoryError> {
        let sql = format!(
            r"
            SELECT oi.product_name AS name, SUM(oi.quantity)::BIGINT AS quantity
            FROM order_items oi
            JOIN orders o ON o.id = oi.order_id
            WHERE o.customer_id = $1 AND {SETTLED}
            GROUP BY oi.product_name
            ORDER BY quantity DESC, name
            LIMIT $2
            "
        );
        let rows = sqlx::query_as::<_, ProductQuantity>(&sql)
            .bind(customer_id)
            .bind(BREAKDOWN_LIMIT)
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    /// Spend in the current and previous calendar year.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn year_spending(&self, customer_id: CustomerId) -> Result<YearSpending, RepositoryError> {
        let sql = format!(
            r"
            SELECT
                COALESCE(SUM(o.total_amount) FILTER (
                    WHERE EXTRACT(YEAR FROM o.order_date) = EXTRACT(YEAR FROM NOW())
                ), 0) AS current,
                COALESCE(SUM(o.total_amount) FILTER (
                    WHERE EXTRACT(YEAR FROM o.order_date) = EXTRACT(YEAR FROM NOW()) - 1
                ), 0) AS previous
            FROM orders o
            WHERE o.customer_id = $1 AND {SETTLED}
            "
        );
        let years = sqlx::query_as::<_, YearSpending>(&sql)
            .bind(customer_id)
            .fetch_one(self.pool)
            .await?;
        Ok(years)
    }
}

fn push_filter(query: &mut QueryBuilder<'_, Postgres>, customer_id: CustomerId, filter: &TransactionFilter) {
    query.push(" WHERE o.customer_id = ").push_bind(customer_id);

    if let Some(search) = &filter.search {
        let pattern = format!("%{search}%");
        query
            .push(" AND (o.order_number ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR o.payment_method ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(from) = filter.date_from {
        query.push(" AND o.order_date::date >= ").push_bind(from);
    }
    if let Some(to) = filter.date_to {
        query.push(" AND o.order_date::date <= ").push_bind(to);
    }
    if let Some(min) = filter.min_amount {
        query.push(" AND o.total_amount >= ").push_bind(min);
    }
    if let Some(max) = filter.max_amount {
        query.push(" AND o.total_amount <= ").push_bind(max);
    }
    if let Some(method) = &filter.payment_method {
        query.push(" AND o.payment_method = ").push_bind(method.clone());
    }
}

fn push_page(query: &mut QueryBuilder<'_, Postgres>, page: Pagination) {
    query
        .push(" ORDER BY o.order_date DESC, o.id DESC LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_filter_sql_binds_in_order() {
        let filter = TransactionFilter {
            search: Some("ORD".to_string()),
            date_from: NaiveDate::from_ymd_opt(2025, 1, 1),
            max_amount: Some(Decimal::from(50)),
            ..TransactionFilter::default()
        };
        let mut query = QueryBuilder::<Postgres>::new(TRANSACTION_SELECT);
        push_filter(&mut query, CustomerId::new(9), &filter);
        push_page(&mut query, Pagination::default());

        let sql = query.sql();
        assert!(sql.contains("WHERE o.customer_id = $1"));
        assert!(sql.contains("(o.order_number ILIKE $2 OR o.payment_method ILIKE $3)"));
        assert!(sql.contains("o.order_date::date >= $4"));
        assert!(sql.contains("o.total_amount <= $5"));
        assert!(sql.ends_with("LIMIT $6 OFFSET $7"));
        assert!(!sql.contains("payment_method = "));
    }

    #[test]
    fn test_unfiltered_sql_scopes_to_customer() {
        let mut query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM orders o");
        push_filter(&mut query, CustomerId::new(1), &TransactionFilter::default());
        assert_eq!(query.sql(), "SELECT COUNT(*) FROM orders o WHERE o.customer_id = $1");
    }
}
