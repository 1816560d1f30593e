//! Customer voucher queries.

use sqlx::{PgPool, Postgres, QueryBuilder};

use loyalty_core::{CustomerId, VoucherId};

use super::RepositoryError;
use crate::models::reward::Voucher;

const VOUCHER_SELECT: &str = r"
    SELECT id, customer_id, voucher_code, name, description, voucher_type,
           face_value, discount_percent, remaining_value, status, is_active,
           effective_date, expiration_date, redeemed_at, created_at
    FROM customer_vouchers";

/// SQL form of `Voucher::rejection_reason` returning `None`.
pub(crate) const ACTIVE_PREDICATE: &str = r"
    status = 'Issued'
    AND is_active
    AND (expiration_date IS NULL OR expiration_date > NOW())
    AND (voucher_type <> 'Value' OR COALESCE(remaining_value, 0) > 0)";

/// Repository for customer vouchers.
pub struct VoucherRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> VoucherRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A customer's vouchers, expiring soonest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_customer(
        &self,
        customer_id: CustomerId,
        active_only: bool,
    ) -> Result<Vec<Voucher>, RepositoryError> {
        let mut query = QueryBuilder::<Postgres>::new(VOUCHER_SELECT);
        query.push(" WHERE customer_id = ").push_bind(customer_id);
        if active_only {
            query.push(" AND ").push(ACTIVE_PREDICATE);
        }
        query.push(" ORDER BY expiration_date ASC NULLS LAST, id DESC");

        let rows = query.build_query_as::<Voucher>().fetch_all(self.pool).await?;
        Ok(rows)
    }

    /// Get a voucher by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: VoucherId) -> Result<Option<Voucher>, RepositoryError> {
        let sql = format!("{VOUCHER_SELECT} WHERE id = $1");
        let row = sqlx::query_as::<_, Voucher>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row)
    }

    /// Look up a voucher by code, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_code(&self, code: &str) -> Result<Option<Voucher>, RepositoryError> {
        let sql = format!("{VOUCHER_SELECT} WHERE UPPER(voucher_code) = UPPER($1)");
        let row = sqlx::query_as::<_, Voucher>(&sql)
            .bind(code.trim())
            .fetch_optional(self.pool)
            .await?;
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_filter_is_appended() {
        let mut query = QueryBuilder::<Postgres>::new(VOUCHER_SELECT);
        query.push(" WHERE customer_id = ").push_bind(CustomerId::new(7));
        query.push(" AND ").push(ACTIVE_PREDICATE);
        let sql = query.sql();
        assert!(sql.contains("customer_id = $1"));
        assert!(sql.contains("status = 'Issued'"));
        assert!(sql.contains("voucher_type <> 'Value'"));
    }
}
