//! Database operations for the loyalty `PostgreSQL` schema.
//!
//! ## Tables
//!
//! - `users`, `customers`, `user_activity_log` - Accounts and membership
//! - `products`, `product_images` - Catalog
//! - `store_locations`, `store_services` - Store locator and bookable services
//! - `appointments`, `work_orders` - Member bookings
//! - `orders`, `order_items` - Purchase history
//! - `promotions`, `customer_promotions`, `customer_vouchers` - Rewards
//! - `system_settings` - Flat key-value configuration
//!
//! Queries are built at runtime with `sqlx::query_as` and `QueryBuilder`, so
//! the crate compiles without a live database.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p loyalty-cli -- migrate
//! ```

pub mod activity;
pub mod appointments;
pub mod history;
pub mod orders;
pub mod products;
pub mod promotions;
pub mod settings;
pub mod stats;
pub mod stores;
pub mod users;
pub mod vouchers;
pub mod work_orders;

use std::time::Duration;

use secrecy::ExposeSecret;
use serde::Deserialize;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use activity::ActivityLog;
pub use appointments::AppointmentRepository;
pub use history::HistoryRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use promotions::PromotionRepository;
pub use settings::SettingsRepository;
pub use stats::StatsRepository;
pub use stores::StoreRepository;
pub use users::UserRepository;
pub use vouchers::VoucherRepository;
pub use work_orders::WorkOrderRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique-constraint violation to `Conflict`, anything else to `Database`.
    pub(crate) fn from_unique(err: sqlx::Error, message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(message.to_owned());
        }
        Self::Database(err)
    }
}

/// Page/limit query parameters shared by list endpoints.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

impl Pagination {
    pub const DEFAULT_LIMIT: u32 = 12;
    pub const MAX_LIMIT: u32 = 100;

    /// Pagination with out-of-range values pulled back into bounds.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            page: self.page.max(1),
            limit: self.limit.clamp(1, Self::MAX_LIMIT),
        }
    }

    #[must_use]
    pub fn limit(self) -> i64 {
        i64::from(self.clamped().limit)
    }

    #[must_use]
    pub fn offset(self) -> i64 {
        let page = self.clamped();
        i64::from(page.page - 1) * i64::from(page.limit)
    }

    /// Number of pages needed for `total` rows.
    #[must_use]
    pub fn total_pages(self, total: i64) -> i64 {
        if total <= 0 {
            return 0;
        }
        let limit = self.limit();
        (total + limit - 1) / limit
    }

    /// Whether rows remain after this page given the total row count.
    #[must_use]
    pub fn has_more(self, total: i64) -> bool {
        self.offset() + self.limit() < total
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults() {
        let page = Pagination::default();
        assert_eq!(page.limit(), 12);
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn test_pagination_clamps_out_of_range() {
        let page = Pagination { page: 0, limit: 10_000 };
        assert_eq!(page.limit(), 100);
        assert_eq!(page.offset(), 0);

        let page = Pagination { page: 3, limit: 0 };
        assert_eq!(page.limit(), 1);
        assert_eq!(page.offset(), 2);
    }

    #[test]
    fn test_pagination_has_more() {
        let page = Pagination { page: 2, limit: 12 };
        assert!(page.has_more(25));
        assert!(!page.has_more(24));
    }

    #[test]
    fn test_pagination_total_pages() {
        let page = Pagination { page: 1, limit: 20 };
        assert_eq!(page.total_pages(0), 0);
        assert_eq!(page.total_pages(20), 1);
        assert_eq!(page.total_pages(21), 2);
    }
}
