//! Member dashboard and admin statistics.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

use loyalty_core::CustomerTier;

/// Spend in the last 30 days and the 30 days before that.
#[derive(Debug, Clone, Copy, Default, sqlx::FromRow)]
pub struct SpendingWindows {
    pub current: Decimal,
    pub previous: Decimal,
}

impl SpendingWindows {
    /// Percentage change from the previous window, rounded to 2 places.
    ///
    /// An empty previous window reports 100 when anything was spent since
    /// and 0 otherwise.
    #[must_use]
    pub fn trend(self) -> f64 {
        if self.previous <= Decimal::ZERO {
            return if self.current > Decimal::ZERO { 100.0 } else { 0.0 };
        }
        let change = (self.current - self.previous) / self.previous * Decimal::ONE_HUNDRED;
        change.round_dp(2).to_f64().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_spent: Decimal,
    pub visit_count: i32,
    pub member_since: DateTime<Utc>,
    pub favorite_products: Vec<String>,
    pub spending_trend: f64,
    pub tier: CustomerTier,
    pub points: i32,
}

/// Row counts for the admin overview.
#[derive(Debug, Clone, Copy, Serialize, sqlx::FromRow)]
pub struct TableCounts {
    pub users: i64,
    pub customers: i64,
    pub orders: i64,
    pub products: i64,
    pub stores: i64,
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    fn windows(current: i64, previous: i64) -> SpendingWindows {
        SpendingWindows {
            current: Decimal::new(current, 2),
            previous: Decimal::new(previous, 2),
        }
    }

    #[test]
    fn test_trend_growth_and_decline() {
        assert_eq!(windows(15_000, 10_000).trend(), 50.0);
        assert_eq!(windows(5_000, 10_000).trend(), -50.0);
    }

    #[test]
    fn test_trend_rounds_to_two_places() {
        // 100 -> 133.33...: +33.333%
        assert_eq!(windows(13_333, 10_000).trend(), 33.33);
        assert_eq!(windows(20_000, 30_000).trend(), -33.33);
    }

    #[test]
    fn test_trend_with_empty_previous_window() {
        assert_eq!(windows(0, 0).trend(), 0.0);
        assert_eq!(windows(2_500, 0).trend(), 100.0);
    }
}
