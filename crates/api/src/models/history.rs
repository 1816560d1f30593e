//! Account activity, transaction and points history.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

use loyalty_core::{CustomerTier, MemberStatus, OrderId, OrderStatus};

/// Currency value of one redeemed point.
pub const POINT_VALUE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// One row of `user_activity_log`.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub id: i64,
    pub activity_type: String,
    pub description: Option<String>,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An order seen as a payment: amount, points and tender.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: OrderId,
    pub order_number: String,
    pub total: Decimal,
    pub points_earned: i32,
    pub points_redeemed: i32,
    pub payment_method: Option<String>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// Filters for the transaction list. Dates are inclusive.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub search: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub min_amount: Option<Decimal>,
    pub max_amount: Option<Decimal>,
    pub payment_method: Option<String>,
}

/// A points movement, one per order that earned or spent points.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointsEntry {
    pub id: OrderId,
    pub order_number: String,
    pub total: Decimal,
    pub points_earned: i32,
    pub points_redeemed: i32,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub description: &'static str,
}

impl From<Transaction> for PointsEntry {
    fn from(tx: Transaction) -> Self {
        Self {
            id: tx.id,
            order_number: tx.order_number,
            total: tx.total,
            points_earned: tx.points_earned,
            points_redeemed: tx.points_redeemed,
            created_at: tx.created_at,
            kind: "transaction",
            description: "Purchase",
        }
    }
}

/// Lifetime sums over a customer's completed spend.
#[derive(Debug, Clone, Copy, Default, sqlx::FromRow)]
pub struct TransactionTotals {
    pub total_spent: Decimal,
    pub total_transactions: i64,
    pub average_order_value: Decimal,
    pub total_points_earned: i64,
    pub total_points_redeemed: i64,
}

impl TransactionTotals {
    /// Estimated money saved through redeemed points.
    #[must_use]
    pub fn savings_from_loyalty(&self) -> Decimal {
        Decimal::from(self.total_points_redeemed) * POINT_VALUE
    }
}

/// Spend in the current and previous calendar year.
#[derive(Debug, Clone, Copy, Default, sqlx::FromRow)]
pub struct YearSpending {
    pub current: Decimal,
    pub previous: Decimal,
}

impl YearSpending {
    /// Percentage change over last year, rounded to 2 places; 0 without a
    /// previous year to compare against.
    #[must_use]
    pub fn change(self) -> f64 {
        if self.previous <= Decimal::ZERO {
            return 0.0;
        }
        let change = (self.current - self.previous) / self.previous * Decimal::ONE_HUNDRED;
        change.round_dp(2).to_f64().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MonthlySpend {
    /// `YYYY-MM`
    pub month: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CategorySpend {
    pub category: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductQuantity {
    pub name: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionAnalytics {
    pub total_spent: Decimal,
    pub total_transactions: i64,
    pub average_order_value: Decimal,
    pub total_points_earned: i64,
    pub total_points_redeemed: i64,
    pub savings_from_loyalty: Decimal,
    pub spending_by_month: Vec<MonthlySpend>,
    pub spending_by_category: Vec<CategorySpend>,
    pub top_products: Vec<ProductQuantity>,
    pub year_over_year_change: f64,
    pub current_year_spending: Decimal,
    pub previous_year_spending: Decimal,
}

impl TransactionAnalytics {
    #[must_use]
    pub fn new(
        totals: TransactionTotals,
        years: YearSpending,
        spending_by_month: Vec<MonthlySpend>,
        spending_by_category: Vec<CategorySpend>,
        top_products: Vec<ProductQuantity>,
    ) -> Self {
        Self {
            total_spent: totals.total_spent,
            total_transactions: totals.total_transactions,
            average_order_value: totals.average_order_value.round_dp(2),
            total_points_earned: totals.total_points_earned,
            total_points_redeemed: totals.total_points_redeemed,
            savings_from_loyalty: totals.savings_from_loyalty(),
            spending_by_month,
            spending_by_category,
            top_products,
            year_over_year_change: years.change(),
            current_year_spending: years.current,
            previous_year_spending: years.previous,
        }
    }
}

/// Page position echoed back with paged history.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointsSummary {
    pub current_balance: i32,
    pub total_earned: i64,
    pub total_redeemed: i64,
    pub total_transactions: i64,
    pub tier: CustomerTier,
    pub member_status: MemberStatus,
    pub enrollment_date: NaiveDate,
    pub history: Vec<PointsEntry>,
    pub pagination: PageInfo,
}

#[cfg(test)]
#[allow(clippy::float_cmp, clippy::unwrap_used)]
mod tests {
    use super::*;

    fn years(current: i64, previous: i64) -> YearSpending {
        YearSpending {
            current: Decimal::from(current),
            previous: Decimal::from(previous),
        }
    }

    #[test]
    fn test_year_over_year_change() {
        assert_eq!(years(150, 100).change(), 50.0);
        assert_eq!(years(200, 300).change(), -33.33);
        assert_eq!(years(500, 0).change(), 0.0);
        assert_eq!(years(0, 0).change(), 0.0);
    }

    #[test]
    fn test_savings_is_one_cent_per_point() {
        let totals = TransactionTotals {
            total_points_redeemed: 1_250,
            ..TransactionTotals::default()
        };
        assert_eq!(totals.savings_from_loyalty(), Decimal::new(1_250, 2));
    }

    #[test]
    fn test_analytics_rounds_average() {
        let totals = TransactionTotals {
            total_spent: Decimal::from(100),
            total_transactions: 3,
            average_order_value: Decimal::from(100) / Decimal::from(3),
            ..TransactionTotals::default()
        };
        let analytics = TransactionAnalytics::new(totals, years(100, 0), vec![], vec![], vec![]);
        assert_eq!(analytics.average_order_value, Decimal::new(3_333, 2));

        let json = serde_json::to_value(&analytics).unwrap();
        assert!(json.get("savingsFromLoyalty").is_some());
        assert_eq!(json["yearOverYearChange"], 0.0);
    }

    #[test]
    fn test_points_entry_shape() {
        let entry = PointsEntry::from(Transaction {
            id: OrderId::new(4),
            order_number: "ORD-0004".to_string(),
            total: Decimal::new(2_599, 2),
            points_earned: 26,
            points_redeemed: 0,
            payment_method: Some("card".to_string()),
            status: OrderStatus::Completed,
            created_at: Utc::now(),
        });
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "transaction");
        assert_eq!(json["description"], "Purchase");
        assert_eq!(json["pointsEarned"], 26);
        assert!(json.get("paymentMethod").is_none());
    }
}
