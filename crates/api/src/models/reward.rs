//! Promotion and voucher types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use loyalty_core::{
    CustomerId, EnrollmentStatus, PromotionId, UsageType, VoucherId, VoucherStatus, VoucherType,
};

/// A promotion with the caller's enrollment state.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Promotion {
    pub id: PromotionId,
    pub name: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub is_active: bool,
    pub is_automatic: bool,
    pub is_enrollment_required: bool,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub image_url: Option<String>,
    pub usage_type: UsageType,
    pub total_reward_points: i32,
    pub point_factor: Decimal,
    pub promotion_code: Option<String>,
    pub terms: Option<String>,
    pub is_enrolled: bool,
    pub enrollment_status: Option<EnrollmentStatus>,
    pub cumulative_usage: Option<i32>,
}

impl Promotion {
    /// Whether the promotion is active and inside its date window at `now`.
    #[must_use]
    pub fn is_running(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.start_date <= now && self.end_date.is_none_or(|end| end >= now)
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Voucher {
    pub id: VoucherId,
    pub customer_id: CustomerId,
    pub voucher_code: String,
    pub name: String,
    pub description: Option<String>,
    pub voucher_type: VoucherType,
    pub face_value: Option<Decimal>,
    pub discount_percent: Option<Decimal>,
    pub remaining_value: Option<Decimal>,
    pub status: VoucherStatus,
    pub is_active: bool,
    pub effective_date: DateTime<Utc>,
    pub expiration_date: Option<DateTime<Utc>>,
    pub redeemed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Voucher {
    /// Why the voucher cannot be redeemed at `now`, or `None` if it can.
    ///
    /// Mirrors the `active` SQL predicate in the voucher repository.
    #[must_use]
    pub fn rejection_reason(&self, now: DateTime<Utc>) -> Option<&'static str> {
        if self.status != VoucherStatus::Issued {
            return Some(match self.status {
                VoucherStatus::Redeemed => "Voucher has already been redeemed",
                VoucherStatus::Expired => "Voucher has expired",
                _ => "Voucher is no longer valid",
            });
        }
        if !self.is_active {
            return Some("Voucher is not active");
        }
        if self.expiration_date.is_some_and(|expires| expires <= now) {
            return Some("Voucher has expired");
        }
        if self.voucher_type == VoucherType::Value
            && self.remaining_value.is_none_or(|value| value <= Decimal::ZERO)
        {
            return Some("Voucher has no remaining value");
        }
        None
    }

    #[must_use]
    pub fn is_redeemable(&self, now: DateTime<Utc>) -> bool {
        self.rejection_reason(now).is_none()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn voucher(voucher_type: VoucherType, remaining: Option<Decimal>) -> Voucher {
        let now = Utc::now();
        Voucher {
            id: VoucherId::new(1),
            customer_id: CustomerId::new(1),
            voucher_code: "WELCOME10".to_string(),
            name: "Welcome".to_string(),
            description: None,
            voucher_type,
            face_value: Some(Decimal::new(10, 0)),
            discount_percent: None,
            remaining_value: remaining,
            status: VoucherStatus::Issued,
            is_active: true,
            effective_date: now - Duration::days(1),
            expiration_date: Some(now + Duration::days(30)),
            redeemed_at: None,
            created_at: now,
        }
    }

    #[test]
    fn test_issued_value_voucher_with_balance_is_redeemable() {
        assert!(voucher(VoucherType::Value, Some(Decimal::new(5, 0))).is_redeemable(Utc::now()));
    }

    #[test]
    fn test_value_voucher_needs_balance() {
        let now = Utc::now();
        assert_eq!(
            voucher(VoucherType::Value, Some(Decimal::ZERO)).rejection_reason(now),
            Some("Voucher has no remaining value")
        );
        assert!(!voucher(VoucherType::Value, None).is_redeemable(now));
        // Other types ignore the balance.
        assert!(voucher(VoucherType::Percentage, None).is_redeemable(now));
    }

    #[test]
    fn test_expired_and_redeemed_vouchers() {
        let now = Utc::now();
        let mut expired = voucher(VoucherType::Product, None);
        expired.expiration_date = Some(now - Duration::minutes(1));
        assert_eq!(expired.rejection_reason(now), Some("Voucher has expired"));

        let mut redeemed = voucher(VoucherType::Product, None);
        redeemed.status = VoucherStatus::Redeemed;
        assert_eq!(
            redeemed.rejection_reason(now),
            Some("Voucher has already been redeemed")
        );

        let mut inactive = voucher(VoucherType::Product, None);
        inactive.is_active = false;
        assert!(!inactive.is_redeemable(now));
    }

    #[test]
    fn test_promotion_window() {
        let now = Utc::now();
        let promotion = Promotion {
            id: PromotionId::new(1),
            name: "double-points".to_string(),
            display_name: None,
            description: None,
            is_active: true,
            is_automatic: false,
            is_enrollment_required: true,
            start_date: now - Duration::days(1),
            end_date: None,
            image_url: None,
            usage_type: UsageType::Once,
            total_reward_points: 100,
            point_factor: Decimal::TWO,
            promotion_code: None,
            terms: None,
            is_enrolled: false,
            enrollment_status: None,
            cumulative_usage: None,
        };
        assert!(promotion.is_running(now));

        let ended = Promotion {
            end_date: Some(now - Duration::hours(1)),
            ..promotion.clone()
        };
        assert!(!ended.is_running(now));

        let future = Promotion {
            start_date: now + Duration::days(1),
            ..promotion
        };
        assert!(!future.is_running(now));
    }
}
