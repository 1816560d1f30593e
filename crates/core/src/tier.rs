//! Membership tiers.
//!
//! Tiers are reached by lifetime spending and multiply the points a member
//! earns per purchase.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::CustomerTier;

/// Spending threshold and earning multiplier for one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierRule {
    pub tier: CustomerTier,
    pub min_spending: Decimal,
    pub point_multiplier: Decimal,
    pub benefits: &'static str,
}

/// Default tier table, lowest first.
pub const TIER_RULES: [TierRule; 4] = [
    TierRule {
        tier: CustomerTier::Bronze,
        min_spending: Decimal::ZERO,
        point_multiplier: Decimal::ONE,
        benefits: "Basic loyalty benefits, 1x points earning",
    },
    TierRule {
        tier: CustomerTier::Silver,
        min_spending: Decimal::from_parts(250, 0, 0, false, 0),
        point_multiplier: Decimal::from_parts(125, 0, 0, false, 2),
        benefits: "Enhanced benefits, 1.25x points earning",
    },
    TierRule {
        tier: CustomerTier::Gold,
        min_spending: Decimal::from_parts(750, 0, 0, false, 0),
        point_multiplier: Decimal::from_parts(15, 0, 0, false, 1),
        benefits: "Premium benefits, 1.5x points earning",
    },
    TierRule {
        tier: CustomerTier::Platinum,
        min_spending: Decimal::from_parts(2000, 0, 0, false, 0),
        point_multiplier: Decimal::TWO,
        benefits: "VIP benefits, 2x points earning",
    },
];

impl TierRule {
    /// Rule for a specific tier.
    #[must_use]
    pub fn for_tier(tier: CustomerTier) -> Self {
        TIER_RULES
            .iter()
            .find(|rule| rule.tier == tier)
            .copied()
            .unwrap_or(TIER_RULES[0])
    }

    /// Highest tier whose threshold `total_spent` meets.
    #[must_use]
    pub fn for_spending(total_spent: Decimal) -> Self {
        TIER_RULES
            .iter()
            .rev()
            .find(|rule| total_spent >= rule.min_spending)
            .copied()
            .unwrap_or(TIER_RULES[0])
    }

    /// Points earned for `amount` spent at this tier, rounded down.
    #[must_use]
    pub fn points_for(&self, amount: Decimal) -> Decimal {
        (amount * self.point_multiplier).floor()
    }
}

/// A member's position relative to the next tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierProgress {
    pub current: CustomerTier,
    pub next: Option<CustomerTier>,
    pub amount_to_next: Option<Decimal>,
    /// Percentage of the way from the current threshold to the next, 0-100.
    pub percent_complete: Decimal,
}

impl TierProgress {
    /// Progress for a member currently at `current` with lifetime `total_spent`.
    ///
    /// The stored tier wins over the spending-derived one so manual upgrades
    /// are respected.
    #[must_use]
    pub fn compute(current: CustomerTier, total_spent: Decimal) -> Self {
        let current_rule = TierRule::for_tier(current);
        let next_rule = TIER_RULES.iter().find(|rule| rule.tier > current).copied();

        let Some(next_rule) = next_rule else {
            return Self {
                current,
                next: None,
                amount_to_next: None,
                percent_complete: Decimal::ONE_HUNDRED,
            };
        };

        let span = next_rule.min_spending - current_rule.min_spending;
        let gained = (total_spent - current_rule.min_spending).max(Decimal::ZERO);
        let percent = if span > Decimal::ZERO {
            (gained / span * Decimal::ONE_HUNDRED)
                .min(Decimal::ONE_HUNDRED)
                .round_dp(2)
        } else {
            Decimal::ONE_HUNDRED
        };

        Self {
            current,
            next: Some(next_rule.tier),
            amount_to_next: Some((next_rule.min_spending - total_spent).max(Decimal::ZERO)),
            percent_complete: percent,
        }
    }
}
