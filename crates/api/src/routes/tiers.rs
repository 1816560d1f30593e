//! Membership tier table.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use loyalty_core::{TierProgress, TierRule, tier::TIER_RULES};

use crate::db::UserRepository;
use crate::error::Result;
use crate::middleware::OptionalAuth;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct TiersResponse {
    pub tiers: &'static [TierRule],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<TierProgress>,
}

/// Tier thresholds, plus the caller's progress when signed in.
///
/// GET /api/tiers
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(current): OptionalAuth,
) -> Result<Json<TiersResponse>> {
    let progress = match current {
        Some(user) => UserRepository::new(state.pool())
            .get_customer(user.id)
            .await?
            .map(|customer| TierProgress::compute(customer.tier, customer.total_spent)),
        None => None,
    };

    Ok(Json(TiersResponse {
        tiers: &TIER_RULES,
        progress,
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_response_lists_four_tiers() {
        let json = serde_json::to_value(TiersResponse {
            tiers: &TIER_RULES,
            progress: None,
        })
        .unwrap();
        assert_eq!(json["tiers"].as_array().unwrap().len(), 4);
        assert_eq!(json["tiers"][0]["tier"], "Bronze");
        assert!(json.get("progress").is_none());
    }
}
