//! Voucher route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use loyalty_core::VoucherId;

use crate::db::VoucherRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireMember;
use crate::models::reward::Voucher;
use crate::state::AppState;

use super::{ApiJson, ApiQuery};

/// Query parameters for `GET /api/vouchers`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct VoucherQuery {
    /// `active` restricts the list to redeemable vouchers.
    pub status: Option<String>,
}

impl VoucherQuery {
    fn active_only(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| s.trim().eq_ignore_ascii_case("active"))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ValidateRequest {
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct VouchersResponse {
    pub vouchers: Vec<Voucher>,
}

#[derive(Debug, Serialize)]
pub struct VoucherResponse {
    pub voucher: Voucher,
}

/// Outcome of a voucher code check.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Validation {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voucher: Option<VoucherSummary>,
}

/// What a valid voucher is worth, without ownership details.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VoucherSummary {
    pub voucher_code: String,
    pub name: String,
    pub voucher_type: loyalty_core::VoucherType,
    pub face_value: Option<rust_decimal::Decimal>,
    pub discount_percent: Option<rust_decimal::Decimal>,
    pub remaining_value: Option<rust_decimal::Decimal>,
    pub expiration_date: Option<chrono::DateTime<Utc>>,
}

impl Validation {
    fn rejected(reason: &'static str) -> Self {
        Self {
            valid: false,
            reason: Some(reason),
            voucher: None,
        }
    }

    fn check(voucher: Option<Voucher>, member: &RequireMember) -> Self {
        let Some(voucher) = voucher.filter(|v| v.customer_id == member.customer_id) else {
            return Self::rejected("Voucher not found");
        };
        if let Some(reason) = voucher.rejection_reason(Utc::now()) {
            return Self::rejected(reason);
        }
        Self {
            valid: true,
            reason: None,
            voucher: Some(VoucherSummary {
                voucher_code: voucher.voucher_code,
                name: voucher.name,
                voucher_type: voucher.voucher_type,
                face_value: voucher.face_value,
                discount_percent: voucher.discount_percent,
                remaining_value: voucher.remaining_value,
                expiration_date: voucher.expiration_date,
            }),
        }
    }
}

/// The member's vouchers.
///
/// GET /api/vouchers
#[instrument(skip_all, fields(customer_id = %member.customer_id))]
pub async fn index(
    State(state): State<AppState>,
    member: RequireMember,
    ApiQuery(query): ApiQuery<VoucherQuery>,
) -> Result<Json<VouchersResponse>> {
    let vouchers = VoucherRepository::new(state.pool())
        .list_for_customer(member.customer_id, query.active_only())
        .await?;
    Ok(Json(VouchersResponse { vouchers }))
}

/// Voucher detail.
///
/// GET /api/vouchers/{id}
#[instrument(skip_all, fields(customer_id = %member.customer_id, voucher_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    member: RequireMember,
    Path(id): Path<VoucherId>,
) -> Result<Json<VoucherResponse>> {
    let voucher = VoucherRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Voucher not found".to_string()))?;
    if voucher.customer_id != member.customer_id {
        return Err(AppError::Forbidden("Access denied".to_string()));
    }
    Ok(Json(VoucherResponse { voucher }))
}

/// Check whether a code is redeemable by the member.
///
/// POST /api/vouchers/validate
#[instrument(skip_all, fields(customer_id = %member.customer_id))]
pub async fn validate(
    State(state): State<AppState>,
    member: RequireMember,
    ApiJson(req): ApiJson<ValidateRequest>,
) -> Result<Json<Validation>> {
    let code = req.code.trim();
    if code.is_empty() {
        return Err(AppError::invalid_field("code", "Voucher code is required"));
    }

    let voucher = VoucherRepository::new(state.pool()).get_by_code(code).await?;
    Ok(Json(Validation::check(voucher, &member)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_active_filter_is_case_insensitive() {
        let query = VoucherQuery {
            status: Some("Active".to_string()),
        };
        assert!(query.active_only());
        assert!(!VoucherQuery::default().active_only());
        let query = VoucherQuery {
            status: Some("all".to_string()),
        };
        assert!(!query.active_only());
    }

    #[test]
    fn test_rejected_omits_voucher() {
        let json = serde_json::to_value(Validation::rejected("Voucher has expired")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"valid": false, "reason": "Voucher has expired"})
        );
    }
}
