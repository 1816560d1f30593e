//! Transaction history and spending analytics.

use axum::{Json, extract::State};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::db::HistoryRepository;
use crate::error::Result;
use crate::middleware::RequireMember;
use crate::models::history::{Transaction, TransactionAnalytics, TransactionFilter};
use crate::state::AppState;

use super::{ApiQuery, HistoryQuery, Validator, non_blank};

/// Query parameters for `GET /api/transactions`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransactionQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub min_amount: Option<Decimal>,
    pub max_amount: Option<Decimal>,
    pub payment_method: Option<String>,
}

impl TransactionQuery {
    fn into_parts(self) -> Result<(HistoryQuery, TransactionFilter)> {
        let filter = TransactionFilter {
            search: non_blank(self.search),
            date_from: self.date_from,
            date_to: self.date_to,
            min_amount: self.min_amount,
            max_amount: self.max_amount,
            payment_method: non_blank(self.payment_method),
        };

        Validator::default()
            .check(
                !matches!((filter.date_from, filter.date_to), (Some(from), Some(to)) if from > to),
                "dateFrom",
                "dateFrom must not be after dateTo",
            )
            .check(
                !matches!((filter.min_amount, filter.max_amount), (Some(min), Some(max)) if min > max),
                "minAmount",
                "minAmount must not exceed maxAmount",
            )
            .check(
                filter.min_amount.is_none_or(|min| min >= Decimal::ZERO),
                "minAmount",
                "minAmount must not be negative",
            )
            .finish()?;

        let page = HistoryQuery {
            page: self.page,
            limit: self.limit,
        };
        Ok((page, filter))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPage {
    pub transactions: Vec<Transaction>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: i64,
}

/// The member's purchases as payments, newest first, with filters.
///
/// GET /api/transactions
#[instrument(skip_all, fields(customer_id = %member.customer_id))]
pub async fn index(
    State(state): State<AppState>,
    member: RequireMember,
    ApiQuery(query): ApiQuery<TransactionQuery>,
) -> Result<Json<TransactionPage>> {
    let (page, filter) = query.into_parts()?;
    let page = page.pagination();

    let (transactions, total) = HistoryRepository::new(state.pool())
        .transactions(member.customer_id, &filter, page)
        .await?;

    Ok(Json(TransactionPage {
        transactions,
        total,
        page: page.page,
        limit: page.limit,
        total_pages: page.total_pages(total),
    }))
}

/// Lifetime totals and spending breakdowns for the member.
///
/// GET /api/transactions/analytics
#[instrument(skip_all, fields(customer_id = %member.customer_id))]
pub async fn analytics(
    State(state): State<AppState>,
    member: RequireMember,
) -> Result<Json<TransactionAnalytics>> {
    let repo = HistoryRepository::new(state.pool());
    let customer_id = member.customer_id;

    let (totals, years, monthly, categories, products) = tokio::try_join!(
        repo.totals(customer_id),
        repo.year_spending(customer_id),
        repo.monthly_spending(customer_id),
        repo.category_spending(customer_id),
        repo.top_products(customer_id),
    )?;

    Ok(Json(TransactionAnalytics::new(
        totals, years, monthly, categories, products,
    )))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::extract::Query;
    use axum::http::Uri;

    use super::*;
    use crate::error::AppError;

    #[test]
    fn test_query_parses_camel_case() {
        let uri: Uri = "/api/transactions?page=2&dateFrom=2025-01-01&dateTo=2025-03-31&minAmount=10.50&paymentMethod=card"
            .parse()
            .unwrap();
        let Query(query) = Query::<TransactionQuery>::try_from_uri(&uri).unwrap();
        let (page, filter) = query.into_parts().unwrap();
        assert_eq!(page.pagination().page, 2);
        assert_eq!(page.pagination().limit, HistoryQuery::DEFAULT_LIMIT);
        assert_eq!(filter.min_amount, Some(Decimal::new(1_050, 2)));
        assert_eq!(filter.payment_method.as_deref(), Some("card"));
        assert_eq!(filter.search, None);
    }

    #[test]
    fn test_inverted_ranges_are_rejected() {
        let query = TransactionQuery {
            date_from: NaiveDate::from_ymd_opt(2025, 5, 1),
            date_to: NaiveDate::from_ymd_opt(2025, 4, 1),
            min_amount: Some(Decimal::from(100)),
            max_amount: Some(Decimal::from(5)),
            ..TransactionQuery::default()
        };
        match query.into_parts().unwrap_err() {
            AppError::Validation { details, .. } => {
                let fields: Vec<_> = details.iter().map(|d| d.field).collect();
                assert_eq!(fields, ["dateFrom", "minAmount"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let query = TransactionQuery {
            search: Some("   ".to_string()),
            ..TransactionQuery::default()
        };
        let (_, filter) = query.into_parts().unwrap();
        assert_eq!(filter.search, None);
    }
}
