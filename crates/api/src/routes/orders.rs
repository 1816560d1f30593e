//! Order history route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use loyalty_core::OrderStatus;

use crate::db::{OrderRepository, Pagination};
use crate::error::{AppError, Result};
use crate::middleware::RequireMember;
use crate::models::order::Order;
use crate::state::AppState;

use super::ApiQuery;

/// Query parameters for `GET /api/orders`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OrderQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<OrderStatus>,
}

impl OrderQuery {
    fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page.unwrap_or(1),
            limit: self.limit.unwrap_or(Pagination::DEFAULT_LIMIT),
        }
        .clamped()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPage {
    pub orders: Vec<Order>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub has_more: bool,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub order: Order,
}

/// The member's orders with line items, newest first.
///
/// GET /api/orders
#[instrument(skip_all, fields(customer_id = %member.customer_id))]
pub async fn index(
    State(state): State<AppState>,
    member: RequireMember,
    ApiQuery(query): ApiQuery<OrderQuery>,
) -> Result<Json<OrderPage>> {
    let page = query.pagination();
    let (orders, total) = OrderRepository::new(state.pool())
        .list_for_customer(member.customer_id, query.status, page)
        .await?;

    Ok(Json(OrderPage {
        orders,
        total,
        page: page.page,
        limit: page.limit,
        has_more: page.has_more(total),
    }))
}

/// One order by its order number.
///
/// GET /api/orders/{order_number}
#[instrument(skip_all, fields(customer_id = %member.customer_id, order_number = %order_number))]
pub async fn show(
    State(state): State<AppState>,
    member: RequireMember,
    Path(order_number): Path<String>,
) -> Result<Json<OrderResponse>> {
    let order = OrderRepository::new(state.pool())
        .get_by_number(&order_number)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
    if order.customer_id != member.customer_id {
        return Err(AppError::Forbidden("Access denied".to_string()));
    }
    Ok(Json(OrderResponse { order }))
}
