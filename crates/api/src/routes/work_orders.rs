//! Work order route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use loyalty_core::{StoreId, WorkOrderId, WorkOrderPriority, WorkOrderStatus};

use crate::db::{StoreRepository, WorkOrderRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireMember;
use crate::models::booking::{NewWorkOrder, WorkOrder, WorkOrderFilter, WorkOrderUpdate};
use crate::state::AppState;

use super::{ApiJson, ApiQuery, Validator, non_blank};

/// Query parameters for `GET /api/work-orders`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorkOrderQuery {
    pub status: Option<WorkOrderStatus>,
    pub store_id: Option<StoreId>,
    #[serde(rename = "type")]
    pub work_type: Option<String>,
}

/// Work order submission.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateWorkOrderRequest {
    pub store_id: Option<StoreId>,
    #[serde(rename = "type")]
    pub work_type: String,
    pub priority: Option<WorkOrderPriority>,
    pub title: String,
    pub description: String,
    pub customer_notes: Option<String>,
}

/// Partial update body.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateWorkOrderRequest {
    pub status: Option<WorkOrderStatus>,
    pub customer_notes: Option<String>,
    pub estimated_cost: Option<Decimal>,
    pub estimated_completion: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrdersResponse {
    pub work_orders: Vec<WorkOrder>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrderResponse {
    pub work_order: WorkOrder,
}

impl CreateWorkOrderRequest {
    fn validate(&self) -> Result<StoreId> {
        Validator::default()
            .check(self.store_id.is_some(), "storeId", "Store is required")
            .min_chars(&self.work_type, 1, "type", "Work order type is required")
            .min_chars(&self.title, 1, "title", "Title is required")
            .min_chars(&self.description, 1, "description", "Description is required")
            .finish()?;
        self.store_id
            .ok_or_else(|| AppError::invalid_field("storeId", "Store is required"))
    }
}

impl UpdateWorkOrderRequest {
    fn into_update(self) -> Result<WorkOrderUpdate> {
        if self.estimated_cost.is_some_and(|c| c.is_sign_negative()) {
            return Err(AppError::invalid_field(
                "estimatedCost",
                "Estimated cost cannot be negative",
            ));
        }
        let update = WorkOrderUpdate {
            status: self.status,
            customer_notes: self.customer_notes,
            estimated_cost: self.estimated_cost,
            estimated_completion: self.estimated_completion,
        };
        if update.is_empty() {
            return Err(AppError::BadRequest("No fields to update".to_string()));
        }
        Ok(update)
    }
}

/// The member's work orders, newest first.
///
/// GET /api/work-orders
#[instrument(skip_all, fields(customer_id = %member.customer_id))]
pub async fn index(
    State(state): State<AppState>,
    member: RequireMember,
    ApiQuery(query): ApiQuery<WorkOrderQuery>,
) -> Result<Json<WorkOrdersResponse>> {
    let work_orders = WorkOrderRepository::new(state.pool())
        .list_for_customer(
            member.customer_id,
            &WorkOrderFilter {
                status: query.status,
                store_id: query.store_id,
                work_type: non_blank(query.work_type),
            },
        )
        .await?;
    Ok(Json(WorkOrdersResponse { work_orders }))
}

/// Submit a work order.
///
/// POST /api/work-orders
#[instrument(skip_all, fields(customer_id = %member.customer_id))]
pub async fn create(
    State(state): State<AppState>,
    member: RequireMember,
    ApiJson(req): ApiJson<CreateWorkOrderRequest>,
) -> Result<(StatusCode, Json<WorkOrderResponse>)> {
    let store_id = req.validate()?;
    if !StoreRepository::new(state.pool()).exists(store_id).await? {
        return Err(AppError::NotFound("Store not found".to_string()));
    }

    let work_order = WorkOrderRepository::new(state.pool())
        .create(&NewWorkOrder {
            customer_id: member.customer_id,
            store_id,
            work_type: req.work_type.trim().to_string(),
            priority: req.priority.unwrap_or(WorkOrderPriority::Normal),
            title: req.title.trim().to_string(),
            description: req.description.trim().to_string(),
            customer_notes: non_blank(req.customer_notes),
        })
        .await?;

    tracing::info!(work_order_id = %work_order.id, "Work order submitted");
    Ok((StatusCode::CREATED, Json(WorkOrderResponse { work_order })))
}

/// Update a work order.
///
/// PATCH /api/work-orders/{id}
#[instrument(skip_all, fields(customer_id = %member.customer_id, work_order_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    member: RequireMember,
    Path(id): Path<WorkOrderId>,
    ApiJson(req): ApiJson<UpdateWorkOrderRequest>,
) -> Result<Json<WorkOrderResponse>> {
    let repo = WorkOrderRepository::new(state.pool());
    let existing = repo
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Work order not found".to_string()))?;
    if existing.customer_id != member.customer_id {
        return Err(AppError::Forbidden("Access denied".to_string()));
    }

    let work_order = repo.update(id, &req.into_update()?).await?;
    Ok(Json(WorkOrderResponse { work_order }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_create_requires_store_and_text() {
        let err = CreateWorkOrderRequest {
            title: "Brake noise".to_string(),
            ..CreateWorkOrderRequest::default()
        }
        .validate()
        .unwrap_err();
        match err {
            AppError::Validation { details, .. } => {
                let fields: Vec<_> = details.iter().map(|d| d.field).collect();
                assert_eq!(fields, ["storeId", "type", "description"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_empty_update_is_rejected() {
        assert!(matches!(
            UpdateWorkOrderRequest::default().into_update(),
            Err(AppError::BadRequest(msg)) if msg == "No fields to update"
        ));
    }

    #[test]
    fn test_negative_estimate_is_rejected() {
        let req = UpdateWorkOrderRequest {
            estimated_cost: Some(Decimal::new(-100, 2)),
            ..UpdateWorkOrderRequest::default()
        };
        assert!(matches!(req.into_update(), Err(AppError::Validation { .. })));
    }
}
