//! Work order queries.

use sqlx::{PgPool, Postgres, QueryBuilder};

use loyalty_core::{CustomerId, WorkOrderId};

use super::RepositoryError;
use crate::models::booking::{NewWorkOrder, WorkOrder, WorkOrderFilter, WorkOrderUpdate};

const WORK_ORDER_SELECT: &str = r"
    SELECT w.id, w.customer_id, w.store_id, s.name AS store_name, w.work_type,
           w.priority, w.title, w.description, w.status, w.customer_notes,
           w.estimated_cost, w.estimated_completion, w.created_at, w.updated_at
    FROM work_orders w
    JOIN store_locations s ON s.id = w.store_id";

/// Repository for work orders.
pub struct WorkOrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WorkOrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A customer's work orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_customer(
        &self,
        customer_id: CustomerId,
        filter: &WorkOrderFilter,
    ) -> Result<Vec<WorkOrder>, RepositoryError> {
        let mut query = QueryBuilder::<Postgres>::new(WORK_ORDER_SELECT);
        query.push(" WHERE w.customer_id = ").push_bind(customer_id);
        if let Some(status) = filter.status {
            query.push(" AND w.status = ").push_bind(status);
        }
        if let Some(store_id) = filter.store_id {
            query.push(" AND w.store_id = ").push_bind(store_id);
        }
        if let Some(work_type) = &filter.work_type {
            query.push(" AND w.work_type = ").push_bind(work_type.clone());
        }
        query.push(" ORDER BY w.created_at DESC");

        let rows = query
            .build_query_as::<WorkOrder>()
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    /// Get a work order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: WorkOrderId) -> Result<Option<WorkOrder>, RepositoryError> {
        let sql = format!("{WORK_ORDER_SELECT} WHERE w.id = $1");
        let row = sqlx::query_as::<_, WorkOrder>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row)
    }

    /// Submit a new work order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, new: &NewWorkOrder) -> Result<WorkOrder, RepositoryError> {
        let id = sqlx::query_scalar::<_, WorkOrderId>(
            r"
            INSERT INTO work_orders
                (customer_id, store_id, work_type, priority, title, description,
                 customer_notes, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'submitted')
            RETURNING id
            ",
        )
        .bind(new.customer_id)
        .bind(new.store_id)
        .bind(&new.work_type)
        .bind(new.priority)
        .bind(&new.title)
        .bind(&new.description)
        .bind(&new.customer_notes)
        .fetch_one(self.pool)
        .await?;

        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the work order does not exist.
    pub async fn update(
        &self,
        id: WorkOrderId,
        update: &WorkOrderUpdate,
    ) -> Result<WorkOrder, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE work_orders
            SET status = COALESCE($1, status),
                customer_notes = COALESCE($2, customer_notes),
                estimated_cost = COALESCE($3, estimated_cost),
                estimated_completion = COALESCE($4, estimated_completion),
                updated_at = NOW()
            WHERE id = $5
            ",
        )
        .bind(update.status)
        .bind(&update.customer_notes)
        .bind(update.estimated_cost)
        .bind(update.estimated_completion)
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }
}
