//! Order history queries.

use std::collections::HashMap;

use sqlx::{PgPool, Postgres, QueryBuilder};

use loyalty_core::{CustomerId, OrderId, OrderStatus};

use super::{Pagination, RepositoryError};
use crate::models::order::{Order, OrderItem, OrderItemRow};

const ORDER_SELECT: &str = r"
    SELECT o.id, o.order_number, o.customer_id, o.order_date, o.status, o.origin,
           s.name AS store_name, o.subtotal, o.discount_amount, o.tax_amount,
           o.total_amount, o.points_earned
    FROM orders o
    LEFT JOIN store_locations s ON s.id = o.store_id";

/// Repository for orders and their line items.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of a customer's orders, newest first, with line items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_customer(
        &self,
        customer_id: CustomerId,
        status: Option<OrderStatus>,
        page: Pagination,
    ) -> Result<(Vec<Order>, i64), RepositoryError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM orders o WHERE o.customer_id = ");
        count.push_bind(customer_id);
        if let Some(status) = status {
            count.push(" AND o.status = ").push_bind(status);
        }
        let total = count.build_query_scalar::<i64>().fetch_one(self.pool).await?;

        let mut query = QueryBuilder::<Postgres>::new(ORDER_SELECT);
        query.push(" WHERE o.customer_id = ").push_bind(customer_id);
        if let Some(status) = status {
            query.push(" AND o.status = ").push_bind(status);
        }
        query
            .push(" ORDER BY o.order_date DESC, o.id DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let mut orders = query.build_query_as::<Order>().fetch_all(self.pool).await?;
        self.attach_items(&mut orders).await?;
        Ok((orders, total))
    }

    /// Get an order and its items by order number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_by_number(&self, order_number: &str) -> Result<Option<Order>, RepositoryError> {
        let sql = format!("{ORDER_SELECT} WHERE o.order_number = $1");
        let Some(order) = sqlx::query_as::<_, Order>(&sql)
            .bind(order_number)
            .fetch_optional(self.pool)
            .await?
        else {
            return Ok(None);
        };

        let mut orders = vec![order];
        self.attach_items(&mut orders).await?;
        Ok(orders.pop())
    }

    /// Load line items for every order in one query.
    async fn attach_items(&self, orders: &mut [Order]) -> Result<(), RepositoryError> {
        if orders.is_empty() {
            return Ok(());
        }
        let ids: Vec<i32> = orders.iter().map(|o| o.id.as_i32()).collect();

        let rows = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT order_id, product_id, product_name, quantity, unit_price,
                   total_price, modifiers
            FROM order_items
            WHERE order_id = ANY($1)
            ORDER BY order_id, id
            ",
        )
        .bind(ids)
        .fetch_all(self.pool)
        .await?;

        let mut by_order: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
        for row in rows {
            by_order.entry(row.order_id).or_default().push(row.into());
        }
        for order in orders {
            order.items = by_order.remove(&order.id).unwrap_or_default();
        }
        Ok(())
    }
}
