//! Product catalog queries.

use sqlx::{PgPool, Postgres, QueryBuilder};

use loyalty_core::{ProductId, StockStatus};

use super::{Pagination, RepositoryError};
use crate::models::catalog::{
    CategoryCount, Product, ProductDetail, ProductFilter, ProductImage, ProductRow,
};

const PRODUCT_SELECT: &str = r"
    SELECT p.id, p.name, p.description, p.category, p.brand, p.sku, p.price,
           p.stock_quantity, p.is_pre_order, p.is_featured, p.created_at,
           (SELECT i.url FROM product_images i
            WHERE i.product_id = p.id
            ORDER BY i.is_primary DESC, i.sort_order
            LIMIT 1) AS image_url
    FROM products p
    WHERE p.is_active";

const RELATED_LIMIT: i64 = 4;

/// Repository for catalog reads.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List active products matching `filter`, returning one page and the
    /// total match count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        filter: &ProductFilter,
        page: Pagination,
    ) -> Result<(Vec<Product>, i64), RepositoryError> {
        let mut count_query =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products p WHERE p.is_active");
        push_filters(&mut count_query, filter);
        let total = count_query
            .build_query_scalar::<i64>()
            .fetch_one(self.pool)
            .await?;

        let mut query = QueryBuilder::<Postgres>::new(PRODUCT_SELECT);
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY ")
            .push(filter.sort_field.column())
            .push(" ")
            .push(filter.sort_direction.keyword())
            .push(" NULLS LAST, p.id LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = query
            .build_query_as::<ProductRow>()
            .fetch_all(self.pool)
            .await?;

        Ok((rows.into_iter().map(Product::from).collect(), total))
    }

    /// Get an active product with its images and related products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_detail(&self, id: ProductId) -> Result<Option<ProductDetail>, RepositoryError> {
        let sql = format!("{PRODUCT_SELECT} AND p.id = $1");
        let Some(row) = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
        else {
            return Ok(None);
        };

        let images = sqlx::query_as::<_, ProductImage>(
            r"
            SELECT url, alt_text, is_primary, sort_order
            FROM product_images
            WHERE product_id = $1
            ORDER BY is_primary DESC, sort_order, id
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        let related = match row.category.as_deref() {
            Some(category) => {
                let sql = format!(
                    "{PRODUCT_SELECT} AND p.category = $1 AND p.id <> $2 \
                     ORDER BY p.is_featured DESC, p.name LIMIT $3"
                );
                sqlx::query_as::<_, ProductRow>(&sql)
                    .bind(category)
                    .bind(id)
                    .bind(RELATED_LIMIT)
                    .fetch_all(self.pool)
                    .await?
            }
            None => Vec::new(),
        };

        Ok(Some(ProductDetail {
            product: row.into(),
            images,
            related_products: related.into_iter().map(Product::from).collect(),
        }))
    }

    /// Categories of active products with their product counts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn categories(&self) -> Result<Vec<CategoryCount>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryCount>(
            r"
            SELECT category, COUNT(*) AS product_count
            FROM products
            WHERE is_active AND category IS NOT NULL
            GROUP BY category
            ORDER BY category
            ",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Distinct brands of active products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn brands(&self) -> Result<Vec<String>, RepositoryError> {
        let rows = sqlx::query_scalar::<_, String>(
            r"
            SELECT DISTINCT brand
            FROM products
            WHERE is_active AND brand IS NOT NULL
            ORDER BY brand
            ",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }
}

/// Append the `AND ...` clauses for `filter`. The builder must already end in
/// a `WHERE` condition.
fn push_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", escape_like(search));
        query
            .push(" AND (p.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.description ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.brand ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(category) = &filter.category {
        query.push(" AND p.category = ").push_bind(category.clone());
    }
    if let Some(brand) = &filter.brand {
        query.push(" AND p.brand = ").push_bind(brand.clone());
    }
    if let Some(min) = filter.min_price {
        query.push(" AND p.price >= ").push_bind(min);
    }
    if let Some(max) = filter.max_price {
        query.push(" AND p.price <= ").push_bind(max);
    }
    if let Some(status) = filter.stock_status {
        query.push(match status {
            // Anything purchasable now, low stock included.
            StockStatus::InStock => " AND NOT p.is_pre_order AND p.stock_quantity > 0",
            StockStatus::LowStock => {
                " AND NOT p.is_pre_order AND p.stock_quantity BETWEEN 1 AND 10"
            }
            StockStatus::OutOfStock => " AND NOT p.is_pre_order AND p.stock_quantity <= 0",
            StockStatus::PreOrder => " AND p.is_pre_order",
        });
    }
}

/// Escape `%`, `_` and `\` so user search text matches literally.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
