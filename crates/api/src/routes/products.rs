//! Catalog route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use loyalty_core::{ProductId, StockStatus};

use crate::db::{Pagination, ProductRepository};
use crate::error::{AppError, Result};
use crate::models::catalog::{
    CategoryCount, Product, ProductDetail, ProductFilter, ProductSortField, SortDirection,
};
use crate::state::AppState;

use super::{ApiQuery, non_blank};

/// Query parameters for `GET /api/products`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProductQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub stock_status: Option<StockStatus>,
    pub sort_field: Option<ProductSortField>,
    pub sort_direction: Option<SortDirection>,
}

impl ProductQuery {
    fn into_parts(self) -> (ProductFilter, Pagination) {
        let page = Pagination {
            page: self.page.unwrap_or(1),
            limit: self.limit.unwrap_or(Pagination::DEFAULT_LIMIT),
        }
        .clamped();
        let filter = ProductFilter {
            search: non_blank(self.search),
            category: non_blank(self.category),
            brand: non_blank(self.brand),
            min_price: self.min_price,
            max_price: self.max_price,
            stock_status: self.stock_status,
            sort_field: self.sort_field.unwrap_or_default(),
            sort_direction: self.sort_direction.unwrap_or_default(),
        };
        (filter, page)
    }
}

/// One page of the catalog.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub has_more: bool,
}

#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub categories: Vec<CategoryCount>,
}

#[derive(Debug, Serialize)]
pub struct BrandsResponse {
    pub brands: Vec<String>,
}

/// Product listing.
///
/// GET /api/products
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ProductQuery>,
) -> Result<Json<ProductPage>> {
    let (filter, page) = query.into_parts();
    let (products, total) = ProductRepository::new(state.pool())
        .list(&filter, page)
        .await?;

    Ok(Json(ProductPage {
        products,
        total,
        page: page.page,
        limit: page.limit,
        has_more: page.has_more(total),
    }))
}

/// Product detail with images and related products.
///
/// GET /api/products/{id}
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductDetail>> {
    ProductRepository::new(state.pool())
        .get_detail(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))
}

/// Categories with product counts.
///
/// GET /api/products/categories
pub async fn categories(State(state): State<AppState>) -> Result<Json<CategoriesResponse>> {
    let categories = ProductRepository::new(state.pool()).categories().await?;
    Ok(Json(CategoriesResponse { categories }))
}

/// Distinct brands.
///
/// GET /api/products/brands
pub async fn brands(State(state): State<AppState>) -> Result<Json<BrandsResponse>> {
    let brands = ProductRepository::new(state.pool()).brands().await?;
    Ok(Json(BrandsResponse { brands }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_query_defaults() {
        let (filter, page) = ProductQuery::default().into_parts();
        assert_eq!(page.page, 1);
        assert_eq!(page.limit, 12);
        assert_eq!(filter.sort_field, ProductSortField::Name);
        assert_eq!(filter.sort_direction, SortDirection::Asc);
        assert!(filter.search.is_none());
    }

    #[test]
    fn test_query_clamps_limit_and_drops_blank_text() {
        let query = ProductQuery {
            limit: Some(500),
            page: Some(0),
            category: Some("  ".to_string()),
            ..ProductQuery::default()
        };
        let (filter, page) = query.into_parts();
        assert_eq!(page.limit, 100);
        assert_eq!(page.page, 1);
        assert!(filter.category.is_none());
    }
}
