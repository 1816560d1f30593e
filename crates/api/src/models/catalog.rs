//! Product catalog types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use loyalty_core::{ProductId, StockStatus};

/// Product row as stored.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub sku: Option<String>,
    pub price: Decimal,
    pub stock_quantity: i32,
    pub is_pre_order: bool,
    pub is_featured: bool,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Product as returned by the API, with its derived stock status.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub sku: Option<String>,
    pub price: Decimal,
    pub stock_quantity: i32,
    pub stock_status: StockStatus,
    pub is_featured: bool,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            stock_status: StockStatus::from_quantity(row.stock_quantity, row.is_pre_order),
            id: row.id,
            name: row.name,
            description: row.description,
            category: row.category,
            brand: row.brand,
            sku: row.sku,
            price: row.price,
            stock_quantity: row.stock_quantity,
            is_featured: row.is_featured,
            image_url: row.image_url,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProductImage {
    pub url: String,
    pub alt_text: Option<String>,
    pub is_primary: bool,
    pub sort_order: i32,
}

/// Product detail page payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub images: Vec<ProductImage>,
    pub related_products: Vec<Product>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    pub category: String,
    pub product_count: i64,
}

/// Column a product listing may be sorted by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProductSortField {
    #[default]
    Name,
    Price,
    CreatedAt,
    Category,
    Brand,
}

impl ProductSortField {
    /// Column expression, never user text.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Name => "p.name",
            Self::Price => "p.price",
            Self::CreatedAt => "p.created_at",
            Self::Category => "p.category",
            Self::Brand => "p.brand",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Catalog listing filters. Every field is optional.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub search: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub stock_status: Option<StockStatus>,
    pub sort_field: ProductSortField,
    pub sort_direction: SortDirection,
}
