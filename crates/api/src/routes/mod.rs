//! HTTP route handlers for the loyalty API.
//!
//! # Route Structure
//!
//! ```text
//! # Auth
//! POST   /api/auth/register            - Create account, set cookie
//! POST   /api/auth/login               - Sign in (login attempt limiter)
//! GET    /api/auth/me                  - Current member
//! POST   /api/auth/logout              - Clear cookie
//! POST   /api/auth/password-strength   - Score a candidate password
//!
//! # Profile (requires auth)
//! PUT    /api/profile                  - Update name, email, phone
//! PUT    /api/profile/password         - Change password
//!
//! # Member data (requires auth)
//! GET    /api/dashboard/stats          - Spend summary and trend
//! GET    /api/appointments             - List, POST to book
//! PATCH  /api/appointments/{id}        - Update status or notes
//! GET    /api/work-orders              - List, POST to submit
//! PATCH  /api/work-orders/{id}         - Update status, notes, estimate
//! GET    /api/orders                   - Order history
//! GET    /api/orders/{orderNumber}     - One order
//! GET    /api/vouchers                 - Member vouchers
//! GET    /api/vouchers/{id}            - One voucher
//! POST   /api/vouchers/validate        - Check a voucher code
//! POST   /api/promotions/{id}/enroll   - Join a promotion
//!
//! # Catalog and locator (public)
//! GET    /api/products                 - Filtered, sorted, paginated catalog
//! GET    /api/products/categories      - Categories with counts
//! GET    /api/products/brands          - Distinct brands
//! GET    /api/products/{id}            - Product detail
//! GET    /api/stores                   - Store search, optional distance filter
//! GET    /api/stores/{id}              - Store detail
//! GET    /api/stores/{id}/services     - Bookable services
//! GET    /api/promotions               - Running promotions
//! GET    /api/tiers                    - Tier rules and progress
//!
//! # System settings (read: auth, write: admin)
//! GET    /api/system-settings          - Flat map or one typed key
//! POST   /api/system-settings          - Upsert one
//! PUT    /api/system-settings          - Bulk upsert
//! DELETE /api/system-settings/{key}    - Soft delete
//! POST   /api/system-settings/refresh  - Reload cache
//!
//! # Admin
//! GET    /api/admin/stats              - Pool, table counts, environment
//! ```

pub mod admin;
pub mod appointments;
pub mod auth;
pub mod dashboard;
pub mod loyalty;
pub mod orders;
pub mod products;
pub mod profile;
pub mod promotions;
pub mod settings;
pub mod stores;
pub mod tiers;
pub mod transactions;
pub mod vouchers;
pub mod work_orders;

use axum::{
    Json, Router,
    extract::{FromRequest, FromRequestParts, Query, Request, rejection::JsonRejection},
    http::{HeaderMap, header::USER_AGENT, request::Parts},
    routing::{get, patch, post, put},
};
use serde::{Deserialize, de::DeserializeOwned};

use crate::db::Pagination;
use crate::error::{AppError, FieldError};
use crate::state::AppState;

/// JSON body extractor that rejects with the API's JSON error shape.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(JsonRejection::MissingJsonContentType(_)) => Err(AppError::BadRequest(
                "Expected a JSON request body".to_string(),
            )),
            Err(rejection) => Err(AppError::BadRequest(rejection.body_text())),
        }
    }
}

/// Query string extractor that rejects with the API's JSON error shape.
pub struct ApiQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| Self(value))
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
    }
}

/// `page`/`limit` query for the history lists.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HistoryQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl HistoryQuery {
    pub const DEFAULT_LIMIT: u32 = 20;

    pub(crate) fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page.unwrap_or(1),
            limit: self.limit.unwrap_or(Self::DEFAULT_LIMIT),
        }
        .clamped()
    }
}

/// Collects field failures so a request reports every problem at once.
#[derive(Debug, Default)]
pub(crate) struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub(crate) fn check(&mut self, ok: bool, field: &'static str, message: &str) -> &mut Self {
        if !ok {
            self.errors.push(FieldError::new(field, message));
        }
        self
    }

    /// Require at least `min` characters after trimming.
    pub(crate) fn min_chars(
        &mut self,
        value: &str,
        min: usize,
        field: &'static str,
        message: &str,
    ) -> &mut Self {
        self.check(value.trim().chars().count() >= min, field, message)
    }

    pub(crate) fn finish(&mut self) -> Result<(), AppError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::from_fields(std::mem::take(&mut self.errors)))
        }
    }
}

/// The request's `User-Agent`, if readable.
pub(crate) fn user_agent(headers: &HeaderMap) -> Option<&str> {
    headers.get(USER_AGENT).and_then(|v| v.to_str().ok())
}

/// Trimmed optional text, with blank treated as absent.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/me", get(auth::me))
        .route("/logout", post(auth::logout))
        .route("/password-strength", post(auth::password_strength))
}

fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/", put(profile::update))
        .route("/password", put(profile::change_password))
        .route("/activity", get(profile::activity))
}

fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/categories", get(products::categories))
        .route("/brands", get(products::brands))
        .route("/{id}", get(products::show))
}

fn store_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(stores::index))
        .route("/{id}", get(stores::show))
        .route("/{id}/services", get(stores::services))
}

fn appointment_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(appointments::index).post(appointments::create))
        .route("/{id}", patch(appointments::update))
}

fn work_order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(work_orders::index).post(work_orders::create))
        .route("/{id}", patch(work_orders::update))
}

fn transaction_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(transactions::index))
        .route("/analytics", get(transactions::analytics))
}

fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{order_number}", get(orders::show))
}

fn promotion_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(promotions::index))
        .route("/{id}/enroll", post(promotions::enroll))
}

fn voucher_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(vouchers::index))
        .route("/validate", post(vouchers::validate))
        .route("/{id}", get(vouchers::show))
}

fn settings_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(settings::index)
                .post(settings::upsert)
                .put(settings::bulk_upsert),
        )
        .route("/refresh", post(settings::refresh))
        .route("/{key}", axum::routing::delete(settings::remove))
}

/// Create every `/api` route.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/profile", profile_routes())
        .route("/dashboard/stats", get(dashboard::stats))
        .nest("/products", product_routes())
        .nest("/stores", store_routes())
        .nest("/appointments", appointment_routes())
        .nest("/work-orders", work_order_routes())
        .nest("/orders", order_routes())
        .nest("/transactions", transaction_routes())
        .route("/loyalty/points", get(loyalty::points))
        .nest("/promotions", promotion_routes())
        .nest("/vouchers", voucher_routes())
        .route("/tiers", get(tiers::index))
        .nest("/system-settings", settings_routes())
        .route("/admin/stats", get(admin::stats))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validator_collects_every_failure() {
        let err = Validator::default()
            .min_chars(" a ", 2, "firstName", "First name must be at least 2 characters")
            .check(false, "email", "Invalid email address")
            .finish()
            .unwrap_err();
        match err {
            AppError::Validation { message, details } => {
                assert_eq!(message, "First name must be at least 2 characters");
                assert_eq!(details.len(), 2);
                assert_eq!(details.last().unwrap().field, "email");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_validator_passes_clean_input() {
        assert!(
            Validator::default()
                .min_chars("Ada", 2, "firstName", "too short")
                .finish()
                .is_ok()
        );
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  ".to_string())), None);
        assert_eq!(non_blank(Some(" x ".to_string())), Some("x".to_string()));
        assert_eq!(non_blank(None), None);
    }
}
