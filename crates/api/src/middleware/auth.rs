//! Authentication extractors.
//!
//! The `auth-token` cookie is verified and the account reloaded on every
//! request, so deactivation and role changes apply immediately.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use loyalty_core::{CustomerId, UserRole};

use crate::db::UserRepository;
use crate::error::{AppError, set_sentry_user};
use crate::models::CurrentUser;
use crate::services::auth::cookies::token_from_headers;
use crate::state::AppState;

const NOT_AUTHENTICATED: &str = "Not authenticated";
const INVALID_TOKEN: &str = "Invalid token";

/// Resolve the signed-in user from the request cookie.
///
/// Returns `Ok(None)` when no cookie is present.
async fn current_user(parts: &Parts, state: &AppState) -> Result<Option<CurrentUser>, AppError> {
    let Some(token) = token_from_headers(&parts.headers) else {
        return Ok(None);
    };

    let claims = state
        .jwt()
        .verify(&token)
        .map_err(|_| AppError::Unauthorized(INVALID_TOKEN.to_string()))?;
    let user_id = claims
        .user_id()
        .map_err(|_| AppError::Unauthorized(INVALID_TOKEN.to_string()))?;

    let user = UserRepository::new(state.pool())
        .get_by_id(user_id)
        .await?
        .filter(|user| user.is_active)
        .ok_or_else(|| AppError::Unauthorized(INVALID_TOKEN.to_string()))?;

    set_sentry_user(&user.id, Some(user.email.as_str()));

    Ok(Some(CurrentUser {
        id: user.id,
        email: user.email,
        role: user.role,
    }))
}

/// Extractor that requires a signed-in user; rejects with 401 JSON.
///
/// # Example
///
/// ```rust,ignore
/// async fn me(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     Json(user)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        current_user(parts, state)
            .await?
            .map(Self)
            .ok_or_else(|| AppError::Unauthorized(NOT_AUTHENTICATED.to_string()))
    }
}

/// Extractor that optionally gets the current user.
///
/// A missing or invalid cookie yields `None` rather than a rejection.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match current_user(parts, state).await {
            Ok(user) => Ok(Self(user)),
            Err(AppError::Unauthorized(_)) => Ok(Self(None)),
            Err(other) => Err(other),
        }
    }
}

/// Extractor for admin-only routes; 401 when signed out, 403 below admin.
pub struct RequireAdmin(pub CurrentUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAuth(user) = RequireAuth::from_request_parts(parts, state).await?;
        require_role(&user, UserRole::Admin)?;
        Ok(Self(user))
    }
}

/// Extractor for a signed-in user with a customer record.
///
/// Rejects with 404 "Customer not found" when the account has none.
pub struct RequireMember {
    pub user: CurrentUser,
    pub customer_id: CustomerId,
}

impl FromRequestParts<AppState> for RequireMember {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAuth(user) = RequireAuth::from_request_parts(parts, state).await?;
        let customer_id = UserRepository::new(state.pool())
            .customer_id(user.id)
            .await?
            .ok_or_else(|| AppError::NotFound("Customer not found".to_string()))?;
        Ok(Self { user, customer_id })
    }
}

/// Reject users below `required`.
///
/// # Errors
///
/// Returns `AppError::Forbidden` if the user's role is too low.
pub fn require_role(user: &CurrentUser, required: UserRole) -> Result<(), AppError> {
    if user.has_role(required) {
        Ok(())
    } else {
        Err(AppError::Forbidden("Insufficient permissions".to_string()))
    }
}
