//! Account route handlers.
//!
//! Sign-in state lives in the `auth-token` cookie. Failed logins are counted
//! per client IP by the login attempt limiter.

use std::time::Instant;

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::IntoResponse,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use loyalty_core::{Email, PasswordStrength, StrengthReport, UserRole};

use crate::db::UserRepository;
use crate::db::activity::{ActivityKind, ActivityLog};
use crate::error::{AppError, Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::middleware::{ClientIp, OptionalAuth, RequireAuth};
use crate::models::MemberProfile;
use crate::models::user::User;
use crate::services::auth::cookies::{cleared_cookie, session_cookie};
use crate::services::auth::{
    AuthError, AuthService, MIN_LOGIN_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH, Registration,
};
use crate::services::login_limiter::LOCKOUT_MESSAGE;
use crate::services::loyalty_sync::MemberPayload;
use crate::state::AppState;

use super::{ApiJson, Validator, non_blank, user_agent};

/// Registration form.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub phone: Option<String>,
    #[serde(default)]
    pub marketing_consent: bool,
}

/// Sign-in form.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Body of every endpoint that returns the member.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: MemberProfile,
}

/// Body of `POST /api/auth/logout`.
#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

/// Body of `POST /api/auth/password-strength`.
#[derive(Debug, Deserialize)]
pub struct StrengthRequest {
    #[serde(default)]
    pub password: String,
}

impl RegisterRequest {
    fn validate(&self) -> Result<Email> {
        let email = Email::parse(&self.email);
        Validator::default()
            .check(email.is_ok(), "email", "Invalid email address")
            .check(
                self.password.chars().count() >= MIN_PASSWORD_LENGTH,
                "password",
                "Password must be at least 8 characters",
            )
            .check(
                self.password == self.confirm_password,
                "confirmPassword",
                "Passwords don't match",
            )
            .min_chars(
                &self.first_name,
                2,
                "firstName",
                "First name must be at least 2 characters",
            )
            .min_chars(
                &self.last_name,
                2,
                "lastName",
                "Last name must be at least 2 characters",
            )
            .finish()?;
        Ok(email.map_err(AuthError::from)?)
    }
}

impl LoginRequest {
    fn validate(&self) -> Result<()> {
        Validator::default()
            .check(Email::parse(&self.email).is_ok(), "email", "Invalid email address")
            .check(
                self.password.chars().count() >= MIN_LOGIN_PASSWORD_LENGTH,
                "password",
                "Password must be at least 6 characters",
            )
            .finish()
    }
}

/// Load the member view of a user, treating a vanished account as signed out.
async fn load_profile(state: &AppState, user: &User) -> Result<MemberProfile> {
    UserRepository::new(state.pool())
        .get_profile(user.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))
}

/// Issue a token for `user` and render it as a `Set-Cookie` value.
fn auth_cookie(state: &AppState, user: &User) -> Result<String> {
    let token = state.jwt().issue(user, Utc::now())?;
    Ok(session_cookie(token, state.config().is_https()).to_string())
}

/// Push a new member to the loyalty platform if an endpoint is known.
async fn sync_new_member(state: &AppState, profile: &MemberProfile) {
    let Some(customer_id) = profile.customer_id else {
        return;
    };
    let Some(endpoint) = state.sync_endpoint().await else {
        return;
    };

    state.sync().spawn_member_create(
        endpoint,
        MemberPayload {
            user_id: profile.id,
            customer_id,
            email: profile.email.to_string(),
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            phone: profile.phone.clone(),
            enrollment_date: profile
                .enrollment_date
                .unwrap_or_else(|| Utc::now().date_naive()),
        },
    );
}

/// Create an account.
///
/// POST /api/auth/register
#[instrument(skip_all, fields(ip = %ip))]
pub async fn register(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    headers: HeaderMap,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse> {
    let email = req.validate()?;

    let (user, customer_id) = AuthService::new(state.pool())
        .register(Registration {
            email,
            password: req.password,
            first_name: req.first_name.trim().to_string(),
            last_name: req.last_name.trim().to_string(),
            phone: non_blank(req.phone),
            marketing_consent: req.marketing_consent,
            role: UserRole::Customer,
        })
        .await?;

    tracing::info!(user_id = %user.id, customer_id = %customer_id, "Member registered");
    set_sentry_user(&user.id, Some(user.email.as_str()));
    add_breadcrumb("auth", "Member registered");

    ActivityLog::new(state.pool())
        .record(
            user.id,
            ActivityKind::Register,
            "Account created",
            &ip,
            user_agent(&headers),
        )
        .await;

    let cookie = auth_cookie(&state, &user)?;
    let profile = load_profile(&state, &user).await?;
    sync_new_member(&state, &profile).await;

    Ok((
        StatusCode::CREATED,
        [(SET_COOKIE, cookie)],
        Json(UserResponse { user: profile }),
    ))
}

/// Sign in with email and password.
///
/// POST /api/auth/login
#[instrument(skip_all, fields(ip = %ip))]
pub async fn login(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    headers: HeaderMap,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse> {
    let limiter = state.login_limiter();
    if let Err(locked) = limiter.check(&ip, Instant::now()) {
        tracing::warn!(retry_after_secs = locked.retry_after.as_secs(), "Login locked out");
        return Err(AppError::TooManyRequests(LOCKOUT_MESSAGE.to_string()));
    }

    req.validate()?;

    let user = match AuthService::new(state.pool())
        .login(&req.email, &req.password)
        .await
    {
        Ok(user) => user,
        Err(AuthError::InvalidCredentials) => {
            let failures = limiter.record_failure(&ip, Instant::now());
            tracing::info!(failures, "Failed login attempt");
            return Err(AuthError::InvalidCredentials.into());
        }
        Err(other) => return Err(other.into()),
    };

    limiter.record_success(&ip);
    set_sentry_user(&user.id, Some(user.email.as_str()));
    add_breadcrumb("auth", "Member signed in");

    ActivityLog::new(state.pool())
        .record(
            user.id,
            ActivityKind::Login,
            "Signed in",
            &ip,
            user_agent(&headers),
        )
        .await;

    let cookie = auth_cookie(&state, &user)?;
    let profile = load_profile(&state, &user).await?;

    Ok(([(SET_COOKIE, cookie)], Json(UserResponse { user: profile })))
}

/// The signed-in member.
///
/// GET /api/auth/me
#[instrument(skip_all, fields(user_id = %current.id))]
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<UserResponse>> {
    let profile = UserRepository::new(state.pool())
        .get_profile(current.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;
    Ok(Json(UserResponse { user: profile }))
}

/// Clear the session cookie.
///
/// POST /api/auth/logout
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    headers: HeaderMap,
    OptionalAuth(current): OptionalAuth,
) -> impl IntoResponse {
    if let Some(user) = current {
        ActivityLog::new(state.pool())
            .record(
                user.id,
                ActivityKind::Logout,
                "Signed out",
                &ip,
                user_agent(&headers),
            )
            .await;
    }
    clear_sentry_user();

    let cookie = cleared_cookie(state.config().is_https()).to_string();
    ([(SET_COOKIE, cookie)], Json(LogoutResponse { success: true }))
}

/// Score a candidate password.
///
/// POST /api/auth/password-strength
pub async fn password_strength(ApiJson(req): ApiJson<StrengthRequest>) -> Json<StrengthReport> {
    Json(PasswordStrength::estimate(&req.password).report())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn registration() -> RegisterRequest {
        RegisterRequest {
            email: "ada@example.com".to_string(),
            password: "Abc12345!".to_string(),
            confirm_password: "Abc12345!".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            phone: None,
            marketing_consent: false,
        }
    }

    #[test]
    fn test_valid_registration() {
        let email = registration().validate().unwrap();
        assert_eq!(email.as_str(), "ada@example.com");
    }

    #[test]
    fn test_registration_reports_each_field() {
        let req = RegisterRequest {
            email: "nope".to_string(),
            confirm_password: "different1".to_string(),
            first_name: "A".to_string(),
            ..registration()
        };
        match req.validate().unwrap_err() {
            AppError::Validation { details, .. } => {
                let fields: Vec<_> = details.iter().map(|d| d.field).collect();
                assert_eq!(fields, ["email", "confirmPassword", "firstName"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_login_password_minimum() {
        let req = LoginRequest {
            email: "ada@example.com".to_string(),
            password: "12345".to_string(),
        };
        assert!(matches!(req.validate(), Err(AppError::Validation { .. })));

        let req = LoginRequest {
            password: "123456".to_string(),
            ..req
        };
        assert!(req.validate().is_ok());
    }
}
