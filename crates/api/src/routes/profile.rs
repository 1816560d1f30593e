//! Profile route handlers.

use axum::{Json, extract::State, http::HeaderMap};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use loyalty_core::Email;

use crate::db::activity::{ActivityKind, ActivityLog};
use crate::db::{RepositoryError, UserRepository};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::{ClientIp, RequireAuth};
use crate::models::MemberProfile;
use crate::models::history::ActivityEntry;
use crate::models::user::ProfileUpdate;
use crate::services::auth::{AuthService, MIN_PASSWORD_LENGTH};
use crate::state::AppState;

use super::{ApiJson, ApiQuery, HistoryQuery, Validator, non_blank, user_agent};

/// Editable profile fields.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    pub phone: Option<String>,
}

/// Password change form.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
    #[serde(default)]
    pub confirm_password: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: MemberProfile,
}

#[derive(Debug, Serialize)]
pub struct PasswordChanged {
    pub success: bool,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityPage {
    pub logs: Vec<ActivityEntry>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: i64,
}

impl UpdateProfileRequest {
    fn validate(self) -> Result<ProfileUpdate> {
        let email = Email::parse(&self.email);
        Validator::default()
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
            .check(email.is_ok(), "email", "Invalid email address")
            .finish()?;

        let email = email.map_err(|_| AppError::invalid_field("email", "Invalid email address"))?;
        Ok(ProfileUpdate {
            email,
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            phone: non_blank(self.phone),
        })
    }
}

impl ChangePasswordRequest {
    fn validate(&self) -> Result<()> {
        Validator::default()
            .check(
                !self.current_password.is_empty(),
                "currentPassword",
                "Current password is required",
            )
            .check(
                self.new_password.chars().count() >= MIN_PASSWORD_LENGTH,
                "newPassword",
                "Password must be at least 8 characters",
            )
            .check(
                self.new_password == self.confirm_password,
                "confirmPassword",
                "Passwords don't match",
            )
            .finish()
    }
}

/// Update name, email and phone.
///
/// PUT /api/profile
#[instrument(skip_all, fields(user_id = %current.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    ClientIp(ip): ClientIp,
    headers: HeaderMap,
    ApiJson(req): ApiJson<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>> {
    let update = req.validate()?;
    let users = UserRepository::new(state.pool());

    users
        .update_profile(current.id, &update)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => {
                AppError::Conflict("Email is already in use by another account".to_string())
            }
            other => other.into(),
        })?;

    ActivityLog::new(state.pool())
        .record(
            current.id,
            ActivityKind::ProfileUpdate,
            "Profile updated",
            &ip,
            user_agent(&headers),
        )
        .await;
    add_breadcrumb("profile", "Profile updated");

    let profile = users
        .get_profile(current.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(Json(ProfileResponse { user: profile }))
}

/// Change the signed-in user's password.
///
/// PUT /api/profile/password
#[instrument(skip_all, fields(user_id = %current.id))]
pub async fn change_password(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    ClientIp(ip): ClientIp,
    headers: HeaderMap,
    ApiJson(req): ApiJson<ChangePasswordRequest>,
) -> Result<Json<PasswordChanged>> {
    req.validate()?;

    AuthService::new(state.pool())
        .change_password(current.id, &req.current_password, &req.new_password)
        .await?;

    tracing::info!("Password changed");
    ActivityLog::new(state.pool())
        .record(
            current.id,
            ActivityKind::PasswordChange,
            "Password changed",
            &ip,
            user_agent(&headers),
        )
        .await;

    Ok(Json(PasswordChanged {
        success: true,
        message: "Password updated successfully",
    }))
}

/// The signed-in user's account activity, newest first.
///
/// GET /api/profile/activity
#[instrument(skip_all, fields(user_id = %current.id))]
pub async fn activity(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    ApiQuery(query): ApiQuery<HistoryQuery>,
) -> Result<Json<ActivityPage>> {
    let page = query.pagination();
    let (logs, total) = ActivityLog::new(state.pool())
        .list_for_user(current.id, page)
        .await?;

    Ok(Json(ActivityPage {
        logs,
        total,
        page: page.page,
        limit: page.limit,
        total_pages: page.total_pages(total),
    }))
}
