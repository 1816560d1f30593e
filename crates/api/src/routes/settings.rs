//! System settings route handlers.
//!
//! Reads go through the [`SettingsCache`](crate::services::settings_cache::SettingsCache);
//! every write invalidates it.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::instrument;

use loyalty_core::{SettingCategory, SettingType};

use crate::db::{RepositoryError, SettingsRepository};
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::setting::{SettingUpsert, SystemSetting};
use crate::state::AppState;

use super::{ApiJson, ApiQuery, non_blank};

/// Query parameters for `GET /api/system-settings`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SettingsQuery {
    pub category: Option<SettingCategory>,
    pub key: Option<String>,
    #[serde(rename = "type")]
    pub setting_type: Option<SettingType>,
}

/// Either the flat map or a single typed value.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SettingsView {
    Map(Map<String, Value>),
    Single { key: String, value: Value },
}

#[derive(Debug, Deserialize)]
pub struct BulkRequest {
    pub settings: Vec<Value>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct BulkFailure {
    pub key: Option<String>,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct BulkResult {
    pub successful: usize,
    pub failed: usize,
    pub total: usize,
    pub errors: Vec<BulkFailure>,
}

#[derive(Debug, Serialize)]
pub struct SettingResponse {
    pub setting: SystemSetting,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: String,
}

/// Parse and check one bulk entry.
fn parse_entry(raw: Value) -> std::result::Result<SettingUpsert, BulkFailure> {
    let key = raw.get("key").and_then(Value::as_str).map(String::from);
    let upsert: SettingUpsert = serde_json::from_value(raw).map_err(|e| BulkFailure {
        key: key.clone(),
        error: format!("Invalid setting: {e}"),
    })?;
    if upsert.key.trim().is_empty() {
        return Err(BulkFailure {
            key,
            error: "Setting key is required".to_string(),
        });
    }
    Ok(upsert)
}

/// Active settings as a flat map, or one typed value with `?key=`.
///
/// GET /api/system-settings
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    _auth: RequireAuth,
    ApiQuery(query): ApiQuery<SettingsQuery>,
) -> Result<Json<SettingsView>> {
    let snapshot = state.settings().get_all().await?;

    if let Some(key) = non_blank(query.key) {
        let value = snapshot.typed(&key, query.setting_type.unwrap_or_default());
        return Ok(Json(SettingsView::Single { key, value }));
    }
    Ok(Json(SettingsView::Map(snapshot.to_map(query.category))))
}

/// Create or overwrite one setting.
///
/// POST /api/system-settings
#[instrument(skip_all, fields(admin = %admin.0.id))]
pub async fn upsert(
    State(state): State<AppState>,
    admin: RequireAdmin,
    ApiJson(req): ApiJson<SettingUpsert>,
) -> Result<Json<SettingResponse>> {
    if req.key.trim().is_empty() {
        return Err(AppError::invalid_field("key", "Setting key is required"));
    }

    let setting = SettingsRepository::new(state.pool()).upsert(&req).await?;
    state.settings().invalidate().await;
    tracing::info!(key = %setting.setting_key, "Setting saved");
    Ok(Json(SettingResponse { setting }))
}

/// Upsert many settings, reporting per-entry failures.
///
/// PUT /api/system-settings
#[instrument(skip_all, fields(admin = %admin.0.id))]
pub async fn bulk_upsert(
    State(state): State<AppState>,
    admin: RequireAdmin,
    ApiJson(req): ApiJson<BulkRequest>,
) -> Result<Json<BulkResult>> {
    let repo = SettingsRepository::new(state.pool());
    let total = req.settings.len();
    let mut errors = Vec::new();

    for raw in req.settings {
        let upsert = match parse_entry(raw) {
            Ok(upsert) => upsert,
            Err(failure) => {
                errors.push(failure);
                continue;
            }
        };
        if let Err(e) = repo.upsert(&upsert).await {
            tracing::warn!(key = %upsert.key, error = %e, "Bulk setting upsert failed");
            errors.push(BulkFailure {
                key: Some(upsert.key),
                error: "Failed to save setting".to_string(),
            });
        }
    }

    state.settings().invalidate().await;
    let failed = errors.len();
    Ok(Json(BulkResult {
        successful: total - failed,
        failed,
        total,
        errors,
    }))
}

/// Soft-delete a setting.
///
/// DELETE /api/system-settings/{key}
#[instrument(skip_all, fields(admin = %admin.0.id, key = %key))]
pub async fn remove(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(key): Path<String>,
) -> Result<Json<SuccessResponse>> {
    SettingsRepository::new(state.pool())
        .deactivate(&key)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound("Setting not found".to_string()),
            other => other.into(),
        })?;
    state.settings().invalidate().await;

    Ok(Json(SuccessResponse {
        success: true,
        message: format!("Setting {key} deleted"),
    }))
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub success: bool,
    pub count: usize,
}

/// Reload the cache from the database.
///
/// POST /api/system-settings/refresh
#[instrument(skip_all, fields(admin = %admin.0.id))]
pub async fn refresh(
    State(state): State<AppState>,
    admin: RequireAdmin,
) -> Result<Json<RefreshResponse>> {
    let snapshot = state.settings().refresh().await?;
    Ok(Json(RefreshResponse {
        success: true,
        count: snapshot.len(),
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_entry_defaults_type_and_category() {
        let upsert = parse_entry(json!({"key": "points_per_dollar", "value": 10})).unwrap();
        assert_eq!(upsert.setting_type, SettingType::String);
        assert_eq!(upsert.category, SettingCategory::General);
    }

    #[test]
    fn test_parse_entry_reports_missing_key() {
        let failure = parse_entry(json!({"value": true})).unwrap_err();
        assert_eq!(failure.key, None);
        assert!(failure.error.starts_with("Invalid setting"));

        let failure = parse_entry(json!({"key": "  ", "value": 1})).unwrap_err();
        assert_eq!(failure.error, "Setting key is required");
    }

    #[test]
    fn test_single_view_shape() {
        let view = SettingsView::Single {
            key: "chat_enabled".to_string(),
            value: Value::Bool(true),
        };
        assert_eq!(
            serde_json::to_value(view).unwrap(),
            json!({"key": "chat_enabled", "value": true})
        );
    }
}
