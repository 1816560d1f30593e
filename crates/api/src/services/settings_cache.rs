//! Process-local snapshot of active system settings.
//!
//! The whole table is loaded as one entry and replaced wholesale, either
//! when the 5-minute TTL lapses or when a write invalidates it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde_json::{Map, Value};
use sqlx::PgPool;
use tracing::{debug, instrument};

use loyalty_core::{SettingCategory, SettingType};

use crate::db::{RepositoryError, SettingsRepository};
use crate::models::setting::{SystemSetting, convert};

const SNAPSHOT_KEY: &str = "system_settings";
const SNAPSHOT_TTL: Duration = Duration::from_secs(300);

/// Active settings keyed by `setting_key`.
#[derive(Debug, Clone, Default)]
pub struct SettingsSnapshot {
    entries: HashMap<String, SystemSetting>,
}

impl SettingsSnapshot {
    #[must_use]
    pub fn from_rows(rows: Vec<SystemSetting>) -> Self {
        Self {
            entries: rows
                .into_iter()
                .map(|row| (row.setting_key.clone(), row))
                .collect(),
        }
    }

    /// Raw stored text for `key`.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|s| s.setting_value.as_str())
    }

    /// Value for `key` converted to `setting_type`, or that type's default.
    #[must_use]
    pub fn typed(&self, key: &str, setting_type: SettingType) -> Value {
        convert(self.raw(key), setting_type)
    }

    /// Non-empty string value for `key`.
    #[must_use]
    pub fn non_empty(&self, key: &str) -> Option<&str> {
        self.raw(key).map(str::trim).filter(|v| !v.is_empty())
    }

    /// Flat `{key: value}` map, each value converted by its own type.
    #[must_use]
    pub fn to_map(&self, category: Option<SettingCategory>) -> Map<String, Value> {
        let mut keys: Vec<&SystemSetting> = self
            .entries
            .values()
            .filter(|s| category.is_none_or(|c| s.category == c))
            .collect();
        keys.sort_by(|a, b| a.setting_key.cmp(&b.setting_key));
        keys.into_iter()
            .map(|s| (s.setting_key.clone(), s.typed_value()))
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Cached view of the `system_settings` table.
#[derive(Clone)]
pub struct SettingsCache {
    pool: PgPool,
    cache: Cache<&'static str, Arc<SettingsSnapshot>>,
}

impl SettingsCache {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        let cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(SNAPSHOT_TTL)
            .build();
        Self { pool, cache }
    }

    /// The current snapshot, loading it if absent or expired.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if loading fails.
    pub async fn get_all(&self) -> Result<Arc<SettingsSnapshot>, RepositoryError> {
        if let Some(snapshot) = self.cache.get(SNAPSHOT_KEY).await {
            debug!("Cache hit for system settings");
            return Ok(snapshot);
        }
        self.refresh().await
    }

    /// Reload every active setting and replace the snapshot.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if loading fails.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<Arc<SettingsSnapshot>, RepositoryError> {
        let rows = SettingsRepository::new(&self.pool).list_active(None).await?;
        let snapshot = Arc::new(SettingsSnapshot::from_rows(rows));
        debug!(count = snapshot.len(), "Loaded system settings");

        self.cache.insert(SNAPSHOT_KEY, Arc::clone(&snapshot)).await;
        Ok(snapshot)
    }

    /// Value for `key` converted to `setting_type`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the snapshot has to be loaded and fails.
    pub async fn get_typed(
        &self,
        key: &str,
        setting_type: SettingType,
    ) -> Result<Value, RepositoryError> {
        Ok(self.get_all().await?.typed(key, setting_type))
    }

    /// Drop the snapshot so the next read reloads it.
    pub async fn invalidate(&self) {
        self.cache.invalidate(SNAPSHOT_KEY).await;
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use super::*;

    fn setting(key: &str, value: &str, setting_type: SettingType, category: SettingCategory) -> SystemSetting {
        SystemSetting {
            setting_key: key.to_string(),
            setting_value: value.to_string(),
            setting_type,
            description: None,
            category,
            updated_at: Utc::now(),
        }
    }

    fn snapshot() -> SettingsSnapshot {
        SettingsSnapshot::from_rows(vec![
            setting("company_name", "Loyalty Rewards", SettingType::String, SettingCategory::General),
            setting("points_per_dollar", "2", SettingType::Number, SettingCategory::Loyalty),
            setting("loyalty_enabled", "true", SettingType::Boolean, SettingCategory::Loyalty),
            setting("integration_endpoint", "  ", SettingType::String, SettingCategory::Integration),
        ])
    }

    #[test]
    fn test_typed_lookup_with_defaults() {
        let snapshot = snapshot();
        assert_eq!(snapshot.typed("points_per_dollar", SettingType::Number), json!(2));
        assert_eq!(snapshot.typed("loyalty_enabled", SettingType::Boolean), json!(true));
        assert_eq!(snapshot.typed("missing", SettingType::Number), json!(0));
        assert_eq!(snapshot.typed("missing", SettingType::String), json!(""));
    }

    #[test]
    fn test_non_empty_skips_blank_values() {
        let snapshot = snapshot();
        assert_eq!(snapshot.non_empty("company_name"), Some("Loyalty Rewards"));
        assert_eq!(snapshot.non_empty("integration_endpoint"), None);
    }

    #[test]
    fn test_flat_map_by_category() {
        let snapshot = snapshot();
        let all = snapshot.to_map(None);
        assert_eq!(all.len(), 4);
        assert_eq!(all.get("points_per_dollar"), Some(&json!(2)));

        let loyalty = snapshot.to_map(Some(SettingCategory::Loyalty));
        let keys: Vec<&String> = loyalty.keys().collect();
        assert_eq!(keys, ["loyalty_enabled", "points_per_dollar"]);
    }
}
