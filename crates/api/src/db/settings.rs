//! System settings queries.

use sqlx::PgPool;

use loyalty_core::SettingCategory;

use super::RepositoryError;
use crate::models::setting::{SettingUpsert, SystemSetting};

const SETTING_SELECT: &str = r"
    SELECT setting_key, setting_value, setting_type, description, category, updated_at
    FROM system_settings";

/// Repository for the `system_settings` key-value table.
pub struct SettingsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SettingsRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All active settings, optionally limited to one category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active(
        &self,
        category: Option<SettingCategory>,
    ) -> Result<Vec<SystemSetting>, RepositoryError> {
        let sql = format!(
            "{SETTING_SELECT} WHERE is_active AND ($1::TEXT IS NULL OR category = $1) \
             ORDER BY category, setting_key"
        );
        let rows = sqlx::query_as::<_, SystemSetting>(&sql)
            .bind(category)
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    /// Get one active setting by key.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, key: &str) -> Result<Option<SystemSetting>, RepositoryError> {
        let sql = format!("{SETTING_SELECT} WHERE setting_key = $1 AND is_active");
        let row = sqlx::query_as::<_, SystemSetting>(&sql)
            .bind(key)
            .fetch_optional(self.pool)
            .await?;
        Ok(row)
    }

    /// Create a setting or overwrite an existing one, reactivating it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn upsert(&self, setting: &SettingUpsert) -> Result<SystemSetting, RepositoryError> {
        let row = sqlx::query_as::<_, SystemSetting>(
            r"
            INSERT INTO system_settings
                (setting_key, setting_value, setting_type, description, category)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (setting_key) DO UPDATE
            SET setting_value = EXCLUDED.setting_value,
                setting_type = EXCLUDED.setting_type,
                description = EXCLUDED.description,
                category = EXCLUDED.category,
                is_active = TRUE,
                updated_at = NOW()
            RETURNING setting_key, setting_value, setting_type, description, category, updated_at
            ",
        )
        .bind(setting.key.trim())
        .bind(setting.stored_value())
        .bind(setting.setting_type)
        .bind(setting.description_or_default())
        .bind(setting.category)
        .fetch_one(self.pool)
        .await?;
        Ok(row)
    }

    /// Soft-delete a setting.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no active setting has the key.
    pub async fn deactivate(&self, key: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE system_settings
            SET is_active = FALSE, updated_at = NOW()
            WHERE setting_key = $1 AND is_active
            ",
        )
        .bind(key)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
