//! Repository for the `admin_settings` key/value table.

use sqlx::PgPool;

use crate::models::setting::AdminSetting;

const COLUMNS: &str = "key, value, updated_at";

/// Provides get/upsert access to JSON-valued admin settings.
pub struct SettingRepo;

impl SettingRepo {
    /// Fetch a setting by key.
    pub async fn get(pool: &PgPool, key: &str) -> Result<Option<AdminSetting>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM admin_settings WHERE key = $1");
        sqlx::query_as::<_, AdminSetting>(&query)
            .bind(key)
            .fetch_optional(pool)
            .await
    }

    /// Insert or replace a setting wholesale. Last write wins.
    pub async fn upsert(
        pool: &PgPool,
        key: &str,
        value: &serde_json::Value,
    ) -> Result<AdminSetting, sqlx::Error> {
        let query = format!(
            "INSERT INTO admin_settings (key, value) VALUES ($1, $2) \
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AdminSetting>(&query)
            .bind(key)
            .bind(value)
            .fetch_one(pool)
            .await
    }
}
