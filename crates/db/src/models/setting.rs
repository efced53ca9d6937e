//! Generic key/value admin settings row.
//!
//! Holds JSON-serialized configuration objects such as the backup schedule
//! (key `backup_schedule`). Values are replaced wholesale on update;
//! concurrent writers are last-write-wins with no version check.

use serde::Serialize;
use sqlx::FromRow;

use hoclieu_core::types::Timestamp;

/// A single admin setting row.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSetting {
    pub key: String,
    pub value: serde_json::Value,
    pub updated_at: Timestamp,
}
