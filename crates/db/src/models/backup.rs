//! Backup record models and DTOs.
//!
//! A backup row is written in two steps: inserted with status `creating`,
//! then completed (payload columns set together in one UPDATE) or failed.
//! The serialized payload column is deliberately excluded from the summary
//! struct; callers fetch it through a dedicated accessor.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use hoclieu_core::types::Timestamp;

// ---------------------------------------------------------------------------
// Entity (summary -- payload column excluded)
// ---------------------------------------------------------------------------

/// Backup record metadata. Never carries the serialized payload.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_by: String,
    pub backup_type: String,
    pub status: String,
    pub ai_tools_count: i32,
    pub templates_count: i32,
    pub size_bytes: i64,
    pub checksum: Option<String>,
    pub created_at: Timestamp,
}

/// Status plus raw payload text, for verification and restore.
#[derive(Debug, Clone, FromRow)]
pub struct BackupPayloadRow {
    pub status: String,
    pub data: Option<String>,
}

// ---------------------------------------------------------------------------
// Create DTO
// ---------------------------------------------------------------------------

/// DTO for inserting a new backup attempt (status starts at `creating`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBackup {
    pub name: String,
    pub description: Option<String>,
    pub created_by: String,
    pub backup_type: String,
}

// ---------------------------------------------------------------------------
// Completion payload
// ---------------------------------------------------------------------------

/// Everything set atomically when a backup transitions to `completed`.
#[derive(Debug, Clone)]
pub struct CompleteBackup {
    pub ai_tools_count: i32,
    pub templates_count: i32,
    pub size_bytes: i64,
    pub checksum: String,
    pub data: String,
}

// ---------------------------------------------------------------------------
// Aggregates
// ---------------------------------------------------------------------------

/// Aggregate statistics over stored backups, for display.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupStats {
    pub total: i64,
    pub completed: i64,
    pub failed: i64,
    pub automatic: i64,
    pub manual: i64,
    pub total_size_bytes: i64,
    pub last_automatic_at: Option<Timestamp>,
}
