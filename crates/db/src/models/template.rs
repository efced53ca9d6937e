//! Lesson template entity models and DTOs.
//!
//! Like AI tools, templates carry stable catalog-assigned text ids so the
//! same record can be matched across export, import, and migration.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use hoclieu_core::types::Timestamp;

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A lesson template row. Serialized camelCase for backup payloads.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub name: String,
    pub description: String,
    pub file_url: String,
    pub subjects: Vec<String>,
    pub grade_levels: Vec<String>,
    pub features: Vec<String>,
    pub tags: Vec<String>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Upsert DTO
// ---------------------------------------------------------------------------

/// DTO for inserting or importing a template (seed catalog / restore shape).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpsertTemplate {
    #[validate(length(min = 1, max = 64))]
    pub id: String,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub description: String,
    #[validate(url)]
    pub file_url: String,
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub grade_levels: Vec<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Update DTO
// ---------------------------------------------------------------------------

/// DTO for partial updates. Only non-`None` fields are applied.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTemplate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub file_url: Option<String>,
    pub subjects: Option<Vec<String>>,
    pub grade_levels: Option<Vec<String>>,
    pub features: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

// ---------------------------------------------------------------------------
// Bulk change
// ---------------------------------------------------------------------------

/// A single bulk-editable field change for templates.
///
/// Tagged change instead of an untyped field map, so only these fields can
/// legally be bulk-edited.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum TemplateBulkChange {
    IsActive(bool),
    AddTag(String),
}

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

/// Filter parameters for listing templates.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateQuery {
    pub subject: Option<String>,
    pub grade_level: Option<String>,
    pub is_active: Option<bool>,
    /// Case-insensitive substring match on name.
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

// ---------------------------------------------------------------------------
// Aggregates
// ---------------------------------------------------------------------------

/// Per-subject row count.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SubjectCount {
    pub subject: String,
    pub count: i64,
}

/// Aggregate statistics over the template collection.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateStats {
    pub total: i64,
    pub active: i64,
    pub by_subject: Vec<SubjectCount>,
}
