//! AI tool entity models and DTOs.
//!
//! AI tools are catalog-owned content: their primary key is a stable text
//! slug assigned by the seed catalog, so the same id survives export,
//! import, and migration across environments.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use hoclieu_core::types::Timestamp;

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// An AI teaching tool row. Serialized camelCase: rows appear verbatim
/// inside backup payloads, which are an external contract.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AiTool {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub url: String,
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

/// DTO for inserting or importing an AI tool.
///
/// Also the shape of seed-catalog entries and of payload items on restore
/// (unknown payload fields such as timestamps are ignored by serde).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpsertAiTool {
    #[validate(length(min = 1, max = 64))]
    pub id: String,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub description: String,
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    #[validate(url)]
    pub url: String,
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
pub struct UpdateAiTool {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub url: Option<String>,
    pub subjects: Option<Vec<String>>,
    pub grade_levels: Option<Vec<String>>,
    pub features: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

// ---------------------------------------------------------------------------
// Bulk change
// ---------------------------------------------------------------------------

/// A single bulk-editable field change.
///
/// Bulk updates carry a tagged change instead of an untyped field map, so
/// only these fields can legally be bulk-edited.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum AiToolBulkChange {
    IsActive(bool),
    Category(String),
}

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

/// Filter parameters for listing AI tools.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiToolQuery {
    pub category: Option<String>,
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

/// Per-category row count.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
}

/// Aggregate statistics over the AI tool collection.
#[derive(Debug, Clone, Serialize)]
pub struct AiToolStats {
    pub total: i64,
    pub active: i64,
    pub by_category: Vec<CategoryCount>,
}
