//! Backup payload envelope, lifecycle enums, and payload validation.
//!
//! The serialized payload is the external contract of the backup system:
//! a camelCase JSON document carrying its own metadata and a self-checksum
//! over the entity collections. Both creation and restore verify that
//! contract through the helpers here.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::digest::integrity_digest;
use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Payload format version embedded in every export.
pub const PAYLOAD_VERSION: &str = "1.0";

/// Settings store key holding the persisted schedule configuration.
pub const SCHEDULE_SETTING_KEY: &str = "backup_schedule";

// ---------------------------------------------------------------------------
// Lifecycle enums
// ---------------------------------------------------------------------------

/// Lifecycle state of a backup record.
///
/// `Creating -> Completed` on success, `Creating -> Failed` on any error
/// during payload assembly. Both `Completed` and `Failed` are terminal; a
/// failed backup is never retried in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackupStatus {
    Creating,
    Completed,
    Failed,
}

impl BackupStatus {
    /// Return the status name as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Creating => "creating",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Parse a status string, returning an error for unknown values.
    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "creating" => Ok(Self::Creating),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(CoreError::Parse(format!("Unknown backup status: '{other}'"))),
        }
    }
}

impl std::fmt::Display for BackupStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Origin of a backup: user-triggered or scheduler-triggered.
///
/// Only automatic backups are subject to the scheduler's retention cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackupType {
    Manual,
    Automatic,
}

impl BackupType {
    /// Return the type name as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Automatic => "automatic",
        }
    }

    /// Parse a type string, returning an error for unknown values.
    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "manual" => Ok(Self::Manual),
            "automatic" => Ok(Self::Automatic),
            other => Err(CoreError::Parse(format!("Unknown backup type: '{other}'"))),
        }
    }
}

impl std::fmt::Display for BackupType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Payload envelope
// ---------------------------------------------------------------------------

/// Metadata block embedded in every serialized payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadMetadata {
    /// Payload format version ([`PAYLOAD_VERSION`] at write time).
    pub version: String,
    /// UTC timestamp of the export.
    pub export_date: Timestamp,
    /// Identifier of the actor who triggered the export.
    pub exported_by: String,
    /// Free-text description, if any.
    pub description: Option<String>,
    /// Integrity digest over the entity collections alone (not metadata).
    pub checksum: String,
}

/// The full serialized snapshot: metadata plus both entity collections.
///
/// Entities are kept as raw JSON objects rather than typed structs so the
/// payload survives additive schema changes; the import path deserializes
/// each item individually and records per-item failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupPayload {
    pub metadata: PayloadMetadata,
    pub ai_tools: Vec<Value>,
    pub templates: Vec<Value>,
}

impl BackupPayload {
    /// Entity counts as `(ai_tools, templates)`.
    pub fn counts(&self) -> (usize, usize) {
        (self.ai_tools.len(), self.templates.len())
    }

    /// Recompute the self-checksum and compare against `metadata.checksum`.
    pub fn checksum_matches(&self) -> bool {
        payload_digest(&self.ai_tools, &self.templates) == self.metadata.checksum
    }
}

// ---------------------------------------------------------------------------
// Digest over entity collections
// ---------------------------------------------------------------------------

/// Compute the integrity digest over the entity collections.
///
/// Canonicalizes as compact JSON of `{"aiTools": ..., "templates": ...}`.
/// serde_json's default map keeps keys sorted, so the same collections
/// always produce the same string regardless of construction order.
pub fn payload_digest(ai_tools: &[Value], templates: &[Value]) -> String {
    let canonical = serde_json::json!({
        "aiTools": ai_tools,
        "templates": templates,
    });
    // Serializing a Value cannot fail.
    integrity_digest(&canonical.to_string())
}

// ---------------------------------------------------------------------------
// Structural validation
// ---------------------------------------------------------------------------

/// Validate the metadata envelope of a payload, collecting every issue.
///
/// A broken envelope means the payload as a whole cannot be trusted;
/// per-item problems are tolerable (restore records them item by item)
/// and are checked separately.
pub fn validate_metadata_shape(payload: &BackupPayload) -> Vec<String> {
    let mut issues = Vec::new();

    if payload.metadata.version.is_empty() {
        issues.push("metadata.version is empty".to_string());
    }
    if payload.metadata.exported_by.is_empty() {
        issues.push("metadata.exportedBy is empty".to_string());
    }
    if payload.metadata.checksum.is_empty() {
        issues.push("metadata.checksum is empty".to_string());
    }

    issues
}

/// Validate the full structural shape of a payload, collecting every issue.
///
/// Returns an empty list when the payload is well-formed. Checksum
/// verification is separate (see [`BackupPayload::checksum_matches`]);
/// restore and verify report the two independently.
pub fn validate_payload_shape(payload: &BackupPayload) -> Vec<String> {
    let mut issues = validate_metadata_shape(payload);

    for (idx, item) in payload.ai_tools.iter().enumerate() {
        check_entity_shape(item, "aiTools", idx, &mut issues);
    }
    for (idx, item) in payload.templates.iter().enumerate() {
        check_entity_shape(item, "templates", idx, &mut issues);
    }

    issues
}

/// An entity item must be a JSON object with non-empty string `id` and `name`.
fn check_entity_shape(item: &Value, collection: &str, idx: usize, issues: &mut Vec<String>) {
    let Some(obj) = item.as_object() else {
        issues.push(format!("{collection}[{idx}] is not an object"));
        return;
    };
    match obj.get("id").and_then(Value::as_str) {
        Some(id) if !id.is_empty() => {}
        _ => issues.push(format!("{collection}[{idx}] is missing a string id")),
    }
    match obj.get("name").and_then(Value::as_str) {
        Some(name) if !name.is_empty() => {}
        _ => issues.push(format!("{collection}[{idx}] is missing a string name")),
    }
}

/// Extract the `id` field of a payload entity, if present and non-empty.
pub fn entity_id(item: &Value) -> Option<&str> {
    item.get("id").and_then(Value::as_str).filter(|s| !s.is_empty())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn tool(id: &str, name: &str) -> Value {
        serde_json::json!({ "id": id, "name": name, "category": "math" })
    }

    fn payload_with(ai_tools: Vec<Value>, templates: Vec<Value>) -> BackupPayload {
        let checksum = payload_digest(&ai_tools, &templates);
        BackupPayload {
            metadata: PayloadMetadata {
                version: PAYLOAD_VERSION.to_string(),
                export_date: chrono::Utc::now(),
                exported_by: "admin".to_string(),
                description: None,
                checksum,
            },
            ai_tools,
            templates,
        }
    }

    // -- Status / type enums --------------------------------------------------

    #[test]
    fn status_round_trip() {
        for s in ["creating", "completed", "failed"] {
            assert_eq!(BackupStatus::from_str(s).unwrap().as_str(), s);
        }
    }

    #[test]
    fn unknown_status_rejected() {
        assert!(BackupStatus::from_str("pending").is_err());
        assert!(BackupStatus::from_str("").is_err());
    }

    #[test]
    fn type_round_trip() {
        for s in ["manual", "automatic"] {
            assert_eq!(BackupType::from_str(s).unwrap().as_str(), s);
        }
    }

    #[test]
    fn unknown_type_rejected() {
        assert!(BackupType::from_str("scheduled").is_err());
    }

    // -- Digest ---------------------------------------------------------------

    #[test]
    fn digest_stable_across_serialization() {
        let payload = payload_with(vec![tool("t-1", "GeoGebra")], vec![]);
        let text = serde_json::to_string_pretty(&payload).unwrap();
        let parsed: BackupPayload = serde_json::from_str(&text).unwrap();
        assert!(parsed.checksum_matches());
    }

    #[test]
    fn digest_sensitive_to_entity_change() {
        let a = payload_digest(&[tool("t-1", "GeoGebra")], &[]);
        let b = payload_digest(&[tool("t-1", "Geogebra")], &[]);
        assert_ne!(a, b);
    }

    #[test]
    fn digest_ignores_metadata() {
        let mut payload = payload_with(vec![tool("t-1", "GeoGebra")], vec![]);
        payload.metadata.description = Some("renamed".to_string());
        payload.metadata.exported_by = "someone-else".to_string();
        assert!(payload.checksum_matches());
    }

    // -- Shape validation -----------------------------------------------------

    #[test]
    fn well_formed_payload_has_no_issues() {
        let payload = payload_with(
            vec![tool("t-1", "GeoGebra")],
            vec![tool("tpl-1", "Giáo án Toán lớp 3")],
        );
        assert!(validate_payload_shape(&payload).is_empty());
    }

    #[test]
    fn missing_id_reported() {
        let payload = payload_with(vec![serde_json::json!({ "name": "no id" })], vec![]);
        let issues = validate_payload_shape(&payload);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("aiTools[0]"));
        assert!(issues[0].contains("id"));
    }

    #[test]
    fn non_object_entity_reported() {
        let payload = payload_with(vec![], vec![serde_json::json!("just a string")]);
        let issues = validate_payload_shape(&payload);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("templates[0]"));
    }

    #[test]
    fn empty_metadata_fields_reported() {
        let mut payload = payload_with(vec![], vec![]);
        payload.metadata.version = String::new();
        payload.metadata.exported_by = String::new();
        let issues = validate_payload_shape(&payload);
        assert_eq!(issues.len(), 2);
    }

    #[test]
    fn metadata_check_ignores_item_problems() {
        // Envelope validation alone must not flag bad items; those are
        // handled per item during restore.
        let payload = payload_with(vec![serde_json::json!({ "name": "no id" })], vec![]);
        assert!(validate_metadata_shape(&payload).is_empty());
        assert_eq!(validate_payload_shape(&payload).len(), 1);
    }

    #[test]
    fn entity_id_extraction() {
        assert_eq!(entity_id(&tool("t-9", "x")), Some("t-9"));
        assert_eq!(entity_id(&serde_json::json!({ "id": "" })), None);
        assert_eq!(entity_id(&serde_json::json!({ "name": "x" })), None);
    }

    #[test]
    fn payload_serializes_camel_case() {
        let payload = payload_with(vec![], vec![]);
        let text = serde_json::to_string(&payload).unwrap();
        assert!(text.contains("\"aiTools\""));
        assert!(text.contains("\"exportDate\""));
        assert!(!text.contains("ai_tools"));
    }
}
