//! Audit logging constants and utility functions.
//!
//! This module lives in `core` (zero internal deps) so it can be used by
//! both the repository layer and the CLI tooling.

// ---------------------------------------------------------------------------
// Action type constants
// ---------------------------------------------------------------------------

/// Known action types for audit log entries.
pub mod action_types {
    pub const EXPORT_DATA: &str = "export_data";
    pub const BACKUP_DATA: &str = "backup_data";
    pub const RESTORE_DATA: &str = "restore_data";
    pub const BACKUP_DELETE: &str = "backup_delete";
    pub const CONFIG_CHANGE: &str = "config_change";
    pub const MIGRATION_RUN: &str = "migration_run";
    pub const MIGRATION_ROLLBACK: &str = "migration_rollback";
    pub const ENTITY_CREATE: &str = "entity_create";
    pub const ENTITY_UPDATE: &str = "entity_update";
    pub const ENTITY_DELETE: &str = "entity_delete";
    pub const BULK_UPDATE: &str = "bulk_update";
    pub const BULK_DELETE: &str = "bulk_delete";
}

// ---------------------------------------------------------------------------
// Resource constants
// ---------------------------------------------------------------------------

/// Known resource names for audit log entries.
pub mod resources {
    pub const AI_TOOLS: &str = "ai_tools";
    pub const TEMPLATES: &str = "templates";
    pub const BACKUPS: &str = "backups";
    pub const SETTINGS: &str = "settings";
}

// ---------------------------------------------------------------------------
// Sensitive field redaction
// ---------------------------------------------------------------------------

/// Fields that should be redacted from audit log details before storage.
pub const SENSITIVE_FIELDS: &[&str] = &[
    "password",
    "token",
    "secret",
    "api_key",
    "authorization",
    "credential",
];

/// Redact sensitive fields from a JSON value.
///
/// Replaces the value of any key matching [`SENSITIVE_FIELDS`] with
/// `"[REDACTED]"`, recursing into nested objects and arrays.
pub fn redact_sensitive_fields(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut redacted = serde_json::Map::new();
            for (key, val) in map {
                let lower_key = key.to_lowercase();
                if SENSITIVE_FIELDS.iter().any(|f| lower_key.contains(f)) {
                    redacted.insert(
                        key.clone(),
                        serde_json::Value::String("[REDACTED]".to_string()),
                    );
                } else {
                    redacted.insert(key.clone(), redact_sensitive_fields(val));
                }
            }
            serde_json::Value::Object(redacted)
        }
        serde_json::Value::Array(arr) => {
            serde_json::Value::Array(arr.iter().map(redact_sensitive_fields).collect())
        }
        other => other.clone(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
