//! Best-effort audit trail writer.
//!
//! Audit writes must never make an otherwise-successful operation fail:
//! failures are logged via tracing and swallowed. The redaction pass runs
//! here so no caller can forget it.

use sqlx::PgPool;
use tracing::warn;

use hoclieu_core::audit::redact_sensitive_fields;
use hoclieu_db::models::audit::CreateAuditLog;
use hoclieu_db::repositories::AuditLogRepo;

/// Records admin actions into the append-only audit trail.
#[derive(Debug, Clone)]
pub struct AuditLogger {
    pool: PgPool,
}

impl AuditLogger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record one audit entry. Sensitive detail fields are redacted before
    /// storage; insert failures are logged and dropped.
    pub async fn log(
        &self,
        user_id: &str,
        action: &str,
        resource: &str,
        resource_id: Option<&str>,
        details: Option<serde_json::Value>,
    ) {
        let entry = CreateAuditLog {
            user_id: user_id.to_string(),
            action: action.to_string(),
            resource: resource.to_string(),
            resource_id: resource_id.map(str::to_string),
            details: details.map(|d| redact_sensitive_fields(&d)),
            ip_address: None,
            user_agent: None,
        };

        if let Err(err) = AuditLogRepo::insert(&self.pool, &entry).await {
            warn!(
                action = entry.action,
                resource = entry.resource,
                error = %err,
                "failed to write audit log entry"
            );
        }
    }
}
