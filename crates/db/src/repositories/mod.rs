//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod ai_tool_repo;
pub mod audit_repo;
pub mod backup_repo;
pub mod setting_repo;
pub mod template_repo;

pub use ai_tool_repo::AiToolRepo;
pub use audit_repo::AuditLogRepo;
pub use backup_repo::BackupRepo;
pub use setting_repo::SettingRepo;
pub use template_repo::TemplateRepo;

/// Timeout applied to bulk update/delete statements.
///
/// A bounded wait, not a cancellation signal: the statement may still
/// complete server-side; the caller just stops waiting and sees a storage
/// error.
pub(crate) const BULK_WRITE_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Run a bulk write future under [`BULK_WRITE_TIMEOUT`].
pub(crate) async fn with_bulk_timeout<T>(
    fut: impl std::future::Future<Output = Result<T, sqlx::Error>>,
) -> Result<T, sqlx::Error> {
    match tokio::time::timeout(BULK_WRITE_TIMEOUT, fut).await {
        Ok(result) => result,
        Err(_) => Err(sqlx::Error::Protocol(
            "bulk operation timed out".to_string(),
        )),
    }
}
