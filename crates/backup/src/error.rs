//! Error types for the backup, scheduler, and migration services.

use thiserror::Error;
use uuid::Uuid;

use hoclieu_core::CoreError;

// ---------------------------------------------------------------------------
// BackupError
// ---------------------------------------------------------------------------

/// Errors from the backup/restore service.
///
/// Integrity failures (`BackupCorrupted`, `InvalidBackupData`) are distinct
/// from plain validation: they mean the data itself cannot be trusted, not
/// merely that it is disallowed.
#[derive(Debug, Error)]
pub enum BackupError {
    /// No backup row with the given id.
    #[error("Backup not found: {0}")]
    NotFound(Uuid),

    /// The backup has not reached `completed`; its payload is unusable.
    #[error("Backup is not complete (status: {status})")]
    BackupIncomplete { status: String },

    /// The stored or supplied payload failed its integrity check.
    #[error("Backup payload is corrupted: {0}")]
    BackupCorrupted(String),

    /// The supplied payload is structurally malformed.
    #[error("Invalid backup data: {}", issues.join("; "))]
    InvalidBackupData { issues: Vec<String> },

    /// Backup creation failed; the record was marked `failed`.
    #[error("Backup creation failed: {reason}")]
    BackupFailed { reason: String },

    /// Underlying storage failure.
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// Payload serialization failure.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] CoreError),
}

// ---------------------------------------------------------------------------
// SchedulerError
// ---------------------------------------------------------------------------

/// Errors from scheduler control operations (`start`/`update_config`).
///
/// Scheduled *runs* never surface here; they are reported through
/// [`crate::scheduler::ScheduledRunResult`] so one failed run cannot stop
/// the timer.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Scheduler is already running")]
    AlreadyRunning,

    #[error("Schedule is disabled; enable it before starting")]
    Disabled,

    #[error(transparent)]
    InvalidConfig(#[from] CoreError),

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// MigrationError
// ---------------------------------------------------------------------------

/// A validation failure for one catalog item, keyed by collection and id.
#[derive(Debug, Clone)]
pub struct ItemValidationError {
    pub collection: &'static str,
    pub id: String,
    pub messages: Vec<String>,
}

/// Errors from the migration runner.
///
/// Validation runs over the whole catalog before any write; a failure here
/// means nothing was changed. Per-item execution failures do not produce
/// this error; they are collected in the migration report instead.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Catalog validation failed for {} item(s)", errors.len())]
    Validation { errors: Vec<ItemValidationError> },

    #[error("Pre-migration snapshot failed: {0}")]
    Snapshot(#[source] Box<BackupError>),

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),
}
