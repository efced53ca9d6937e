//! Backup, export, restore, and verification service.
//!
//! All snapshot and restore flows go through [`BackupService`]. Export is
//! side-effect-free apart from its audit entry; backup creation follows the
//! two-step row lifecycle (insert `creating`, then complete or fail);
//! restore validates shape and checksum before touching any entity row.

use serde_json::json;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use hoclieu_core::audit::{action_types, resources};
use hoclieu_core::backup::{
    entity_id, payload_digest, validate_metadata_shape, validate_payload_shape, BackupPayload,
    BackupType, PayloadMetadata, PAYLOAD_VERSION,
};
use hoclieu_core::sanitize::{sanitize_text, strip_html};
use hoclieu_db::models::ai_tool::UpsertAiTool;
use hoclieu_db::models::backup::{Backup, BackupStats, CompleteBackup, CreateBackup};
use hoclieu_db::models::template::UpsertTemplate;
use hoclieu_db::repositories::{AiToolRepo, BackupRepo, TemplateRepo};

use crate::audit::AuditLogger;
use crate::error::BackupError;

// ---------------------------------------------------------------------------
// Options and reports
// ---------------------------------------------------------------------------

/// What an export includes. Filters narrow their own collection only:
/// `category` applies to AI tools, `subject`/`grade_level` to templates.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub include_ai_tools: bool,
    pub include_templates: bool,
    pub category: Option<String>,
    pub subject: Option<String>,
    pub grade_level: Option<String>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            include_ai_tools: true,
            include_templates: true,
            category: None,
            subject: None,
            grade_level: None,
        }
    }
}

/// Conflict policy and safety switches for a restore.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Replace entities whose id already exists. When `false`, existing
    /// ids are counted as skipped and left untouched.
    pub overwrite: bool,
    /// Verify the payload envelope and self-checksum before any write.
    pub validate_data: bool,
    /// Compute the full report without performing any entity write.
    pub dry_run: bool,
    /// Take a snapshot of current data before the first write.
    pub pre_import_backup: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            overwrite: false,
            validate_data: true,
            dry_run: false,
            pre_import_backup: true,
        }
    }
}

/// Per-collection outcome counters for a restore.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportCounts {
    pub created: u32,
    pub updated: u32,
    pub skipped: u32,
    pub failed: u32,
}

/// One failed payload item. The rest of the restore proceeds around it.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportItemError {
    pub collection: &'static str,
    pub id: String,
    pub message: String,
}

/// Full outcome of a restore run.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub ai_tools: ImportCounts,
    pub templates: ImportCounts,
    pub errors: Vec<ImportItemError>,
    pub dry_run: bool,
    pub pre_import_backup_id: Option<Uuid>,
}

impl ImportReport {
    /// True when every payload item was applied or deliberately skipped.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Outcome of verifying a stored backup without restoring it.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyReport {
    /// The payload's self-checksum matches its entity collections.
    pub checksum_match: bool,
    /// The payload parses and every item passes shape validation.
    pub data_integrity: bool,
    pub issues: Vec<String>,
}

impl VerifyReport {
    pub fn is_valid(&self) -> bool {
        self.checksum_match && self.data_integrity
    }
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Backup and restore operations over the content entity collections.
#[derive(Debug, Clone)]
pub struct BackupService {
    pool: PgPool,
    audit: AuditLogger,
}

impl BackupService {
    pub fn new(pool: PgPool) -> Self {
        let audit = AuditLogger::new(pool.clone());
        Self { pool, audit }
    }

    // -- Export ---------------------------------------------------------------

    /// Assemble a checksummed payload from current data. No entity rows are
    /// touched; the only side effect is the export audit entry.
    pub async fn export_data(
        &self,
        actor: &str,
        description: Option<&str>,
        options: &ExportOptions,
    ) -> Result<BackupPayload, BackupError> {
        let ai_tools = if options.include_ai_tools {
            let rows = match options.category.as_deref() {
                Some(category) => AiToolRepo::list_all_in_category(&self.pool, category).await?,
                None => AiToolRepo::list_all(&self.pool).await?,
            };
            rows.into_iter()
                .map(serde_json::to_value)
                .collect::<Result<Vec<_>, _>>()?
        } else {
            Vec::new()
        };

        let templates = if options.include_templates {
            let rows = TemplateRepo::list_all_filtered(
                &self.pool,
                options.subject.as_deref(),
                options.grade_level.as_deref(),
            )
            .await?;
            rows.into_iter()
                .map(serde_json::to_value)
                .collect::<Result<Vec<_>, _>>()?
        } else {
            Vec::new()
        };

        let checksum = payload_digest(&ai_tools, &templates);
        let payload = BackupPayload {
            metadata: PayloadMetadata {
                version: PAYLOAD_VERSION.to_string(),
                export_date: chrono::Utc::now(),
                exported_by: actor.to_string(),
                description: description.map(str::to_string),
                checksum,
            },
            ai_tools,
            templates,
        };

        let (tools, templates) = payload.counts();
        self.audit
            .log(
                actor,
                action_types::EXPORT_DATA,
                resources::BACKUPS,
                None,
                Some(json!({ "aiTools": tools, "templates": templates })),
            )
            .await;

        Ok(payload)
    }

    // -- Backup creation ------------------------------------------------------

    /// Create a stored backup: insert the record in `creating`, export the
    /// payload, then complete the record. Any failure after the insert
    /// marks the record `failed` and surfaces as `BackupFailed`.
    pub async fn create_backup(
        &self,
        name: &str,
        description: Option<&str>,
        created_by: &str,
        backup_type: BackupType,
        options: &ExportOptions,
    ) -> Result<Backup, BackupError> {
        let name = sanitize_text(name);
        let record = BackupRepo::insert_creating(
            &self.pool,
            &CreateBackup {
                name: name.clone(),
                description: description.map(str::to_string),
                created_by: created_by.to_string(),
                backup_type: backup_type.as_str().to_string(),
            },
        )
        .await?;

        match self
            .assemble_and_complete(record.id, created_by, description, options)
            .await
        {
            Ok(completed) => {
                info!(
                    backup_id = %completed.id,
                    backup_type = %backup_type,
                    ai_tools = completed.ai_tools_count,
                    templates = completed.templates_count,
                    size_bytes = completed.size_bytes,
                    "backup completed"
                );
                self.audit
                    .log(
                        created_by,
                        action_types::BACKUP_DATA,
                        resources::BACKUPS,
                        Some(&completed.id.to_string()),
                        Some(json!({
                            "name": name,
                            "backupType": backup_type.as_str(),
                            "aiTools": completed.ai_tools_count,
                            "templates": completed.templates_count,
                            "sizeBytes": completed.size_bytes,
                        })),
                    )
                    .await;
                Ok(completed)
            }
            Err(err) => {
                warn!(backup_id = %record.id, error = %err, "backup failed");
                if let Err(mark_err) = BackupRepo::mark_failed(&self.pool, record.id).await {
                    warn!(backup_id = %record.id, error = %mark_err, "could not mark backup failed");
                }
                // The audit trail records failed attempts too.
                self.audit
                    .log(
                        created_by,
                        action_types::BACKUP_DATA,
                        resources::BACKUPS,
                        Some(&record.id.to_string()),
                        Some(json!({
                            "name": name,
                            "backupType": backup_type.as_str(),
                            "status": "failed",
                            "error": err.to_string(),
                        })),
                    )
                    .await;
                Err(BackupError::BackupFailed {
                    reason: err.to_string(),
                })
            }
        }
    }

    /// Export, serialize, and flip the record to `completed` in one UPDATE.
    async fn assemble_and_complete(
        &self,
        id: Uuid,
        created_by: &str,
        description: Option<&str>,
        options: &ExportOptions,
    ) -> Result<Backup, BackupError> {
        let payload = self.export_data(created_by, description, options).await?;
        let (tools, templates) = payload.counts();
        let data = serde_json::to_string_pretty(&payload)?;

        let completed = BackupRepo::mark_completed(
            &self.pool,
            id,
            &CompleteBackup {
                ai_tools_count: tools as i32,
                templates_count: templates as i32,
                size_bytes: data.len() as i64,
                checksum: payload.metadata.checksum.clone(),
                data,
            },
        )
        .await?;

        // The row was just inserted as `creating`; None means something else
        // already moved it to a terminal state.
        completed.ok_or(BackupError::BackupFailed {
            reason: "backup record left its creating state unexpectedly".to_string(),
        })
    }

    // -- Restore --------------------------------------------------------------

    /// Restore entities from a payload under the given conflict policy.
    ///
    /// Envelope and checksum validation happen up front: a broken envelope
    /// or checksum mismatch rejects the whole payload before any write.
    /// Per-item problems, including an item missing its id, are isolated
    /// into the report and never abort the batch.
    pub async fn import_data(
        &self,
        actor: &str,
        payload: &BackupPayload,
        options: &ImportOptions,
    ) -> Result<ImportReport, BackupError> {
        if options.validate_data {
            let issues = validate_metadata_shape(payload);
            if !issues.is_empty() {
                return Err(BackupError::InvalidBackupData { issues });
            }
            if !payload.checksum_matches() {
                return Err(BackupError::BackupCorrupted(
                    "payload checksum does not match its entity collections".to_string(),
                ));
            }
        }

        // Automatic, so the scheduler's retention rules cover the snapshot.
        let pre_import_backup_id = if options.pre_import_backup && !options.dry_run {
            let snapshot = self
                .create_backup(
                    "Pre-import snapshot",
                    Some("Snapshot taken before a data restore"),
                    actor,
                    BackupType::Automatic,
                    &ExportOptions::default(),
                )
                .await?;
            Some(snapshot.id)
        } else {
            None
        };

        let mut errors = Vec::new();
        let ai_tools = self
            .import_ai_tools(&payload.ai_tools, options, &mut errors)
            .await?;
        let templates = self
            .import_templates(&payload.templates, options, &mut errors)
            .await?;

        let report = ImportReport {
            ai_tools,
            templates,
            errors,
            dry_run: options.dry_run,
            pre_import_backup_id,
        };

        self.audit
            .log(
                actor,
                action_types::RESTORE_DATA,
                resources::BACKUPS,
                pre_import_backup_id.map(|id| id.to_string()).as_deref(),
                serde_json::to_value(&report).ok(),
            )
            .await;

        Ok(report)
    }

    /// Restore directly from a stored backup record.
    pub async fn restore_backup(
        &self,
        actor: &str,
        id: Uuid,
        options: &ImportOptions,
    ) -> Result<ImportReport, BackupError> {
        let payload = self.get_backup_data(id).await?;
        self.import_data(actor, &payload, options).await
    }

    async fn import_ai_tools(
        &self,
        items: &[serde_json::Value],
        options: &ImportOptions,
        errors: &mut Vec<ImportItemError>,
    ) -> Result<ImportCounts, BackupError> {
        let mut counts = ImportCounts::default();
        let mut parsed: Vec<UpsertAiTool> = Vec::with_capacity(items.len());

        for item in items {
            let Some(id) = entity_id(item) else {
                counts.failed += 1;
                errors.push(ImportItemError {
                    collection: "aiTools",
                    id: "<missing>".to_string(),
                    message: "item has no id".to_string(),
                });
                continue;
            };
            let id = id.to_string();
            match serde_json::from_value::<UpsertAiTool>(item.clone()) {
                Ok(mut tool) => {
                    tool.name = sanitize_text(&tool.name);
                    tool.description = strip_html(&tool.description);
                    match tool.validate() {
                        Ok(()) => parsed.push(tool),
                        Err(err) => {
                            counts.failed += 1;
                            errors.push(ImportItemError {
                                collection: "aiTools",
                                id,
                                message: err.to_string(),
                            });
                        }
                    }
                }
                Err(err) => {
                    counts.failed += 1;
                    errors.push(ImportItemError {
                        collection: "aiTools",
                        id,
                        message: err.to_string(),
                    });
                }
            }
        }

        let ids: Vec<String> = parsed.iter().map(|t| t.id.clone()).collect();
        let existing = AiToolRepo::find_existing_ids(&self.pool, &ids).await?;

        for tool in parsed {
            let exists = existing.contains(&tool.id);
            if exists && !options.overwrite {
                counts.skipped += 1;
                continue;
            }
            if !options.dry_run {
                if let Err(err) = AiToolRepo::upsert(&self.pool, &tool).await {
                    counts.failed += 1;
                    errors.push(ImportItemError {
                        collection: "aiTools",
                        id: tool.id,
                        message: err.to_string(),
                    });
                    continue;
                }
            }
            if exists {
                counts.updated += 1;
            } else {
                counts.created += 1;
            }
        }

        Ok(counts)
    }

    async fn import_templates(
        &self,
        items: &[serde_json::Value],
        options: &ImportOptions,
        errors: &mut Vec<ImportItemError>,
    ) -> Result<ImportCounts, BackupError> {
        let mut counts = ImportCounts::default();
        let mut parsed: Vec<UpsertTemplate> = Vec::with_capacity(items.len());

        for item in items {
            let Some(id) = entity_id(item) else {
                counts.failed += 1;
                errors.push(ImportItemError {
                    collection: "templates",
                    id: "<missing>".to_string(),
                    message: "item has no id".to_string(),
                });
                continue;
            };
            let id = id.to_string();
            match serde_json::from_value::<UpsertTemplate>(item.clone()) {
                Ok(mut template) => {
                    template.name = sanitize_text(&template.name);
                    template.description = strip_html(&template.description);
                    match template.validate() {
                        Ok(()) => parsed.push(template),
                        Err(err) => {
                            counts.failed += 1;
                            errors.push(ImportItemError {
                                collection: "templates",
                                id,
                                message: err.to_string(),
                            });
                        }
                    }
                }
                Err(err) => {
                    counts.failed += 1;
                    errors.push(ImportItemError {
                        collection: "templates",
                        id,
                        message: err.to_string(),
                    });
                }
            }
        }

        let ids: Vec<String> = parsed.iter().map(|t| t.id.clone()).collect();
        let existing = TemplateRepo::find_existing_ids(&self.pool, &ids).await?;

        for template in parsed {
            let exists = existing.contains(&template.id);
            if exists && !options.overwrite {
                counts.skipped += 1;
                continue;
            }
            if !options.dry_run {
                if let Err(err) = TemplateRepo::upsert(&self.pool, &template).await {
                    counts.failed += 1;
                    errors.push(ImportItemError {
                        collection: "templates",
                        id: template.id,
                        message: err.to_string(),
                    });
                    continue;
                }
            }
            if exists {
                counts.updated += 1;
            } else {
                counts.created += 1;
            }
        }

        Ok(counts)
    }

    // -- Verification ---------------------------------------------------------

    /// Verify a stored backup without restoring it. Integrity problems land
    /// in the report; only missing/incomplete records are hard errors.
    pub async fn verify_backup(&self, id: Uuid) -> Result<VerifyReport, BackupError> {
        let row = BackupRepo::find_payload(&self.pool, id)
            .await?
            .ok_or(BackupError::NotFound(id))?;
        if row.status != "completed" {
            return Err(BackupError::BackupIncomplete { status: row.status });
        }

        let Some(data) = row.data else {
            return Ok(VerifyReport {
                checksum_match: false,
                data_integrity: false,
                issues: vec!["completed backup has no stored payload".to_string()],
            });
        };

        let payload: BackupPayload = match serde_json::from_str(&data) {
            Ok(payload) => payload,
            Err(err) => {
                return Ok(VerifyReport {
                    checksum_match: false,
                    data_integrity: false,
                    issues: vec![format!("payload does not parse: {err}")],
                });
            }
        };

        let mut issues = validate_payload_shape(&payload);
        let data_integrity = issues.is_empty();
        let checksum_match = payload.checksum_matches();
        if !checksum_match {
            issues.push("payload checksum does not match its entity collections".to_string());
        }

        Ok(VerifyReport {
            checksum_match,
            data_integrity,
            issues,
        })
    }

    // -- Record access --------------------------------------------------------

    /// List backup records newest-first.
    pub async fn get_backups(
        &self,
        backup_type: Option<BackupType>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Backup>, BackupError> {
        Ok(BackupRepo::list(
            &self.pool,
            backup_type.map(|t| t.as_str()),
            limit,
            offset,
        )
        .await?)
    }

    /// Fetch one backup's metadata.
    pub async fn get_backup(&self, id: Uuid) -> Result<Backup, BackupError> {
        BackupRepo::find_by_id(&self.pool, id)
            .await?
            .ok_or(BackupError::NotFound(id))
    }

    /// Fetch and integrity-check a completed backup's payload.
    pub async fn get_backup_data(&self, id: Uuid) -> Result<BackupPayload, BackupError> {
        let row = BackupRepo::find_payload(&self.pool, id)
            .await?
            .ok_or(BackupError::NotFound(id))?;
        if row.status != "completed" {
            return Err(BackupError::BackupIncomplete { status: row.status });
        }
        let data = row.data.ok_or_else(|| {
            BackupError::BackupCorrupted("completed backup has no stored payload".to_string())
        })?;
        let payload: BackupPayload = serde_json::from_str(&data)
            .map_err(|err| BackupError::BackupCorrupted(format!("payload does not parse: {err}")))?;
        if !payload.checksum_matches() {
            return Err(BackupError::BackupCorrupted(
                "payload checksum does not match its entity collections".to_string(),
            ));
        }
        Ok(payload)
    }

    /// Delete a backup record. Returns `false` if it did not exist.
    pub async fn delete_backup(&self, actor: &str, id: Uuid) -> Result<bool, BackupError> {
        let deleted = BackupRepo::delete(&self.pool, id).await?;
        if deleted {
            self.audit
                .log(
                    actor,
                    action_types::BACKUP_DELETE,
                    resources::BACKUPS,
                    Some(&id.to_string()),
                    None,
                )
                .await;
        }
        Ok(deleted)
    }

    /// Delete backups older than `retention_days`, optionally restricted
    /// to one type. Returns the number removed.
    pub async fn cleanup_old_backups(
        &self,
        retention_days: u32,
        backup_type: Option<BackupType>,
    ) -> Result<u64, BackupError> {
        let cutoff = chrono::Utc::now() - chrono::Duration::days(retention_days as i64);
        let removed =
            BackupRepo::delete_older_than(&self.pool, cutoff, backup_type.map(|t| t.as_str()))
                .await?;
        if removed > 0 {
            info!(removed, retention_days, "removed expired backups");
        }
        Ok(removed)
    }

    /// Aggregate backup statistics.
    pub async fn stats(&self) -> Result<BackupStats, BackupError> {
        Ok(BackupRepo::stats(&self.pool).await?)
    }
}
