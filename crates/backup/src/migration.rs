//! Seed catalog migration runner.
//!
//! `run` reconciles the shipped catalog against the database: per-item
//! validation covers the entire catalog before the first write, so a bad
//! catalog changes nothing. Existing ids are skipped unless `overwrite` is
//! set. After execution an integrity sweep over the resulting state
//! (including rows that predate the catalog) surfaces findings as
//! warnings, never failures. `rollback` removes exactly the catalog's ids
//! and nothing else.

use serde_json::json;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use hoclieu_core::audit::{action_types, resources};
use hoclieu_core::backup::BackupType;
use hoclieu_core::sanitize::is_safe_url;
use hoclieu_db::models::ai_tool::{AiTool, UpsertAiTool};
use hoclieu_db::models::template::{Template, UpsertTemplate};
use hoclieu_db::repositories::{AiToolRepo, TemplateRepo};

use crate::audit::AuditLogger;
use crate::catalog::{seed_ai_tools, seed_templates};
use crate::error::{ItemValidationError, MigrationError};
use crate::service::{BackupService, ExportOptions, ImportCounts, ImportItemError};

// ---------------------------------------------------------------------------
// Options and reports
// ---------------------------------------------------------------------------

/// Switches for one migration run.
#[derive(Debug, Clone)]
pub struct MigrationOptions {
    /// Replace catalog entities whose id already exists in the database.
    pub overwrite: bool,
    /// Compute the full report without performing any write.
    pub dry_run: bool,
    /// Take a backup snapshot before the first write.
    pub snapshot: bool,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self {
            overwrite: false,
            dry_run: false,
            snapshot: true,
        }
    }
}

/// Outcome of one migration run.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationReport {
    pub ai_tools: ImportCounts,
    pub templates: ImportCounts,
    pub errors: Vec<ImportItemError>,
    /// Post-run integrity sweep findings. Advisory only.
    pub warnings: Vec<String>,
    pub dry_run: bool,
    pub snapshot_id: Option<Uuid>,
}

/// Per-collection presence of catalog ids in the database.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionStatus {
    pub total: usize,
    pub present: Vec<String>,
    pub pending: Vec<String>,
}

/// What the catalog would change if run now.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationStatus {
    pub ai_tools: CollectionStatus,
    pub templates: CollectionStatus,
}

impl MigrationStatus {
    /// True when every catalog id already exists.
    pub fn is_complete(&self) -> bool {
        self.ai_tools.pending.is_empty() && self.templates.pending.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// Applies, inspects, and rolls back the seed catalog.
pub struct MigrationRunner {
    pool: PgPool,
    service: BackupService,
    audit: AuditLogger,
}

impl MigrationRunner {
    pub fn new(pool: PgPool) -> Self {
        let service = BackupService::new(pool.clone());
        let audit = AuditLogger::new(pool.clone());
        Self {
            pool,
            service,
            audit,
        }
    }

    /// Apply the seed catalog under the given options.
    pub async fn run(
        &self,
        actor: &str,
        options: &MigrationOptions,
    ) -> Result<MigrationReport, MigrationError> {
        let tools = seed_ai_tools();
        let templates = seed_templates();

        let validation_errors = validate_catalog(&tools, &templates);
        if !validation_errors.is_empty() {
            return Err(MigrationError::Validation {
                errors: validation_errors,
            });
        }

        let snapshot_id = if options.snapshot && !options.dry_run {
            let backup = self
                .service
                .create_backup(
                    "Pre-migration snapshot",
                    Some("Automatic snapshot taken before applying the seed catalog"),
                    actor,
                    BackupType::Manual,
                    &ExportOptions::default(),
                )
                .await
                .map_err(|err| MigrationError::Snapshot(Box::new(err)))?;
            Some(backup.id)
        } else {
            None
        };

        let mut errors = Vec::new();

        let tool_ids: Vec<String> = tools.iter().map(|t| t.id.clone()).collect();
        let existing_tools = AiToolRepo::find_existing_ids(&self.pool, &tool_ids).await?;
        let mut tool_counts = ImportCounts::default();
        for tool in &tools {
            let exists = existing_tools.contains(&tool.id);
            if exists && !options.overwrite {
                tool_counts.skipped += 1;
                continue;
            }
            if !options.dry_run {
                if let Err(err) = AiToolRepo::upsert(&self.pool, tool).await {
                    tool_counts.failed += 1;
                    errors.push(ImportItemError {
                        collection: "aiTools",
                        id: tool.id.clone(),
                        message: err.to_string(),
                    });
                    continue;
                }
            }
            if exists {
                tool_counts.updated += 1;
            } else {
                tool_counts.created += 1;
            }
        }

        let template_ids: Vec<String> = templates.iter().map(|t| t.id.clone()).collect();
        let existing_templates =
            TemplateRepo::find_existing_ids(&self.pool, &template_ids).await?;
        let mut template_counts = ImportCounts::default();
        for template in &templates {
            let exists = existing_templates.contains(&template.id);
            if exists && !options.overwrite {
                template_counts.skipped += 1;
                continue;
            }
            if !options.dry_run {
                if let Err(err) = TemplateRepo::upsert(&self.pool, template).await {
                    template_counts.failed += 1;
                    errors.push(ImportItemError {
                        collection: "templates",
                        id: template.id.clone(),
                        message: err.to_string(),
                    });
                    continue;
                }
            }
            if exists {
                template_counts.updated += 1;
            } else {
                template_counts.created += 1;
            }
        }

        // Sweep the resulting state, catalog and pre-existing rows alike.
        // Findings are advisory; they never fail the run.
        let warnings = integrity_sweep(
            &AiToolRepo::list_all(&self.pool).await?,
            &TemplateRepo::list_all(&self.pool).await?,
        );
        for warning in &warnings {
            warn!(finding = %warning, "catalog integrity warning");
        }

        let report = MigrationReport {
            ai_tools: tool_counts,
            templates: template_counts,
            errors,
            warnings,
            dry_run: options.dry_run,
            snapshot_id,
        };

        info!(
            dry_run = report.dry_run,
            tools_created = report.ai_tools.created,
            tools_updated = report.ai_tools.updated,
            tools_skipped = report.ai_tools.skipped,
            templates_created = report.templates.created,
            templates_updated = report.templates.updated,
            templates_skipped = report.templates.skipped,
            failures = report.errors.len(),
            "seed catalog migration finished"
        );

        if !options.dry_run {
            self.audit
                .log(
                    actor,
                    action_types::MIGRATION_RUN,
                    resources::SETTINGS,
                    None,
                    serde_json::to_value(&report).ok(),
                )
                .await;
        }

        Ok(report)
    }

    /// Remove every catalog-owned entity. Entities created outside the
    /// catalog are untouched. Returns `(ai_tools, templates)` removed.
    pub async fn rollback(&self, actor: &str) -> Result<(u64, u64), MigrationError> {
        let tool_ids: Vec<String> = seed_ai_tools().into_iter().map(|t| t.id).collect();
        let template_ids: Vec<String> = seed_templates().into_iter().map(|t| t.id).collect();

        let tools_removed = AiToolRepo::bulk_delete(&self.pool, &tool_ids).await?;
        let templates_removed = TemplateRepo::bulk_delete(&self.pool, &template_ids).await?;

        info!(tools_removed, templates_removed, "seed catalog rolled back");
        self.audit
            .log(
                actor,
                action_types::MIGRATION_ROLLBACK,
                resources::SETTINGS,
                None,
                Some(json!({
                    "aiToolsRemoved": tools_removed,
                    "templatesRemoved": templates_removed,
                })),
            )
            .await;

        Ok((tools_removed, templates_removed))
    }

    /// Report which catalog ids are present versus still pending.
    pub async fn status(&self) -> Result<MigrationStatus, MigrationError> {
        let tool_ids: Vec<String> = seed_ai_tools().into_iter().map(|t| t.id).collect();
        let template_ids: Vec<String> = seed_templates().into_iter().map(|t| t.id).collect();

        let existing_tools = AiToolRepo::find_existing_ids(&self.pool, &tool_ids).await?;
        let existing_templates = TemplateRepo::find_existing_ids(&self.pool, &template_ids).await?;

        Ok(MigrationStatus {
            ai_tools: collection_status(tool_ids, &existing_tools),
            templates: collection_status(template_ids, &existing_templates),
        })
    }
}

fn collection_status(all: Vec<String>, existing: &[String]) -> CollectionStatus {
    let total = all.len();
    let (present, pending): (Vec<String>, Vec<String>) =
        all.into_iter().partition(|id| existing.contains(id));
    CollectionStatus {
        total,
        present,
        pending,
    }
}

// ---------------------------------------------------------------------------
// Catalog validation
// ---------------------------------------------------------------------------

/// Validate every catalog item against the entity schema, collecting every
/// problem instead of stopping at the first. Any hit aborts the run before
/// the first write.
fn validate_catalog(
    tools: &[UpsertAiTool],
    templates: &[UpsertTemplate],
) -> Vec<ItemValidationError> {
    let mut errors = Vec::new();

    for tool in tools {
        if let Err(err) = tool.validate() {
            errors.push(ItemValidationError {
                collection: "aiTools",
                id: tool.id.clone(),
                messages: vec![err.to_string()],
            });
        }
    }
    for template in templates {
        if let Err(err) = template.validate() {
            errors.push(ItemValidationError {
                collection: "templates",
                id: template.id.clone(),
                messages: vec![err.to_string()],
            });
        }
    }

    errors
}

/// Cross-row consistency checks over stored state that the per-item
/// validators cannot see: duplicate names and URLs within a collection,
/// non-http(s) link schemes (the per-item url validator accepts any URI),
/// and blank entries inside the string-array fields. Findings are
/// warnings, not failures.
pub fn integrity_sweep(tools: &[AiTool], templates: &[Template]) -> Vec<String> {
    let mut issues = Vec::new();

    let mut names = std::collections::HashSet::new();
    let mut urls = std::collections::HashSet::new();
    for tool in tools {
        if !names.insert(tool.name.to_lowercase()) {
            issues.push(format!("duplicate AI tool name '{}'", tool.name));
        }
        if !urls.insert(tool.url.clone()) {
            issues.push(format!("duplicate AI tool url '{}'", tool.url));
        }
        if !is_safe_url(&tool.url) {
            issues.push(format!("AI tool '{}' url is not http(s)", tool.id));
        }
        for (field, values) in [
            ("subjects", &tool.subjects),
            ("gradeLevels", &tool.grade_levels),
            ("features", &tool.features),
            ("tags", &tool.tags),
        ] {
            if values.iter().any(|v| v.trim().is_empty()) {
                issues.push(format!("AI tool '{}' has a blank {field} entry", tool.id));
            }
        }
    }

    let mut names = std::collections::HashSet::new();
    let mut urls = std::collections::HashSet::new();
    for template in templates {
        if !names.insert(template.name.to_lowercase()) {
            issues.push(format!("duplicate template name '{}'", template.name));
        }
        if !urls.insert(template.file_url.clone()) {
            issues.push(format!("duplicate template fileUrl '{}'", template.file_url));
        }
        if !is_safe_url(&template.file_url) {
            issues.push(format!("template '{}' fileUrl is not http(s)", template.id));
        }
        for (field, values) in [
            ("subjects", &template.subjects),
            ("gradeLevels", &template.grade_levels),
            ("features", &template.features),
            ("tags", &template.tags),
        ] {
            if values.iter().any(|v| v.trim().is_empty()) {
                issues.push(format!(
                    "template '{}' has a blank {field} entry",
                    template.id
                ));
            }
        }
    }

    issues
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, name: &str, url: &str) -> AiTool {
        AiTool {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            category: "toan-hoc".to_string(),
            url: url.to_string(),
            subjects: vec![],
            grade_levels: vec![],
            features: vec![],
            tags: vec![],
            is_active: true,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn shipped_catalog_passes_validation() {
        assert!(validate_catalog(&seed_ai_tools(), &seed_templates()).is_empty());
    }

    #[test]
    fn sweep_flags_duplicate_names_case_insensitively() {
        let tools = vec![
            row("a", "GeoGebra", "https://a.example.com"),
            row("b", "geogebra", "https://b.example.com"),
        ];
        let issues = integrity_sweep(&tools, &[]);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("duplicate AI tool name"));
    }

    #[test]
    fn sweep_flags_duplicate_urls() {
        let tools = vec![
            row("a", "One", "https://same.example.com"),
            row("b", "Two", "https://same.example.com"),
        ];
        let issues = integrity_sweep(&tools, &[]);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("duplicate AI tool url"));
    }

    #[test]
    fn sweep_flags_non_http_url_scheme() {
        // `javascript:` parses as a valid URI, so the per-item validator
        // lets it through; the sweep must flag it.
        let tools = vec![row("a", "One", "javascript:alert(1)")];
        let issues = integrity_sweep(&tools, &[]);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("not http(s)"));
    }

    #[test]
    fn sweep_flags_blank_array_entries() {
        let mut t = row("a", "One", "https://a.example.com");
        t.subjects = vec!["Toán".to_string(), "  ".to_string()];
        let issues = integrity_sweep(&[t], &[]);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("blank subjects entry"));
    }

    #[test]
    fn invalid_item_reported_with_id() {
        let t = UpsertAiTool {
            id: "no-name".to_string(),
            name: String::new(),
            description: String::new(),
            category: "toan-hoc".to_string(),
            url: "https://a.example.com".to_string(),
            subjects: vec![],
            grade_levels: vec![],
            features: vec![],
            tags: vec![],
            is_active: true,
        };
        let errors = validate_catalog(&[t], &[]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].id, "no-name");
        assert_eq!(errors[0].collection, "aiTools");
    }
}
