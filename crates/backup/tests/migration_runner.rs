//! Integration tests for the seed catalog migration runner.

use sqlx::PgPool;

use hoclieu_backup::catalog::{seed_ai_tools, seed_templates};
use hoclieu_backup::migration::{MigrationOptions, MigrationRunner};
use hoclieu_db::models::ai_tool::{UpdateAiTool, UpsertAiTool};
use hoclieu_db::repositories::{AiToolRepo, TemplateRepo};

fn no_snapshot() -> MigrationOptions {
    MigrationOptions {
        snapshot: false,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// Test: fresh run
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_fresh_run_creates_whole_catalog(pool: PgPool) {
    let runner = MigrationRunner::new(pool.clone());

    let report = runner.run("admin", &no_snapshot()).await.unwrap();
    assert_eq!(report.ai_tools.created as usize, seed_ai_tools().len());
    assert_eq!(report.templates.created as usize, seed_templates().len());
    assert!(report.errors.is_empty());
    assert!(report.warnings.is_empty());

    let status = runner.status().await.unwrap();
    assert!(status.is_complete());
    assert!(status.ai_tools.pending.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_post_run_sweep_warns_without_failing(pool: PgPool) {
    // A pre-existing row sharing a catalog entry's name, under another id.
    AiToolRepo::create(
        &pool,
        &UpsertAiTool {
            id: "geogebra-cu".to_string(),
            name: "GeoGebra".to_string(),
            description: String::new(),
            category: "toan-hoc".to_string(),
            url: "https://old.example.com".to_string(),
            subjects: vec![],
            grade_levels: vec![],
            features: vec![],
            tags: vec![],
            is_active: true,
        },
    )
    .await
    .unwrap();

    let runner = MigrationRunner::new(pool.clone());
    let report = runner.run("admin", &no_snapshot()).await.unwrap();

    // The duplicate is a warning over the resulting state, not a failure.
    assert!(report.errors.is_empty());
    assert_eq!(report.ai_tools.created as usize, seed_ai_tools().len());
    assert!(report
        .warnings
        .iter()
        .any(|w| w.contains("duplicate AI tool name")));
}

// ---------------------------------------------------------------------------
// Test: idempotency and overwrite
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_second_run_skips_existing(pool: PgPool) {
    let runner = MigrationRunner::new(pool.clone());
    runner.run("admin", &no_snapshot()).await.unwrap();

    let report = runner.run("admin", &no_snapshot()).await.unwrap();
    assert_eq!(report.ai_tools.created, 0);
    assert_eq!(report.ai_tools.skipped as usize, seed_ai_tools().len());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_overwrite_restores_edited_entries(pool: PgPool) {
    let runner = MigrationRunner::new(pool.clone());
    runner.run("admin", &no_snapshot()).await.unwrap();

    // A local edit drifts away from the catalog.
    AiToolRepo::update(
        &pool,
        "geogebra",
        &UpdateAiTool {
            name: Some("Edited locally".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .unwrap();

    let report = runner
        .run(
            "admin",
            &MigrationOptions {
                overwrite: true,
                snapshot: false,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(report.ai_tools.updated as usize, seed_ai_tools().len());

    let restored = AiToolRepo::find_by_id(&pool, "geogebra").await.unwrap().unwrap();
    assert_eq!(restored.name, "GeoGebra");
}

// ---------------------------------------------------------------------------
// Test: dry run
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_dry_run_reports_without_writing(pool: PgPool) {
    let runner = MigrationRunner::new(pool.clone());

    let report = runner
        .run(
            "admin",
            &MigrationOptions {
                dry_run: true,
                snapshot: false,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(report.dry_run);
    assert_eq!(report.ai_tools.created as usize, seed_ai_tools().len());
    assert!(report.snapshot_id.is_none());

    let status = runner.status().await.unwrap();
    assert!(!status.is_complete());
    assert_eq!(status.ai_tools.pending.len(), seed_ai_tools().len());
}

// ---------------------------------------------------------------------------
// Test: snapshot
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_snapshot_taken_before_writes(pool: PgPool) {
    // Pre-existing data that the snapshot must capture.
    AiToolRepo::create(
        &pool,
        &UpsertAiTool {
            id: "pre-existing".to_string(),
            name: "Pre-existing".to_string(),
            description: String::new(),
            category: "khac".to_string(),
            url: "https://pre.example.com".to_string(),
            subjects: vec![],
            grade_levels: vec![],
            features: vec![],
            tags: vec![],
            is_active: true,
        },
    )
    .await
    .unwrap();

    let runner = MigrationRunner::new(pool.clone());
    let report = runner.run("admin", &MigrationOptions::default()).await.unwrap();

    let snapshot_id = report.snapshot_id.expect("snapshot should exist");
    let service = hoclieu_backup::BackupService::new(pool.clone());
    let snapshot = service.get_backup_data(snapshot_id).await.unwrap();
    assert_eq!(snapshot.counts(), (1, 0));
    assert_eq!(snapshot.ai_tools[0]["id"], "pre-existing");
}

// ---------------------------------------------------------------------------
// Test: rollback
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_rollback_removes_only_catalog_entities(pool: PgPool) {
    let runner = MigrationRunner::new(pool.clone());
    runner.run("admin", &no_snapshot()).await.unwrap();

    // A school-added entry the rollback must not touch.
    AiToolRepo::create(
        &pool,
        &UpsertAiTool {
            id: "custom-tool".to_string(),
            name: "Custom".to_string(),
            description: String::new(),
            category: "khac".to_string(),
            url: "https://custom.example.com".to_string(),
            subjects: vec![],
            grade_levels: vec![],
            features: vec![],
            tags: vec![],
            is_active: true,
        },
    )
    .await
    .unwrap();

    let (tools_removed, templates_removed) = runner.rollback("admin").await.unwrap();
    assert_eq!(tools_removed as usize, seed_ai_tools().len());
    assert_eq!(templates_removed as usize, seed_templates().len());

    assert!(AiToolRepo::find_by_id(&pool, "custom-tool")
        .await
        .unwrap()
        .is_some());
    assert!(AiToolRepo::find_by_id(&pool, "geogebra")
        .await
        .unwrap()
        .is_none());
    assert!(TemplateRepo::find_by_id(&pool, "giao-an-5512")
        .await
        .unwrap()
        .is_none());
}
