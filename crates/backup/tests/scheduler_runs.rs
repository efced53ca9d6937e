//! Integration tests for scheduled runs and configuration persistence.
//!
//! These drive `execute_scheduled_backup` directly rather than waiting on
//! the timer loop.

use sqlx::PgPool;

use hoclieu_backup::scheduler::{execute_scheduled_backup, BackupScheduler};
use hoclieu_backup::service::BackupService;
use hoclieu_core::backup::SCHEDULE_SETTING_KEY;
use hoclieu_core::schedule::{Frequency, ScheduleConfig};
use hoclieu_db::models::ai_tool::UpsertAiTool;
use hoclieu_db::repositories::{AiToolRepo, AuditLogRepo, BackupRepo, SettingRepo};

fn enabled_config() -> ScheduleConfig {
    ScheduleConfig {
        enabled: true,
        frequency: Frequency::Daily,
        retention_days: 30,
        max_backups: 3,
        ..Default::default()
    }
}

async fn seed_tool(pool: &PgPool) {
    AiToolRepo::create(
        pool,
        &UpsertAiTool {
            id: "geogebra".to_string(),
            name: "GeoGebra".to_string(),
            description: String::new(),
            category: "toan-hoc".to_string(),
            url: "https://www.geogebra.org".to_string(),
            subjects: vec![],
            grade_levels: vec![],
            features: vec![],
            tags: vec![],
            is_active: true,
        },
    )
    .await
    .unwrap();
}

// ---------------------------------------------------------------------------
// Test: one scheduled run
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_scheduled_run_creates_automatic_backup(pool: PgPool) {
    seed_tool(&pool).await;
    let service = BackupService::new(pool.clone());

    let result = execute_scheduled_backup(&service, &pool, &enabled_config()).await;
    assert!(result.success);
    assert!(result.error.is_none());

    let backup = service.get_backup(result.backup_id.unwrap()).await.unwrap();
    assert_eq!(backup.backup_type, "automatic");
    assert_eq!(backup.created_by, "system");
    assert_eq!(backup.status, "completed");
    assert_eq!(backup.ai_tools_count, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_include_flags_respected(pool: PgPool) {
    seed_tool(&pool).await;
    let service = BackupService::new(pool.clone());

    let config = ScheduleConfig {
        include_ai_tools: false,
        ..enabled_config()
    };
    let result = execute_scheduled_backup(&service, &pool, &config).await;
    assert!(result.success);

    let backup = service.get_backup(result.backup_id.unwrap()).await.unwrap();
    assert_eq!(backup.ai_tools_count, 0);
}

// ---------------------------------------------------------------------------
// Test: retention is the union of both rules
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_retention_applies_age_and_count_rules(pool: PgPool) {
    let service = BackupService::new(pool.clone());
    let config = enabled_config(); // retention 30 days, keep 3

    // Seed four prior automatic backups directly: one age-expired, three
    // fresh. The new run makes four fresh ones, so count-based cleanup
    // removes the oldest fresh one too.
    for (name, days_ago) in [("expired", 45), ("d3", 3), ("d2", 2), ("d1", 1)] {
        let record = BackupRepo::insert_creating(
            &pool,
            &hoclieu_db::models::backup::CreateBackup {
                name: name.to_string(),
                description: None,
                created_by: "system".to_string(),
                backup_type: "automatic".to_string(),
            },
        )
        .await
        .unwrap();
        BackupRepo::mark_completed(
            &pool,
            record.id,
            &hoclieu_db::models::backup::CompleteBackup {
                ai_tools_count: 0,
                templates_count: 0,
                size_bytes: 2,
                checksum: "00000000".to_string(),
                data: "{}".to_string(),
            },
        )
        .await
        .unwrap()
        .unwrap();
        sqlx::query(
            "UPDATE backups SET created_at = NOW() - ($2 || ' days')::INTERVAL WHERE id = $1",
        )
        .bind(record.id)
        .bind(days_ago.to_string())
        .execute(&pool)
        .await
        .unwrap();
    }

    let result = execute_scheduled_backup(&service, &pool, &config).await;
    assert!(result.success);
    assert_eq!(result.cleaned_up, 2);

    let stats = BackupRepo::stats(&pool).await.unwrap();
    assert_eq!(stats.automatic, 3);
}

// ---------------------------------------------------------------------------
// Test: configuration persistence and scheduler control
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_missing_config_falls_back_to_disabled_default(pool: PgPool) {
    let config = BackupScheduler::load_config(&pool).await.unwrap();
    assert!(!config.enabled);
    assert_eq!(config.frequency, Frequency::Daily);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_start_refuses_disabled_config(pool: PgPool) {
    let scheduler = BackupScheduler::new(pool.clone());
    let result = scheduler.start().await;
    assert!(result.is_err());
    assert!(!scheduler.is_running().await);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_config_persists_and_audits(pool: PgPool) {
    let scheduler = BackupScheduler::new(pool.clone());
    let config = ScheduleConfig {
        frequency: Frequency::Weekly,
        time: "03:30".to_string(),
        ..enabled_config()
    };

    scheduler.update_config("admin", &config).await.unwrap();
    // A config update alone never starts a stopped scheduler.
    assert!(!scheduler.is_running().await);

    let stored = SettingRepo::get(&pool, SCHEDULE_SETTING_KEY)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.value["frequency"], "weekly");
    assert_eq!(stored.value["time"], "03:30");

    let logs = AuditLogRepo::query(&pool, &Default::default()).await.unwrap();
    assert!(logs.iter().any(|l| l.action == "config_change"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_config_restarts_only_a_running_scheduler(pool: PgPool) {
    let scheduler = BackupScheduler::new(pool.clone());
    SettingRepo::upsert(
        &pool,
        SCHEDULE_SETTING_KEY,
        &serde_json::to_value(enabled_config()).unwrap(),
    )
    .await
    .unwrap();
    scheduler.start().await.unwrap();

    // A running scheduler picks up the new config by restarting.
    let weekly = ScheduleConfig {
        frequency: Frequency::Weekly,
        ..enabled_config()
    };
    scheduler.update_config("admin", &weekly).await.unwrap();
    assert!(scheduler.is_running().await);

    // Disabling through update_config stops it.
    let disabled = ScheduleConfig {
        enabled: false,
        ..enabled_config()
    };
    scheduler.update_config("admin", &disabled).await.unwrap();
    assert!(!scheduler.is_running().await);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_running_state_owned_by_start_and_stop(pool: PgPool) {
    let scheduler = BackupScheduler::new(pool.clone());
    SettingRepo::upsert(
        &pool,
        SCHEDULE_SETTING_KEY,
        &serde_json::to_value(enabled_config()).unwrap(),
    )
    .await
    .unwrap();
    scheduler.start().await.unwrap();

    // Flipping the stored config off behind the scheduler's back does not
    // tear the task down; the loop idles until stop() is called.
    let disabled = ScheduleConfig {
        enabled: false,
        ..enabled_config()
    };
    SettingRepo::upsert(
        &pool,
        SCHEDULE_SETTING_KEY,
        &serde_json::to_value(disabled).unwrap(),
    )
    .await
    .unwrap();

    assert!(scheduler.is_running().await);
    assert!(scheduler.start().await.is_err());
    scheduler.stop().await;
    assert!(!scheduler.is_running().await);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_invalid_config_rejected_before_persisting(pool: PgPool) {
    let scheduler = BackupScheduler::new(pool.clone());
    let config = ScheduleConfig {
        time: "99:99".to_string(),
        ..enabled_config()
    };

    assert!(scheduler.update_config("admin", &config).await.is_err());
    assert!(SettingRepo::get(&pool, SCHEDULE_SETTING_KEY)
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_start_twice_errors(pool: PgPool) {
    let scheduler = BackupScheduler::new(pool.clone());
    SettingRepo::upsert(
        &pool,
        SCHEDULE_SETTING_KEY,
        &serde_json::to_value(enabled_config()).unwrap(),
    )
    .await
    .unwrap();

    scheduler.start().await.unwrap();
    assert!(scheduler.start().await.is_err());
    scheduler.stop().await;
    // Stopping twice is a no-op.
    scheduler.stop().await;
}
