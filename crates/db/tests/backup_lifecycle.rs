//! Integration tests for the backup record lifecycle and retention queries.
//!
//! The status machine (`creating` -> `completed` | `failed`) is enforced in
//! SQL; these tests confirm a terminal row never transitions again.

use sqlx::PgPool;

use hoclieu_db::models::backup::{CompleteBackup, CreateBackup};
use hoclieu_db::repositories::BackupRepo;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_backup(name: &str, backup_type: &str) -> CreateBackup {
    CreateBackup {
        name: name.to_string(),
        description: None,
        created_by: "admin".to_string(),
        backup_type: backup_type.to_string(),
    }
}

fn completion(data: &str) -> CompleteBackup {
    CompleteBackup {
        ai_tools_count: 2,
        templates_count: 1,
        size_bytes: data.len() as i64,
        checksum: "0a1b2c3d".to_string(),
        data: data.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Test: lifecycle transitions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_insert_starts_creating(pool: PgPool) {
    let backup = BackupRepo::insert_creating(&pool, &new_backup("First", "manual"))
        .await
        .unwrap();
    assert_eq!(backup.status, "creating");
    assert_eq!(backup.ai_tools_count, 0);
    assert!(backup.checksum.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_complete_sets_payload_columns(pool: PgPool) {
    let backup = BackupRepo::insert_creating(&pool, &new_backup("Complete me", "manual"))
        .await
        .unwrap();

    let completed = BackupRepo::mark_completed(&pool, backup.id, &completion("{\"x\":1}"))
        .await
        .unwrap()
        .expect("creating row should transition");

    assert_eq!(completed.status, "completed");
    assert_eq!(completed.ai_tools_count, 2);
    assert_eq!(completed.checksum.as_deref(), Some("0a1b2c3d"));

    let payload = BackupRepo::find_payload(&pool, backup.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(payload.data.as_deref(), Some("{\"x\":1}"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_terminal_states_never_transition(pool: PgPool) {
    let backup = BackupRepo::insert_creating(&pool, &new_backup("Terminal", "manual"))
        .await
        .unwrap();
    BackupRepo::mark_completed(&pool, backup.id, &completion("{}"))
        .await
        .unwrap()
        .unwrap();

    // Completed rows ignore both transitions.
    let again = BackupRepo::mark_completed(&pool, backup.id, &completion("{\"other\":1}"))
        .await
        .unwrap();
    assert!(again.is_none());
    assert!(!BackupRepo::mark_failed(&pool, backup.id).await.unwrap());

    // Failed rows too.
    let failed = BackupRepo::insert_creating(&pool, &new_backup("Failing", "manual"))
        .await
        .unwrap();
    assert!(BackupRepo::mark_failed(&pool, failed.id).await.unwrap());
    let revived = BackupRepo::mark_completed(&pool, failed.id, &completion("{}"))
        .await
        .unwrap();
    assert!(revived.is_none());

    let row = BackupRepo::find_by_id(&pool, failed.id).await.unwrap().unwrap();
    assert_eq!(row.status, "failed");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_invalid_type_rejected_by_check_constraint(pool: PgPool) {
    let result = BackupRepo::insert_creating(&pool, &new_backup("Bad", "scheduled")).await;
    assert!(result.is_err(), "unknown backup_type should violate CHECK");
}

// ---------------------------------------------------------------------------
// Test: listing and retention queries
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_filters_by_type(pool: PgPool) {
    for (name, ty) in [("m1", "manual"), ("a1", "automatic"), ("a2", "automatic")] {
        BackupRepo::insert_creating(&pool, &new_backup(name, ty))
            .await
            .unwrap();
    }

    let all = BackupRepo::list(&pool, None, 50, 0).await.unwrap();
    assert_eq!(all.len(), 3);

    let automatic = BackupRepo::list(&pool, Some("automatic"), 50, 0).await.unwrap();
    assert_eq!(automatic.len(), 2);

    let latest = BackupRepo::find_latest_automatic(&pool).await.unwrap().unwrap();
    assert_eq!(latest.backup_type, "automatic");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_count_based_retention_keeps_newest(pool: PgPool) {
    let mut ids = Vec::new();
    for i in 0..5 {
        let b = BackupRepo::insert_creating(&pool, &new_backup(&format!("auto-{i}"), "automatic"))
            .await
            .unwrap();
        BackupRepo::mark_completed(&pool, b.id, &completion("{}"))
            .await
            .unwrap()
            .unwrap();
        // Spread created_at so the ranking is deterministic.
        sqlx::query("UPDATE backups SET created_at = NOW() - ($2 || ' days')::INTERVAL WHERE id = $1")
            .bind(b.id)
            .bind((5 - i).to_string())
            .execute(&pool)
            .await
            .unwrap();
        ids.push(b.id);
    }

    let excess = BackupRepo::automatic_ids_beyond(&pool, 3).await.unwrap();
    assert_eq!(excess.len(), 2);
    // The two oldest rows are ranked beyond keep=3.
    assert!(excess.contains(&ids[0]));
    assert!(excess.contains(&ids[1]));

    let removed = BackupRepo::delete_by_ids(&pool, &excess).await.unwrap();
    assert_eq!(removed, 2);
    assert!(BackupRepo::find_by_id(&pool, ids[0]).await.unwrap().is_none());
    assert!(BackupRepo::find_by_id(&pool, ids[4]).await.unwrap().is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_age_based_retention_respects_type_filter(pool: PgPool) {
    let old_manual = BackupRepo::insert_creating(&pool, &new_backup("old-m", "manual"))
        .await
        .unwrap();
    let old_auto = BackupRepo::insert_creating(&pool, &new_backup("old-a", "automatic"))
        .await
        .unwrap();
    for id in [old_manual.id, old_auto.id] {
        sqlx::query("UPDATE backups SET created_at = NOW() - INTERVAL '40 days' WHERE id = $1")
            .bind(id)
            .execute(&pool)
            .await
            .unwrap();
    }
    BackupRepo::insert_creating(&pool, &new_backup("fresh-a", "automatic"))
        .await
        .unwrap();

    let cutoff = chrono::Utc::now() - chrono::Duration::days(30);
    let removed = BackupRepo::delete_older_than(&pool, cutoff, Some("automatic"))
        .await
        .unwrap();
    assert_eq!(removed, 1);

    // The old manual backup is outside the automatic retention policy.
    assert!(BackupRepo::find_by_id(&pool, old_manual.id)
        .await
        .unwrap()
        .is_some());
    assert!(BackupRepo::find_by_id(&pool, old_auto.id)
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_stats_aggregates(pool: PgPool) {
    let b1 = BackupRepo::insert_creating(&pool, &new_backup("s1", "manual"))
        .await
        .unwrap();
    BackupRepo::mark_completed(&pool, b1.id, &completion("{\"a\":1}"))
        .await
        .unwrap()
        .unwrap();
    let b2 = BackupRepo::insert_creating(&pool, &new_backup("s2", "automatic"))
        .await
        .unwrap();
    BackupRepo::mark_failed(&pool, b2.id).await.unwrap();

    let stats = BackupRepo::stats(&pool).await.unwrap();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.manual, 1);
    assert_eq!(stats.automatic, 1);
    assert!(stats.total_size_bytes > 0);
    // The only automatic backup failed, so it does not count as a run.
    assert!(stats.last_automatic_at.is_none());
}
