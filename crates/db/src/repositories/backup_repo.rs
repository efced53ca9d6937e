//! Repository for the `backups` table.
//!
//! This repository owns the backup lifecycle transition: a row is inserted
//! with status `creating`, then exactly one of `mark_completed` /
//! `mark_failed` moves it to its terminal state. Both guards include
//! `status = 'creating'` in the WHERE clause, so a terminal row can never
//! transition again.

use sqlx::PgPool;
use uuid::Uuid;

use hoclieu_core::types::Timestamp;

use crate::models::backup::{Backup, BackupPayloadRow, BackupStats, CompleteBackup, CreateBackup};

/// Column list for `backups` SELECT queries. Excludes the payload column.
const COLUMNS: &str = "\
    id, name, description, created_by, backup_type, status, \
    ai_tools_count, templates_count, size_bytes, checksum, created_at";

/// Provides lifecycle and query operations for backup records.
pub struct BackupRepo;

impl BackupRepo {
    /// Insert a new backup attempt with status `creating` and zeroed
    /// payload columns.
    pub async fn insert_creating(
        pool: &PgPool,
        input: &CreateBackup,
    ) -> Result<Backup, sqlx::Error> {
        let query = format!(
            "INSERT INTO backups (name, description, created_by, backup_type, status) \
             VALUES ($1, $2, $3, $4, 'creating') \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Backup>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.created_by)
            .bind(&input.backup_type)
            .fetch_one(pool)
            .await
    }

    /// Transition a `creating` backup to `completed`, setting every
    /// payload-derived column in the same statement.
    ///
    /// Returns `None` if the row does not exist or is already terminal.
    pub async fn mark_completed(
        pool: &PgPool,
        id: Uuid,
        payload: &CompleteBackup,
    ) -> Result<Option<Backup>, sqlx::Error> {
        let query = format!(
            "UPDATE backups SET \
                status = 'completed', \
                ai_tools_count = $2, \
                templates_count = $3, \
                size_bytes = $4, \
                checksum = $5, \
                data = $6 \
             WHERE id = $1 AND status = 'creating' \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Backup>(&query)
            .bind(id)
            .bind(payload.ai_tools_count)
            .bind(payload.templates_count)
            .bind(payload.size_bytes)
            .bind(&payload.checksum)
            .bind(&payload.data)
            .fetch_optional(pool)
            .await
    }

    /// Transition a `creating` backup to `failed`. Payload columns are
    /// left unset; nothing about a failed row is trusted.
    pub async fn mark_failed(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE backups SET status = 'failed' WHERE id = $1 AND status = 'creating'")
                .bind(id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Find a backup's metadata by id.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Backup>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM backups WHERE id = $1");
        sqlx::query_as::<_, Backup>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Fetch a backup's status and raw payload text.
    pub async fn find_payload(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<Option<BackupPayloadRow>, sqlx::Error> {
        sqlx::query_as::<_, BackupPayloadRow>("SELECT status, data FROM backups WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List backups newest-first, optionally filtered by type.
    pub async fn list(
        pool: &PgPool,
        backup_type: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Backup>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM backups \
             WHERE ($1::TEXT IS NULL OR backup_type = $1) \
             ORDER BY created_at DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Backup>(&query)
            .bind(backup_type)
            .bind(limit.min(500))
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Find the most recent automatic backup regardless of status.
    pub async fn find_latest_automatic(pool: &PgPool) -> Result<Option<Backup>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM backups WHERE backup_type = 'automatic' \
             ORDER BY created_at DESC LIMIT 1"
        );
        sqlx::query_as::<_, Backup>(&query).fetch_optional(pool).await
    }

    /// Delete a backup by id. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM backups WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete backups created before `cutoff`, optionally restricted to
    /// one type. Returns the number of rows removed.
    pub async fn delete_older_than(
        pool: &PgPool,
        cutoff: Timestamp,
        backup_type: Option<&str>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM backups \
             WHERE created_at < $1 AND ($2::TEXT IS NULL OR backup_type = $2)",
        )
        .bind(cutoff)
        .bind(backup_type)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Ids of completed automatic backups ranked beyond the `keep` most
    /// recent (the count-based half of the retention policy).
    pub async fn automatic_ids_beyond(
        pool: &PgPool,
        keep: i64,
    ) -> Result<Vec<Uuid>, sqlx::Error> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM backups \
             WHERE backup_type = 'automatic' AND status = 'completed' \
             ORDER BY created_at DESC \
             OFFSET $1",
        )
        .bind(keep)
        .fetch_all(pool)
        .await
    }

    /// Delete the given backup ids. Returns the number of rows removed.
    pub async fn delete_by_ids(pool: &PgPool, ids: &[Uuid]) -> Result<u64, sqlx::Error> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query("DELETE FROM backups WHERE id = ANY($1)")
            .bind(ids)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Aggregate statistics over stored backups, for display.
    pub async fn stats(pool: &PgPool) -> Result<BackupStats, sqlx::Error> {
        sqlx::query_as::<_, BackupStats>(
            "SELECT \
                COUNT(*)::BIGINT AS total, \
                COUNT(*) FILTER (WHERE status = 'completed')::BIGINT AS completed, \
                COUNT(*) FILTER (WHERE status = 'failed')::BIGINT AS failed, \
                COUNT(*) FILTER (WHERE backup_type = 'automatic')::BIGINT AS automatic, \
                COUNT(*) FILTER (WHERE backup_type = 'manual')::BIGINT AS manual, \
                COALESCE(SUM(size_bytes), 0)::BIGINT AS total_size_bytes, \
                MAX(created_at) FILTER (WHERE backup_type = 'automatic' AND status = 'completed') \
                    AS last_automatic_at \
             FROM backups",
        )
        .fetch_one(pool)
        .await
    }
}
