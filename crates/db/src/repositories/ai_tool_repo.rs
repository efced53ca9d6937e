//! Repository for the `ai_tools` table.

use sqlx::PgPool;

use crate::models::ai_tool::{
    AiTool, AiToolBulkChange, AiToolQuery, AiToolStats, CategoryCount, UpdateAiTool, UpsertAiTool,
};
use crate::repositories::with_bulk_timeout;

/// Column list for `ai_tools` SELECT queries.
const COLUMNS: &str = "\
    id, name, description, category, url, subjects, grade_levels, \
    features, tags, is_active, created_at, updated_at";

/// Provides CRUD, bulk, and aggregate operations for AI tools.
pub struct AiToolRepo;

impl AiToolRepo {
    /// Insert a new AI tool, returning the created row.
    pub async fn create(pool: &PgPool, input: &UpsertAiTool) -> Result<AiTool, sqlx::Error> {
        let query = format!(
            "INSERT INTO ai_tools \
                (id, name, description, category, url, subjects, grade_levels, features, tags, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AiTool>(&query)
            .bind(&input.id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.category)
            .bind(&input.url)
            .bind(&input.subjects)
            .bind(&input.grade_levels)
            .bind(&input.features)
            .bind(&input.tags)
            .bind(input.is_active)
            .fetch_one(pool)
            .await
    }

    /// Insert or fully replace an AI tool by id (import path).
    pub async fn upsert(pool: &PgPool, input: &UpsertAiTool) -> Result<AiTool, sqlx::Error> {
        let query = format!(
            "INSERT INTO ai_tools \
                (id, name, description, category, url, subjects, grade_levels, features, tags, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             ON CONFLICT (id) DO UPDATE SET \
                name = EXCLUDED.name, \
                description = EXCLUDED.description, \
                category = EXCLUDED.category, \
                url = EXCLUDED.url, \
                subjects = EXCLUDED.subjects, \
                grade_levels = EXCLUDED.grade_levels, \
                features = EXCLUDED.features, \
                tags = EXCLUDED.tags, \
                is_active = EXCLUDED.is_active, \
                updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AiTool>(&query)
            .bind(&input.id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.category)
            .bind(&input.url)
            .bind(&input.subjects)
            .bind(&input.grade_levels)
            .bind(&input.features)
            .bind(&input.tags)
            .bind(input.is_active)
            .fetch_one(pool)
            .await
    }

    /// Find an AI tool by id.
    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<AiTool>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM ai_tools WHERE id = $1");
        sqlx::query_as::<_, AiTool>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List AI tools with filtering and pagination.
    pub async fn list(pool: &PgPool, params: &AiToolQuery) -> Result<Vec<AiTool>, sqlx::Error> {
        let limit = params.limit.unwrap_or(50).min(500);
        let offset = params.offset.unwrap_or(0);

        let (where_clause, bind_values, bind_idx) = build_tool_filter(params);

        let query = format!(
            "SELECT {COLUMNS} FROM ai_tools {where_clause} \
             ORDER BY name ASC \
             LIMIT ${bind_idx} OFFSET ${}",
            bind_idx + 1
        );

        let mut q = sqlx::query_as::<_, AiTool>(&query);
        for val in &bind_values {
            q = match val {
                BindValue::Text(v) => q.bind(v.as_str()),
                BindValue::Bool(v) => q.bind(*v),
            };
        }
        q.bind(limit).bind(offset).fetch_all(pool).await
    }

    /// Count AI tools matching the given filter (for pagination metadata).
    pub async fn count(pool: &PgPool, params: &AiToolQuery) -> Result<i64, sqlx::Error> {
        let (where_clause, bind_values, _) = build_tool_filter(params);
        let query = format!("SELECT COUNT(*)::BIGINT FROM ai_tools {where_clause}");
        let mut q = sqlx::query_scalar::<_, i64>(&query);
        for val in &bind_values {
            q = match val {
                BindValue::Text(v) => q.bind(v.as_str()),
                BindValue::Bool(v) => q.bind(*v),
            };
        }
        q.fetch_one(pool).await
    }

    /// Fetch every AI tool, unbounded, ordered by id (export path).
    pub async fn list_all(pool: &PgPool) -> Result<Vec<AiTool>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM ai_tools ORDER BY id ASC");
        sqlx::query_as::<_, AiTool>(&query).fetch_all(pool).await
    }

    /// Fetch every AI tool in one category, unbounded (filtered export).
    pub async fn list_all_in_category(
        pool: &PgPool,
        category: &str,
    ) -> Result<Vec<AiTool>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM ai_tools WHERE category = $1 ORDER BY id ASC");
        sqlx::query_as::<_, AiTool>(&query)
            .bind(category)
            .fetch_all(pool)
            .await
    }

    /// Update an AI tool. Only non-`None` fields are applied.
    pub async fn update(
        pool: &PgPool,
        id: &str,
        input: &UpdateAiTool,
    ) -> Result<Option<AiTool>, sqlx::Error> {
        let query = format!(
            "UPDATE ai_tools SET \
                name = COALESCE($2, name), \
                description = COALESCE($3, description), \
                category = COALESCE($4, category), \
                url = COALESCE($5, url), \
                subjects = COALESCE($6, subjects), \
                grade_levels = COALESCE($7, grade_levels), \
                features = COALESCE($8, features), \
                tags = COALESCE($9, tags), \
                is_active = COALESCE($10, is_active), \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AiTool>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.category)
            .bind(&input.url)
            .bind(&input.subjects)
            .bind(&input.grade_levels)
            .bind(&input.features)
            .bind(&input.tags)
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    /// Delete an AI tool by id. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM ai_tools WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Apply one tagged field change to every id in the batch.
    ///
    /// Runs under the bulk write timeout; returns the affected row count.
    pub async fn bulk_set(
        pool: &PgPool,
        ids: &[String],
        change: &AiToolBulkChange,
    ) -> Result<u64, sqlx::Error> {
        if ids.is_empty() {
            return Ok(0);
        }
        let query = match change {
            AiToolBulkChange::IsActive(_) => {
                "UPDATE ai_tools SET is_active = $2, updated_at = NOW() WHERE id = ANY($1)"
            }
            AiToolBulkChange::Category(_) => {
                "UPDATE ai_tools SET category = $2, updated_at = NOW() WHERE id = ANY($1)"
            }
        };
        let fut = async {
            let q = sqlx::query(query).bind(ids);
            let q = match change {
                AiToolBulkChange::IsActive(v) => q.bind(*v),
                AiToolBulkChange::Category(v) => q.bind(v.as_str()),
            };
            q.execute(pool).await
        };
        let result = with_bulk_timeout(fut).await?;
        Ok(result.rows_affected())
    }

    /// Delete every id in the batch. Runs under the bulk write timeout.
    pub async fn bulk_delete(pool: &PgPool, ids: &[String]) -> Result<u64, sqlx::Error> {
        if ids.is_empty() {
            return Ok(0);
        }
        let fut = async {
            sqlx::query("DELETE FROM ai_tools WHERE id = ANY($1)")
                .bind(ids)
                .execute(pool)
                .await
        };
        let result = with_bulk_timeout(fut).await?;
        Ok(result.rows_affected())
    }

    /// Return which of the given ids already exist (migration diffing).
    pub async fn find_existing_ids(
        pool: &PgPool,
        ids: &[String],
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>("SELECT id FROM ai_tools WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    /// Aggregate statistics: totals plus per-category counts.
    pub async fn stats(pool: &PgPool) -> Result<AiToolStats, sqlx::Error> {
        let (total, active): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*)::BIGINT, COUNT(*) FILTER (WHERE is_active)::BIGINT FROM ai_tools",
        )
        .fetch_one(pool)
        .await?;

        let by_category = sqlx::query_as::<_, CategoryCount>(
            "SELECT category, COUNT(*)::BIGINT AS count FROM ai_tools \
             GROUP BY category ORDER BY count DESC, category ASC",
        )
        .fetch_all(pool)
        .await?;

        Ok(AiToolStats {
            total,
            active,
            by_category,
        })
    }
}

// ---------------------------------------------------------------------------
// Internal helpers for dynamic query building
// ---------------------------------------------------------------------------

/// Typed bind value for dynamically-built AI tool queries.
enum BindValue {
    Text(String),
    Bool(bool),
}

/// Build a WHERE clause and bind values from `AiToolQuery` filter parameters.
///
/// Returns `(where_clause, bind_values, next_bind_index)`.
fn build_tool_filter(params: &AiToolQuery) -> (String, Vec<BindValue>, u32) {
    let mut conditions: Vec<String> = Vec::new();
    let mut bind_idx = 1u32;
    let mut bind_values: Vec<BindValue> = Vec::new();

    if let Some(ref category) = params.category {
        conditions.push(format!("category = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Text(category.clone()));
    }

    if let Some(ref subject) = params.subject {
        conditions.push(format!("${bind_idx} = ANY(subjects)"));
        bind_idx += 1;
        bind_values.push(BindValue::Text(subject.clone()));
    }

    if let Some(ref grade) = params.grade_level {
        conditions.push(format!("${bind_idx} = ANY(grade_levels)"));
        bind_idx += 1;
        bind_values.push(BindValue::Text(grade.clone()));
    }

    if let Some(active) = params.is_active {
        conditions.push(format!("is_active = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Bool(active));
    }

    if let Some(ref search) = params.search {
        conditions.push(format!("name ILIKE ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Text(format!("%{search}%")));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    (where_clause, bind_values, bind_idx)
}
