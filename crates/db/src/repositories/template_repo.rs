//! Repository for the `templates` table.

use sqlx::PgPool;

use crate::models::template::{
    SubjectCount, Template, TemplateBulkChange, TemplateQuery, TemplateStats, UpdateTemplate,
    UpsertTemplate,
};
use crate::repositories::with_bulk_timeout;

/// Column list for `templates` SELECT queries.
const COLUMNS: &str = "\
    id, name, description, file_url, subjects, grade_levels, \
    features, tags, is_active, created_at, updated_at";

/// Provides CRUD, bulk, and aggregate operations for lesson templates.
pub struct TemplateRepo;

impl TemplateRepo {
    /// Insert a new template, returning the created row.
    pub async fn create(pool: &PgPool, input: &UpsertTemplate) -> Result<Template, sqlx::Error> {
        let query = format!(
            "INSERT INTO templates \
                (id, name, description, file_url, subjects, grade_levels, features, tags, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Template>(&query)
            .bind(&input.id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.file_url)
            .bind(&input.subjects)
            .bind(&input.grade_levels)
            .bind(&input.features)
            .bind(&input.tags)
            .bind(input.is_active)
            .fetch_one(pool)
            .await
    }

    /// Insert or fully replace a template by id (import path).
    pub async fn upsert(pool: &PgPool, input: &UpsertTemplate) -> Result<Template, sqlx::Error> {
        let query = format!(
            "INSERT INTO templates \
                (id, name, description, file_url, subjects, grade_levels, features, tags, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (id) DO UPDATE SET \
                name = EXCLUDED.name, \
                description = EXCLUDED.description, \
                file_url = EXCLUDED.file_url, \
                subjects = EXCLUDED.subjects, \
                grade_levels = EXCLUDED.grade_levels, \
                features = EXCLUDED.features, \
                tags = EXCLUDED.tags, \
                is_active = EXCLUDED.is_active, \
                updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Template>(&query)
            .bind(&input.id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.file_url)
            .bind(&input.subjects)
            .bind(&input.grade_levels)
            .bind(&input.features)
            .bind(&input.tags)
            .bind(input.is_active)
            .fetch_one(pool)
            .await
    }

    /// Find a template by id.
    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Template>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM templates WHERE id = $1");
        sqlx::query_as::<_, Template>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List templates with filtering and pagination.
    pub async fn list(pool: &PgPool, params: &TemplateQuery) -> Result<Vec<Template>, sqlx::Error> {
        let limit = params.limit.unwrap_or(50).min(500);
        let offset = params.offset.unwrap_or(0);

        let (where_clause, bind_values, bind_idx) = build_template_filter(params);

        let query = format!(
            "SELECT {COLUMNS} FROM templates {where_clause} \
             ORDER BY name ASC \
             LIMIT ${bind_idx} OFFSET ${}",
            bind_idx + 1
        );

        let mut q = sqlx::query_as::<_, Template>(&query);
        for val in &bind_values {
            q = match val {
                BindValue::Text(v) => q.bind(v.as_str()),
                BindValue::Bool(v) => q.bind(*v),
            };
        }
        q.bind(limit).bind(offset).fetch_all(pool).await
    }

    /// Count templates matching the given filter.
    pub async fn count(pool: &PgPool, params: &TemplateQuery) -> Result<i64, sqlx::Error> {
        let (where_clause, bind_values, _) = build_template_filter(params);
        let query = format!("SELECT COUNT(*)::BIGINT FROM templates {where_clause}");
        let mut q = sqlx::query_scalar::<_, i64>(&query);
        for val in &bind_values {
            q = match val {
                BindValue::Text(v) => q.bind(v.as_str()),
                BindValue::Bool(v) => q.bind(*v),
            };
        }
        q.fetch_one(pool).await
    }

    /// Fetch every template, unbounded, ordered by id (export path).
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Template>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM templates ORDER BY id ASC");
        sqlx::query_as::<_, Template>(&query).fetch_all(pool).await
    }

    /// Fetch every template matching optional subject/grade filters,
    /// unbounded (filtered export; one value per filter field).
    pub async fn list_all_filtered(
        pool: &PgPool,
        subject: Option<&str>,
        grade_level: Option<&str>,
    ) -> Result<Vec<Template>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM templates \
             WHERE ($1::TEXT IS NULL OR $1 = ANY(subjects)) \
               AND ($2::TEXT IS NULL OR $2 = ANY(grade_levels)) \
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, Template>(&query)
            .bind(subject)
            .bind(grade_level)
            .fetch_all(pool)
            .await
    }

    /// Update a template. Only non-`None` fields are applied.
    pub async fn update(
        pool: &PgPool,
        id: &str,
        input: &UpdateTemplate,
    ) -> Result<Option<Template>, sqlx::Error> {
        let query = format!(
            "UPDATE templates SET \
                name = COALESCE($2, name), \
                description = COALESCE($3, description), \
                file_url = COALESCE($4, file_url), \
                subjects = COALESCE($5, subjects), \
                grade_levels = COALESCE($6, grade_levels), \
                features = COALESCE($7, features), \
                tags = COALESCE($8, tags), \
                is_active = COALESCE($9, is_active), \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Template>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.file_url)
            .bind(&input.subjects)
            .bind(&input.grade_levels)
            .bind(&input.features)
            .bind(&input.tags)
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    /// Delete a template by id. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM templates WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Apply one tagged field change to every id in the batch.
    pub async fn bulk_set(
        pool: &PgPool,
        ids: &[String],
        change: &TemplateBulkChange,
    ) -> Result<u64, sqlx::Error> {
        if ids.is_empty() {
            return Ok(0);
        }
        let query = match change {
            TemplateBulkChange::IsActive(_) => {
                "UPDATE templates SET is_active = $2, updated_at = NOW() WHERE id = ANY($1)"
            }
            TemplateBulkChange::AddTag(_) => {
                "UPDATE templates SET tags = array_append(tags, $2), updated_at = NOW() \
                 WHERE id = ANY($1) AND NOT ($2 = ANY(tags))"
            }
        };
        let fut = async {
            let q = sqlx::query(query).bind(ids);
            let q = match change {
                TemplateBulkChange::IsActive(v) => q.bind(*v),
                TemplateBulkChange::AddTag(v) => q.bind(v.as_str()),
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
            sqlx::query("DELETE FROM templates WHERE id = ANY($1)")
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
        sqlx::query_scalar::<_, String>("SELECT id FROM templates WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    /// Aggregate statistics: totals plus per-subject counts.
    pub async fn stats(pool: &PgPool) -> Result<TemplateStats, sqlx::Error> {
        let (total, active): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*)::BIGINT, COUNT(*) FILTER (WHERE is_active)::BIGINT FROM templates",
        )
        .fetch_one(pool)
        .await?;

        let by_subject = sqlx::query_as::<_, SubjectCount>(
            "SELECT UNNEST(subjects) AS subject, COUNT(*)::BIGINT AS count FROM templates \
             GROUP BY subject ORDER BY count DESC, subject ASC",
        )
        .fetch_all(pool)
        .await?;

        Ok(TemplateStats {
            total,
            active,
            by_subject,
        })
    }
}

// ---------------------------------------------------------------------------
// Internal helpers for dynamic query building
// ---------------------------------------------------------------------------

/// Typed bind value for dynamically-built template queries.
enum BindValue {
    Text(String),
    Bool(bool),
}

/// Build a WHERE clause and bind values from `TemplateQuery` parameters.
fn build_template_filter(params: &TemplateQuery) -> (String, Vec<BindValue>, u32) {
    let mut conditions: Vec<String> = Vec::new();
    let mut bind_idx = 1u32;
    let mut bind_values: Vec<BindValue> = Vec::new();

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
