/// Database primary keys for generated-id tables are PostgreSQL BIGSERIAL.
/// Content entities (AI tools, lesson templates) carry catalog-assigned
/// text slugs instead and are not covered by this alias.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Reserved actor identifier for scheduler-triggered operations.
pub const SYSTEM_USER: &str = "system";
