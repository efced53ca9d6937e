//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create/upsert DTO for inserts
//! - A `Deserialize` update DTO (all `Option` fields) for patches

pub mod ai_tool;
pub mod audit;
pub mod backup;
pub mod setting;
pub mod template;
