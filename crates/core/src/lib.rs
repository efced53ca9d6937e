//! Pure domain types, constants, and validation for the admin data
//! lifecycle backend.
//!
//! This crate has zero internal dependencies (no DB, no async, no I/O) so
//! it can be shared by the repository layer, the backup service, and the
//! migration CLI alike.

pub mod audit;
pub mod backup;
pub mod digest;
pub mod error;
pub mod sanitize;
pub mod schedule;
pub mod types;

pub use error::CoreError;
