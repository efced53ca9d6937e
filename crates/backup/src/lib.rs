//! Data lifecycle management: checksummed backups, restore with conflict
//! policy, scheduled retention, and catalog seed migrations.
//!
//! The service types here are constructed explicitly by the process
//! composition root and injected where needed; there is no global state.

pub mod audit;
pub mod catalog;
pub mod error;
pub mod migration;
pub mod scheduler;
pub mod service;

pub use error::{BackupError, MigrationError, SchedulerError};
pub use migration::MigrationRunner;
pub use scheduler::BackupScheduler;
pub use service::BackupService;
