//! Scheduled automatic backups with retention cleanup.
//!
//! The scheduler owns one background task. Each iteration re-reads the
//! persisted configuration, sleeps until the next configured slot, runs a
//! backup, then applies both retention rules (age and count). A failed run
//! is recorded and the loop keeps going; only `stop()` or a cancellation
//! ends it.

use chrono::Utc;
use sqlx::PgPool;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use hoclieu_core::audit::{action_types, resources};
use hoclieu_core::backup::{BackupType, SCHEDULE_SETTING_KEY};
use hoclieu_core::schedule::{next_backup_time, ScheduleConfig};
use hoclieu_core::types::SYSTEM_USER;
use hoclieu_db::repositories::{BackupRepo, SettingRepo};

use crate::audit::AuditLogger;
use crate::error::SchedulerError;
use crate::service::{BackupService, ExportOptions};

/// Startup delay before the catch-up check, so process boot storms do not
/// all fire a backup at once.
const CATCH_UP_DELAY: std::time::Duration = std::time::Duration::from_secs(10);

/// Outcome of one scheduled run. Failures are carried here instead of
/// propagating, so one bad run cannot kill the loop.
#[derive(Debug, Clone)]
pub struct ScheduledRunResult {
    pub success: bool,
    pub backup_id: Option<Uuid>,
    pub error: Option<String>,
    /// Automatic backups removed by retention cleanup after this run.
    pub cleaned_up: u64,
}

struct RunningTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Controls the automatic backup loop and its persisted configuration.
pub struct BackupScheduler {
    pool: PgPool,
    service: BackupService,
    audit: AuditLogger,
    running: Mutex<Option<RunningTask>>,
}

impl BackupScheduler {
    pub fn new(pool: PgPool) -> Self {
        let service = BackupService::new(pool.clone());
        let audit = AuditLogger::new(pool.clone());
        Self {
            pool,
            service,
            audit,
            running: Mutex::new(None),
        }
    }

    /// Read the persisted schedule configuration, falling back to the
    /// (disabled) default when none has been stored yet.
    pub async fn load_config(pool: &PgPool) -> Result<ScheduleConfig, SchedulerError> {
        match SettingRepo::get(pool, SCHEDULE_SETTING_KEY).await? {
            Some(setting) => Ok(serde_json::from_value(setting.value)?),
            None => Ok(ScheduleConfig::default()),
        }
    }

    /// Current schedule configuration.
    pub async fn get_config(&self) -> Result<ScheduleConfig, SchedulerError> {
        Self::load_config(&self.pool).await
    }

    /// Start the background loop. Errors if it is already running or the
    /// stored configuration is disabled or invalid.
    pub async fn start(&self) -> Result<(), SchedulerError> {
        let mut running = self.running.lock().await;
        if running.is_some() {
            return Err(SchedulerError::AlreadyRunning);
        }

        let config = Self::load_config(&self.pool).await?;
        config.validate()?;
        if !config.enabled {
            return Err(SchedulerError::Disabled);
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_loop(
            self.pool.clone(),
            self.service.clone(),
            cancel.clone(),
        ));
        *running = Some(RunningTask { cancel, handle });

        info!(
            frequency = %config.frequency,
            time = config.time,
            "backup scheduler started"
        );
        Ok(())
    }

    /// Stop the background loop. A no-op when it is not running.
    pub async fn stop(&self) {
        let task = self.running.lock().await.take();
        if let Some(task) = task {
            task.cancel.cancel();
            if let Err(err) = task.handle.await {
                warn!(error = %err, "scheduler task did not shut down cleanly");
            }
            info!("backup scheduler stopped");
        }
    }

    pub async fn is_running(&self) -> bool {
        self.running.lock().await.is_some()
    }

    /// Validate and persist a new configuration. A currently running loop
    /// is restarted so the change takes effect immediately (or stopped
    /// when the new config is disabled); a stopped scheduler stays
    /// stopped, config updates alone never start it.
    pub async fn update_config(
        &self,
        actor: &str,
        config: &ScheduleConfig,
    ) -> Result<(), SchedulerError> {
        config.validate()?;
        let value = serde_json::to_value(config)?;
        SettingRepo::upsert(&self.pool, SCHEDULE_SETTING_KEY, &value).await?;

        self.audit
            .log(
                actor,
                action_types::CONFIG_CHANGE,
                resources::SETTINGS,
                Some(SCHEDULE_SETTING_KEY),
                Some(value),
            )
            .await;

        let was_running = self.is_running().await;
        self.stop().await;
        if was_running && config.enabled {
            self.start().await?;
        }
        Ok(())
    }

    /// Run one scheduled backup immediately, outside the loop.
    pub async fn run_now(&self) -> Result<ScheduledRunResult, SchedulerError> {
        let config = Self::load_config(&self.pool).await?;
        Ok(execute_scheduled_backup(&self.service, &self.pool, &config).await)
    }
}

// ---------------------------------------------------------------------------
// Background loop
// ---------------------------------------------------------------------------

async fn run_loop(pool: PgPool, service: BackupService, cancel: CancellationToken) {
    // Catch-up: if the last automatic backup is missing or older than one
    // full period (the process was down across a slot), run once now.
    tokio::select! {
        _ = cancel.cancelled() => return,
        _ = tokio::time::sleep(CATCH_UP_DELAY) => {}
    }
    if let Err(err) = maybe_catch_up(&pool, &service).await {
        error!(error = %err, "scheduler catch-up check failed");
    }

    loop {
        // Configuration is re-read every iteration so edits take effect
        // without a restart.
        let config = match BackupScheduler::load_config(&pool).await {
            Ok(config) => config,
            Err(err) => {
                error!(error = %err, "could not load schedule config; retrying in a minute");
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = tokio::time::sleep(std::time::Duration::from_secs(60)) => continue,
                }
            }
        };
        // A disabled config idles the loop rather than ending the task:
        // the running state is owned by `start`/`stop`, and a self-exiting
        // task would leave `is_running` reporting a task that is gone.
        if !config.enabled {
            info!("schedule disabled; scheduler loop idle");
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(std::time::Duration::from_secs(60)) => continue,
            }
        }

        let now = Utc::now();
        let next = match next_backup_time(&config, now) {
            Ok(next) => next,
            Err(err) => {
                error!(error = %err, "invalid schedule time; scheduler loop exiting");
                return;
            }
        };
        let wait = (next - now)
            .to_std()
            .unwrap_or(std::time::Duration::from_secs(0));
        info!(next = %next, "next scheduled backup");

        tokio::select! {
            _ = cancel.cancelled() => {
                info!("scheduler loop stopping");
                return;
            }
            _ = tokio::time::sleep(wait) => {
                let result = execute_scheduled_backup(&service, &pool, &config).await;
                if !result.success {
                    error!(error = ?result.error, "scheduled backup failed");
                }
            }
        }
    }
}

async fn maybe_catch_up(pool: &PgPool, service: &BackupService) -> Result<(), SchedulerError> {
    let config = BackupScheduler::load_config(pool).await?;
    if !config.enabled {
        return Ok(());
    }
    let latest = BackupRepo::find_latest_automatic(pool).await?;
    let overdue = match latest {
        Some(backup) => Utc::now() - backup.created_at > config.frequency.interval(),
        None => true,
    };
    if overdue {
        info!("no recent automatic backup found; running catch-up backup");
        let result = execute_scheduled_backup(service, pool, &config).await;
        if !result.success {
            error!(error = ?result.error, "catch-up backup failed");
        }
    }
    Ok(())
}

/// Run one automatic backup and the retention cleanup that follows it.
///
/// Never returns an error: every failure mode lands in the result so the
/// caller's loop stays alive.
pub async fn execute_scheduled_backup(
    service: &BackupService,
    pool: &PgPool,
    config: &ScheduleConfig,
) -> ScheduledRunResult {
    let name = format!("Scheduled backup {}", Utc::now().format("%Y-%m-%d %H:%M"));
    let options = ExportOptions {
        include_ai_tools: config.include_ai_tools,
        include_templates: config.include_templates,
        ..Default::default()
    };

    let backup = match service
        .create_backup(&name, None, SYSTEM_USER, BackupType::Automatic, &options)
        .await
    {
        Ok(backup) => backup,
        Err(err) => {
            return ScheduledRunResult {
                success: false,
                backup_id: None,
                error: Some(err.to_string()),
                cleaned_up: 0,
            };
        }
    };

    // Retention is the union of both rules: age-expired automatic backups
    // go first, then completed automatic backups ranked beyond max_backups.
    // Cleanup failures are logged but do not fail the run.
    let mut cleaned_up = 0u64;
    match service
        .cleanup_old_backups(config.retention_days as u32, Some(BackupType::Automatic))
        .await
    {
        Ok(removed) => cleaned_up += removed,
        Err(err) => warn!(error = %err, "age-based backup cleanup failed"),
    }
    match BackupRepo::automatic_ids_beyond(pool, config.max_backups).await {
        Ok(excess) if !excess.is_empty() => {
            match BackupRepo::delete_by_ids(pool, &excess).await {
                Ok(removed) => cleaned_up += removed,
                Err(err) => warn!(error = %err, "count-based backup cleanup failed"),
            }
        }
        Ok(_) => {}
        Err(err) => warn!(error = %err, "count-based backup cleanup failed"),
    }

    ScheduledRunResult {
        success: true,
        backup_id: Some(backup.id),
        error: None,
        cleaned_up,
    }
}
