//! Admin command-line tool for backups, restore, and catalog migration.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use hoclieu_backup::migration::MigrationOptions;
use hoclieu_backup::service::{ExportOptions, ImportOptions, ImportReport};
use hoclieu_backup::{BackupScheduler, BackupService, MigrationRunner};
use hoclieu_core::backup::{BackupPayload, BackupType};
use hoclieu_core::sanitize::sanitize_filename;
use hoclieu_core::schedule::Frequency;

#[derive(Parser)]
#[command(name = "hoclieu", about = "Học liệu admin tooling: backups and catalog migration")]
struct Cli {
    /// Actor recorded in the audit trail.
    #[arg(long, global = true, default_value = "admin")]
    actor: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply the seed catalog to the database.
    Migrate {
        /// Replace catalog entities that already exist.
        #[arg(long)]
        overwrite: bool,
        /// Report what would change without writing.
        #[arg(long)]
        dry_run: bool,
        /// Skip the pre-migration backup snapshot.
        #[arg(long)]
        no_snapshot: bool,
        /// Show which catalog ids are present or pending, then exit.
        #[arg(long, conflicts_with_all = ["overwrite", "dry_run", "rollback"])]
        status: bool,
        /// Remove every catalog-owned entity.
        #[arg(long, conflicts_with_all = ["overwrite", "dry_run"])]
        rollback: bool,
    },
    /// Create a manual backup.
    Backup {
        #[arg(long, default_value = "Manual backup")]
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// List stored backups, newest first.
    List {
        /// Filter by type: manual or automatic.
        #[arg(long)]
        backup_type: Option<String>,
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// Verify a stored backup's integrity without restoring it.
    Verify { id: Uuid },
    /// Restore entities from a stored backup.
    Restore {
        id: Uuid,
        /// Replace entities whose id already exists.
        #[arg(long)]
        overwrite: bool,
        /// Report what would change without writing.
        #[arg(long)]
        dry_run: bool,
        /// Skip the pre-restore snapshot.
        #[arg(long)]
        no_pre_backup: bool,
    },
    /// Export current data as a payload file.
    Export {
        /// Output path for the JSON payload. Defaults to a dated filename
        /// carrying the actor name.
        #[arg(long)]
        output: Option<std::path::PathBuf>,
    },
    /// Import a payload file.
    Import {
        input: std::path::PathBuf,
        #[arg(long)]
        overwrite: bool,
        #[arg(long)]
        dry_run: bool,
        #[arg(long)]
        no_pre_backup: bool,
        /// Skip envelope and checksum validation of the payload.
        #[arg(long)]
        no_validate: bool,
    },
    /// Show aggregate backup statistics.
    Stats,
    /// Show or change the automatic backup schedule.
    Schedule {
        #[command(subcommand)]
        command: ScheduleCommand,
    },
    /// Run the scheduler in the foreground until interrupted.
    Serve,
}

#[derive(Subcommand)]
enum ScheduleCommand {
    /// Print the stored schedule configuration.
    Show,
    /// Update the schedule. Unspecified fields keep their stored value.
    Set {
        #[arg(long)]
        enabled: Option<bool>,
        /// daily, weekly, or monthly.
        #[arg(long)]
        frequency: Option<String>,
        /// Trigger time, HH:MM (24-hour, UTC).
        #[arg(long)]
        time: Option<String>,
        #[arg(long)]
        retention_days: Option<i64>,
        #[arg(long)]
        max_backups: Option<i64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hoclieu=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let database_url =
        std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("could not connect to the database")?;
    hoclieu_db::health_check(&pool)
        .await
        .context("database health check failed")?;

    run(cli, pool).await
}

async fn run(cli: Cli, pool: PgPool) -> anyhow::Result<()> {
    let service = BackupService::new(pool.clone());
    let actor = cli.actor.as_str();

    match cli.command {
        Command::Migrate {
            overwrite,
            dry_run,
            no_snapshot,
            status,
            rollback,
        } => {
            let runner = MigrationRunner::new(pool);
            if status {
                let status = runner.status().await?;
                println!(
                    "AI tools:  {}/{} present, pending: {:?}",
                    status.ai_tools.present.len(),
                    status.ai_tools.total,
                    status.ai_tools.pending
                );
                println!(
                    "Templates: {}/{} present, pending: {:?}",
                    status.templates.present.len(),
                    status.templates.total,
                    status.templates.pending
                );
                return Ok(());
            }
            if rollback {
                let (tools, templates) = runner.rollback(actor).await?;
                println!("Removed {tools} AI tool(s) and {templates} template(s)");
                return Ok(());
            }
            let report = runner
                .run(
                    actor,
                    &MigrationOptions {
                        overwrite,
                        dry_run,
                        snapshot: !no_snapshot,
                    },
                )
                .await?;
            print_counts("AI tools", &report.ai_tools, report.dry_run);
            print_counts("Templates", &report.templates, report.dry_run);
            if let Some(id) = report.snapshot_id {
                println!("Pre-migration snapshot: {id}");
            }
            for warning in &report.warnings {
                eprintln!("  warning: {warning}");
            }
            for err in &report.errors {
                eprintln!("  {}[{}]: {}", err.collection, err.id, err.message);
            }
            if !report.errors.is_empty() {
                bail!("{} catalog item(s) failed to apply", report.errors.len());
            }
        }

        Command::Backup { name, description } => {
            let backup = service
                .create_backup(
                    &name,
                    description.as_deref(),
                    actor,
                    BackupType::Manual,
                    &ExportOptions::default(),
                )
                .await?;
            println!(
                "Backup {} created: {} AI tool(s), {} template(s), {} bytes, checksum {}",
                backup.id,
                backup.ai_tools_count,
                backup.templates_count,
                backup.size_bytes,
                backup.checksum.as_deref().unwrap_or("-")
            );
        }

        Command::List { backup_type, limit } => {
            let filter = backup_type
                .as_deref()
                .map(BackupType::from_str)
                .transpose()?;
            let backups = service.get_backups(filter, limit, 0).await?;
            if backups.is_empty() {
                println!("No backups found");
            }
            for b in backups {
                println!(
                    "{}  {:9}  {:9}  {:>4} tools  {:>4} templates  {}  {}",
                    b.id,
                    b.backup_type,
                    b.status,
                    b.ai_tools_count,
                    b.templates_count,
                    b.created_at.format("%Y-%m-%d %H:%M"),
                    b.name
                );
            }
        }

        Command::Verify { id } => {
            let report = service.verify_backup(id).await?;
            println!("Checksum match:  {}", report.checksum_match);
            println!("Data integrity:  {}", report.data_integrity);
            for issue in &report.issues {
                println!("  issue: {issue}");
            }
            if !report.is_valid() {
                bail!("backup {id} failed verification");
            }
            println!("Backup {id} is valid");
        }

        Command::Restore {
            id,
            overwrite,
            dry_run,
            no_pre_backup,
        } => {
            let report = service
                .restore_backup(
                    actor,
                    id,
                    &ImportOptions {
                        overwrite,
                        dry_run,
                        pre_import_backup: !no_pre_backup,
                        ..Default::default()
                    },
                )
                .await?;
            print_import_report(&report)?;
        }

        Command::Export { output } => {
            let payload = service
                .export_data(actor, None, &ExportOptions::default())
                .await?;
            let output = output.unwrap_or_else(|| {
                // The actor name is caller-supplied; keep it path-safe.
                sanitize_filename(&format!(
                    "hoclieu-export-{}-{}.json",
                    actor,
                    chrono::Utc::now().format("%Y%m%d")
                ))
                .into()
            });
            let (tools, templates) = payload.counts();
            std::fs::write(&output, serde_json::to_string_pretty(&payload)?)
                .with_context(|| format!("could not write {}", output.display()))?;
            println!(
                "Exported {tools} AI tool(s) and {templates} template(s) to {}",
                output.display()
            );
        }

        Command::Import {
            input,
            overwrite,
            dry_run,
            no_pre_backup,
            no_validate,
        } => {
            let text = std::fs::read_to_string(&input)
                .with_context(|| format!("could not read {}", input.display()))?;
            let payload: BackupPayload =
                serde_json::from_str(&text).context("input is not a valid payload file")?;
            let report = service
                .import_data(
                    actor,
                    &payload,
                    &ImportOptions {
                        overwrite,
                        validate_data: !no_validate,
                        dry_run,
                        pre_import_backup: !no_pre_backup,
                    },
                )
                .await?;
            print_import_report(&report)?;
        }

        Command::Stats => {
            let stats = service.stats().await?;
            println!("Total backups:   {}", stats.total);
            println!("  completed:     {}", stats.completed);
            println!("  failed:        {}", stats.failed);
            println!("  manual:        {}", stats.manual);
            println!("  automatic:     {}", stats.automatic);
            println!("Total size:      {} bytes", stats.total_size_bytes);
            match stats.last_automatic_at {
                Some(at) => println!("Last automatic:  {}", at.format("%Y-%m-%d %H:%M")),
                None => println!("Last automatic:  never"),
            }
        }

        Command::Schedule { command } => {
            let scheduler = BackupScheduler::new(pool.clone());
            match command {
                ScheduleCommand::Show => {
                    let config = scheduler.get_config().await?;
                    println!("{}", serde_json::to_string_pretty(&config)?);
                }
                ScheduleCommand::Set {
                    enabled,
                    frequency,
                    time,
                    retention_days,
                    max_backups,
                } => {
                    let mut config = scheduler.get_config().await?;
                    if let Some(enabled) = enabled {
                        config.enabled = enabled;
                    }
                    if let Some(frequency) = frequency {
                        config.frequency = Frequency::from_str(&frequency)?;
                    }
                    if let Some(time) = time {
                        config.time = time;
                    }
                    if let Some(days) = retention_days {
                        config.retention_days = days;
                    }
                    if let Some(max) = max_backups {
                        config.max_backups = max;
                    }
                    config.validate()?;
                    scheduler.update_config(actor, &config).await?;
                    println!("{}", serde_json::to_string_pretty(&config)?);
                }
            }
        }

        Command::Serve => {
            let scheduler = BackupScheduler::new(pool.clone());
            scheduler.start().await?;
            println!("Scheduler running; press Ctrl-C to stop");
            tokio::signal::ctrl_c().await.context("signal handler failed")?;
            scheduler.stop().await;
        }
    }

    Ok(())
}

fn print_counts(label: &str, counts: &hoclieu_backup::service::ImportCounts, dry_run: bool) {
    let prefix = if dry_run { "[dry run] " } else { "" };
    println!(
        "{prefix}{label}: {} created, {} updated, {} skipped, {} failed",
        counts.created, counts.updated, counts.skipped, counts.failed
    );
}

fn print_import_report(report: &ImportReport) -> anyhow::Result<()> {
    print_counts("AI tools", &report.ai_tools, report.dry_run);
    print_counts("Templates", &report.templates, report.dry_run);
    if let Some(id) = report.pre_import_backup_id {
        println!("Pre-import snapshot: {id}");
    }
    for err in &report.errors {
        eprintln!("  {}[{}]: {}", err.collection, err.id, err.message);
    }
    if !report.is_clean() {
        bail!("{} item(s) failed to import", report.errors.len());
    }
    Ok(())
}
