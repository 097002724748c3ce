use super::config_with_db;
use crate::cli::MigrateArgs;
use crate::config::CliOverrides;
use crate::error::Result;
use crate::storage::backup::{self, BackupConfig, BackupEntry};
use crate::storage::migrate::{self, DropMethod, MigrationPolicy, MigrationReport};
use crate::storage::IssueStore;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Serialize)]
struct MigrateOutput<'a> {
    db: &'a Path,
    #[serde(flatten)]
    report: &'a MigrationReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    backup: Option<&'a Path>,
}

#[derive(Serialize)]
struct RollbackOutput<'a> {
    db: &'a Path,
    restored_from: &'a Path,
}

/// Execute the migrate command.
///
/// A backup is taken only when the migration will change the database.
///
/// # Errors
///
/// Returns `DatabaseNotFound`, a schema error, or a database error. A
/// failed migration leaves the table as it was.
pub fn execute(args: &MigrateArgs, json: bool, cli: &CliOverrides) -> Result<()> {
    let mut overrides = cli.clone();
    if args.default_priority.is_some() {
        overrides.default_priority = args.default_priority;
    }
    let config = config_with_db(args.db.as_ref(), &overrides)?;
    let db_path = config.db_path.as_path();

    if args.rollback {
        let entry = backup::restore_latest(db_path)?;
        print_rollback(db_path, &entry, json)?;
        return Ok(());
    }

    let policy = MigrationPolicy {
        default_priority: config.default_priority,
        drop_strategy: args.drop_strategy.unwrap_or_default(),
    };

    let writes = {
        let store = IssueStore::open(db_path)?;
        migrate::plan(store.schema_state()?).writes()
    };

    let backup_entry = if writes && !args.no_backup {
        let backup_config = BackupConfig {
            enabled: true,
            max_count: config.backup_keep,
        };
        backup::backup_database(db_path, &backup_config)?
    } else {
        None
    };

    let mut store = IssueStore::open(db_path)?;
    let report = migrate::migrate(&mut store, &policy)?;
    drop(store);

    let backup_path: Option<PathBuf> = backup_entry.map(|entry| entry.path);
    if json {
        let output = MigrateOutput {
            db: db_path,
            report: &report,
            backup: backup_path.as_deref(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if report.is_noop() {
        println!("Database already migrated.");
        return Ok(());
    }

    let method = match report.drop_method {
        Some(DropMethod::Native) => "dropped in place",
        Some(DropMethod::ShadowTable) => "table rebuilt",
        None => "kept",
    };
    println!(
        "Migrated {} from {}: {} row(s) backfilled, IsUrgent {method}.",
        db_path.display(),
        report.state,
        report.rows
    );
    if let Some(path) = backup_path {
        println!("Backup: {}", path.display());
    }
    Ok(())
}

fn print_rollback(db_path: &Path, entry: &BackupEntry, json: bool) -> Result<()> {
    if json {
        let output = RollbackOutput {
            db: db_path,
            restored_from: &entry.path,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!(
            "Restored {} from {}",
            db_path.display(),
            entry.path.display()
        );
    }
    Ok(())
}
