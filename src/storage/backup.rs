//! Point-in-time database backups and rollback.
//!
//! - Timestamped whole-file copies in `<db dir>/.lal_history/`
//! - Skips a copy identical to the newest backup
//! - Rotates by count
//! - Rollback restores the newest copy verbatim

use crate::error::{LalError, Result};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// Directory name for backups, next to the database file.
pub const HISTORY_DIR_NAME: &str = ".lal_history";

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Configuration for database backups.
#[derive(Debug, Clone)]
pub struct BackupConfig {
    pub enabled: bool,
    pub max_count: usize,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_count: 10,
        }
    }
}

/// Backup entry metadata.
#[derive(Debug, Clone)]
pub struct BackupEntry {
    pub path: PathBuf,
    pub timestamp: DateTime<Utc>,
    pub size: u64,
}

/// History directory for a database path.
#[must_use]
pub fn history_dir_for(db_path: &Path) -> PathBuf {
    db_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .join(HISTORY_DIR_NAME)
}

fn db_stem(db_path: &Path) -> &str {
    db_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("issues")
}

/// Copy the database file before it is mutated.
///
/// Returns the new backup, or `None` when backups are disabled, the
/// database does not exist yet, or the newest backup is identical.
///
/// # Errors
///
/// Returns an error if the history directory or the copy cannot be written.
pub fn backup_database(db_path: &Path, config: &BackupConfig) -> Result<Option<BackupEntry>> {
    if !config.enabled || !db_path.is_file() {
        return Ok(None);
    }

    let history_dir = history_dir_for(db_path);
    if !history_dir.exists() {
        fs::create_dir_all(&history_dir)?;
    }

    let stem = db_stem(db_path);
    if let Some(latest) = latest_backup(&history_dir, stem)? {
        if files_are_identical(db_path, &latest.path)? {
            tracing::debug!(
                "Skipping backup: identical to latest {}",
                latest.path.display()
            );
            return Ok(None);
        }
    }

    let now = Utc::now();
    let backup_path = history_dir.join(format!("{stem}.{}.db", now.format(TIMESTAMP_FORMAT)));
    let size = fs::copy(db_path, &backup_path).map_err(|e| {
        LalError::with_context(format!("Failed to back up {}", db_path.display()), e)
    })?;
    tracing::info!("Created backup: {}", backup_path.display());

    rotate_backups(&history_dir, stem, config.max_count)?;

    Ok(Some(BackupEntry {
        path: backup_path,
        timestamp: now,
        size,
    }))
}

/// Restore the newest backup over the database file.
///
/// # Errors
///
/// Returns `BackupNotFound` if there is no backup, or an I/O error if the
/// copy fails.
pub fn restore_latest(db_path: &Path) -> Result<BackupEntry> {
    let history_dir = history_dir_for(db_path);
    let latest = latest_backup(&history_dir, db_stem(db_path))?.ok_or_else(|| {
        LalError::BackupNotFound {
            path: db_path.to_path_buf(),
            history_dir: history_dir.clone(),
        }
    })?;

    fs::copy(&latest.path, db_path).map_err(|e| {
        LalError::with_context(format!("Failed to restore {}", latest.path.display()), e)
    })?;
    tracing::info!(
        "Restored {} from {}",
        db_path.display(),
        latest.path.display()
    );
    Ok(latest)
}

/// List available backups sorted by date (newest first).
///
/// Files not named `<stem>.YYYYMMDD_HHMMSS.db` are ignored.
///
/// # Errors
///
/// Returns an error if the directory cannot be read.
pub fn list_backups(history_dir: &Path) -> Result<Vec<BackupEntry>> {
    if !history_dir.exists() {
        return Ok(Vec::new());
    }

    let mut backups = Vec::new();

    for entry in fs::read_dir(history_dir)? {
        let entry = entry?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        let is_db = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("db"));
        if !is_db {
            continue;
        }

        let parts: Vec<&str> = name.split('.').collect();
        if parts.len() < 3 {
            continue;
        }

        let Ok(dt) = NaiveDateTime::parse_from_str(parts[parts.len() - 2], TIMESTAMP_FORMAT) else {
            continue;
        };

        let Ok(metadata) = fs::metadata(&path) else {
            continue;
        };

        backups.push(BackupEntry {
            path,
            timestamp: Utc.from_utc_datetime(&dt),
            size: metadata.len(),
        });
    }

    // Newest first; name breaks ties within the same second.
    backups.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| b.path.cmp(&a.path)));

    Ok(backups)
}

fn backups_for_stem(history_dir: &Path, stem: &str) -> Result<Vec<BackupEntry>> {
    let prefix = format!("{stem}.");
    Ok(list_backups(history_dir)?
        .into_iter()
        .filter(|b| {
            b.path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(&prefix))
        })
        .collect())
}

fn latest_backup(history_dir: &Path, stem: &str) -> Result<Option<BackupEntry>> {
    Ok(backups_for_stem(history_dir, stem)?.into_iter().next())
}

fn rotate_backups(history_dir: &Path, stem: &str, max_count: usize) -> Result<usize> {
    let mut deleted = 0;
    for entry in backups_for_stem(history_dir, stem)?.iter().skip(max_count.max(1)) {
        fs::remove_file(&entry.path)?;
        deleted += 1;
    }
    if deleted > 0 {
        tracing::debug!("Pruned {} old backup(s)", deleted);
    }
    Ok(deleted)
}

fn files_are_identical(p1: &Path, p2: &Path) -> Result<bool> {
    let f1 = File::open(p1)?;
    let f2 = File::open(p2)?;

    if f1.metadata()?.len() != f2.metadata()?.len() {
        return Ok(false);
    }

    let mut reader1 = BufReader::new(f1);
    let mut reader2 = BufReader::new(f2);
    let mut buf1 = [0u8; 8192];
    let mut buf2 = [0u8; 8192];

    loop {
        let n1 = reader1.read(&mut buf1)?;
        if n1 == 0 {
            return Ok(true);
        }
        reader2.read_exact(&mut buf2[..n1])?;
        if buf1[..n1] != buf2[..n1] {
            return Ok(false);
        }
    }
}
