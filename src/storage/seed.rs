//! Reseed an empty `Issues` table from an `issues.csv` snapshot.

use crate::error::{LalError, Result};
use crate::format::csv;
use crate::storage::schema::SchemaState;
use crate::storage::sqlite::IssueStore;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Default snapshot file name, looked up beside the database.
pub const SNAPSHOT_FILE_NAME: &str = "issues.csv";

/// Outcome of a seed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub csv_path: PathBuf,
    /// Rows inserted by this run.
    pub inserted: usize,
    /// Rows already present when the table was not empty.
    pub existing: usize,
}

impl SeedReport {
    #[must_use]
    pub const fn skipped(&self) -> bool {
        self.inserted == 0 && self.existing > 0
    }
}

/// Snapshot path next to `db_path`.
#[must_use]
pub fn default_snapshot_path(db_path: &Path) -> PathBuf {
    db_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .join(SNAPSHOT_FILE_NAME)
}

/// Insert every snapshot row into an empty, migrated table.
///
/// A table that already has rows is left untouched.
///
/// # Errors
///
/// Returns `DatabaseNotFound` for a missing file, `TableMissing` or
/// `SchemaMismatch` if the table is not in its migrated shape, `Csv` for a
/// malformed snapshot, or a database error (in which case nothing is
/// inserted).
pub fn seed_from_csv(db_path: &Path, csv_path: Option<&Path>) -> Result<SeedReport> {
    let mut store = IssueStore::open(db_path)?;
    let csv_path = csv_path.map_or_else(|| default_snapshot_path(db_path), Path::to_path_buf);
    seed_store(&mut store, &csv_path)
}

/// Seed an already-open store.
///
/// # Errors
///
/// See [`seed_from_csv`].
pub fn seed_store(store: &mut IssueStore, csv_path: &Path) -> Result<SeedReport> {
    let state = store.schema_state()?;
    if state != SchemaState::FullyMigrated {
        return Err(LalError::SchemaMismatch {
            expected: SchemaState::FullyMigrated.to_string(),
            found: state.to_string(),
        });
    }

    let existing = store.count_issues()?;
    if existing > 0 {
        tracing::info!(existing, "Issues table not empty; skipping seed");
        return Ok(SeedReport {
            csv_path: csv_path.to_path_buf(),
            inserted: 0,
            existing,
        });
    }

    let text = fs::read_to_string(csv_path).map_err(|e| {
        LalError::with_context(format!("Failed to read {}", csv_path.display()), e)
    })?;
    let issues = csv::read_issues(&text)?;
    let inserted = store.insert_issues(&issues)?;
    tracing::info!(inserted, csv = %csv_path.display(), "Seeded issues");

    Ok(SeedReport {
        csv_path: csv_path.to_path_buf(),
        inserted,
        existing: 0,
    })
}
