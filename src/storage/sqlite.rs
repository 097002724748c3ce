//! `SQLite` storage for the `Issues` table.

use crate::error::{LalError, Result};
use crate::model::{Issue, Priority};
use crate::storage::schema::{self, ISSUES_TABLE, SchemaState};
use rusqlite::{Connection, OpenFlags, Transaction, TransactionBehavior};
use std::path::{Path, PathBuf};

/// Handle to the issue database.
///
/// Owns the single connection used for a whole operation; dropping the
/// store closes it.
#[derive(Debug)]
pub struct IssueStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl IssueStore {
    /// Open an existing database file. Never creates one.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseNotFound` if the file is absent, or a database
    /// error if it cannot be opened.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(LalError::DatabaseNotFound {
                path: path.to_path_buf(),
            });
        }
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        tracing::debug!(path = %path.display(), "Opened issue database");
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Create the database file if needed and ensure the target table exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or the DDL fails.
    pub fn create(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        schema::apply_schema(&conn)?;
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Open an empty in-memory database for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn, path: None })
    }

    /// Raw connection, for inspection.
    #[must_use]
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Rows changed since this connection was opened.
    #[must_use]
    pub fn total_changes(&self) -> u64 {
        self.conn.total_changes()
    }

    /// Run `f` inside one IMMEDIATE transaction.
    ///
    /// Commits only when `f` returns `Ok`; on error the transaction is
    /// dropped and rolled back.
    ///
    /// # Errors
    ///
    /// Returns the error from `f`, or a database error from begin/commit.
    pub fn with_transaction<F, R>(&mut self, op: &str, f: F) -> Result<R>
    where
        F: FnOnce(&Transaction) -> Result<R>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        match f(&tx) {
            Ok(value) => {
                tx.commit()?;
                tracing::debug!(op, "Transaction committed");
                Ok(value)
            }
            Err(e) => {
                tracing::debug!(op, error = %e, "Transaction rolled back");
                Err(e)
            }
        }
    }

    /// Ensure the target-shape table exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the DDL fails.
    pub fn apply_schema(&self) -> Result<()> {
        schema::apply_schema(&self.conn)?;
        Ok(())
    }

    /// Whether the `Issues` table exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog query fails.
    pub fn issues_table_exists(&self) -> Result<bool> {
        Ok(schema::table_exists(&self.conn, ISSUES_TABLE)?)
    }

    /// Current column names of `Issues`, in declaration order.
    ///
    /// # Errors
    ///
    /// Returns an error if the pragma query fails.
    pub fn columns(&self) -> Result<Vec<String>> {
        Ok(schema::table_columns(&self.conn, ISSUES_TABLE)?)
    }

    /// Classify the current shape of `Issues`.
    ///
    /// # Errors
    ///
    /// Returns `TableMissing` when the table does not exist.
    pub fn schema_state(&self) -> Result<SchemaState> {
        if !self.issues_table_exists()? {
            return Err(self.table_missing());
        }
        Ok(schema::classify(self.columns()?))
    }

    /// Number of rows in `Issues`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count_issues(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM Issues", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// All issues in insertion order. Requires the migrated shape.
    ///
    /// # Errors
    ///
    /// Returns `SchemaMismatch` if the table still carries the legacy flag
    /// or lacks the priority column, or a database error.
    pub fn list_issues(&self) -> Result<Vec<Issue>> {
        let state = self.schema_state()?;
        if state != SchemaState::FullyMigrated {
            return Err(LalError::SchemaMismatch {
                expected: SchemaState::FullyMigrated.to_string(),
                found: state.to_string(),
            });
        }

        let mut stmt = self.conn.prepare(
            "SELECT Code, ShortDescription, LongDescription, Priority FROM Issues ORDER BY rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut issues = Vec::new();
        for row in rows {
            let (code, short, long, priority) = row?;
            let priority: Priority = priority.parse()?;
            issues.push(Issue::new(code, short, long, priority));
        }
        Ok(issues)
    }

    /// Insert issues in one transaction. Requires the migrated shape.
    ///
    /// # Errors
    ///
    /// Returns an error if any insert fails; nothing is written in that case.
    pub fn insert_issues(&mut self, issues: &[Issue]) -> Result<usize> {
        self.with_transaction("insert_issues", |tx| {
            let mut stmt = tx.prepare(
                "INSERT INTO Issues (Code, ShortDescription, LongDescription, Priority)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for issue in issues {
                stmt.execute((
                    &issue.code,
                    &issue.short_description,
                    &issue.long_description,
                    issue.priority.as_str(),
                ))?;
            }
            Ok(issues.len())
        })
    }

    pub(crate) fn conn_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    pub(crate) fn table_missing(&self) -> LalError {
        LalError::TableMissing {
            table: ISSUES_TABLE.to_string(),
            path: self
                .path
                .clone()
                .unwrap_or_else(|| PathBuf::from(":memory:")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_missing_file_is_not_found() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nope.db");
        let err = IssueStore::open(&path).unwrap_err();
        assert!(matches!(err, LalError::DatabaseNotFound { .. }));
        assert!(!path.exists(), "open must not create the file");
    }

    #[test]
    fn test_create_then_insert_and_list_in_order() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("issues.db");
        let mut store = IssueStore::create(&path).unwrap();

        let issues = vec![
            Issue::new("Z", "last code first", "", Priority::Low),
            Issue::new("A", "first code last", "", Priority::High),
        ];
        assert_eq!(store.insert_issues(&issues).unwrap(), 2);
        assert_eq!(store.count_issues().unwrap(), 2);
        assert_eq!(store.list_issues().unwrap(), issues);
    }

    #[test]
    fn test_insert_is_all_or_nothing() {
        let mut store = IssueStore::open_memory().unwrap();
        store.apply_schema().unwrap();
        let issues = vec![
            Issue::new("A", "", "", Priority::Low),
            Issue::new("A", "duplicate", "", Priority::Low),
        ];
        assert!(store.insert_issues(&issues).is_err());
        assert_eq!(store.count_issues().unwrap(), 0);
    }

    #[test]
    fn test_schema_state_missing_table() {
        let store = IssueStore::open_memory().unwrap();
        let err = store.schema_state().unwrap_err();
        assert!(matches!(err, LalError::TableMissing { .. }));
    }

    #[test]
    fn test_list_requires_migrated_shape() {
        let store = IssueStore::open_memory().unwrap();
        store
            .connection()
            .execute_batch(schema::LEGACY_SCHEMA_SQL)
            .unwrap();
        let err = store.list_issues().unwrap_err();
        assert!(matches!(err, LalError::SchemaMismatch { .. }));
    }
}
