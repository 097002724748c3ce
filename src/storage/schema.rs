//! `Issues` table definitions and schema-shape inspection.

use rusqlite::{Connection, OptionalExtension, Result};

pub const ISSUES_TABLE: &str = "Issues";
pub const SHADOW_TABLE: &str = "Issues_new";
pub const LEGACY_COLUMN: &str = "IsUrgent";
pub const PRIORITY_COLUMN: &str = "Priority";

/// Columns kept verbatim by the migration, in table order.
pub const TARGET_COLUMNS: [&str; 4] = ["Code", "ShortDescription", "LongDescription", "Priority"];

/// Target shape of the `Issues` table.
pub const TARGET_SCHEMA_SQL: &str = r"
    CREATE TABLE IF NOT EXISTS Issues (
        Code TEXT NOT NULL PRIMARY KEY,
        ShortDescription TEXT NOT NULL,
        LongDescription TEXT NOT NULL,
        Priority TEXT NOT NULL DEFAULT 'MEDIUM',
        CHECK (Priority IN ('LOW', 'MEDIUM', 'HIGH'))
    );
";

/// Shadow table used when the legacy column cannot be dropped in place.
pub const SHADOW_SCHEMA_SQL: &str = r"
    CREATE TABLE Issues_new (
        Code TEXT NOT NULL PRIMARY KEY,
        ShortDescription TEXT NOT NULL,
        LongDescription TEXT NOT NULL,
        Priority TEXT NOT NULL DEFAULT 'MEDIUM',
        CHECK (Priority IN ('LOW', 'MEDIUM', 'HIGH'))
    );
";

/// Pre-priority shape, as created by older builds of the service.
pub const LEGACY_SCHEMA_SQL: &str = r"
    CREATE TABLE IF NOT EXISTS Issues (
        Code TEXT NOT NULL PRIMARY KEY,
        ShortDescription TEXT NOT NULL,
        LongDescription TEXT NOT NULL,
        IsUrgent INTEGER NOT NULL DEFAULT 0
    );
";

/// The `Priority` CHECK clause with whitespace removed, upper-cased.
const PRIORITY_CHECK_COMPACT: &str = "CHECK(PRIORITYIN('LOW','MEDIUM','HIGH'))";

/// First SQLite release with `ALTER TABLE ... DROP COLUMN`.
pub const DROP_COLUMN_MIN_VERSION: i32 = 3_035_000;

/// Observed shape of the `Issues` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaState {
    /// Legacy flag only.
    Untouched,
    /// Both legacy flag and priority column.
    PartiallyMigrated,
    /// Priority column only.
    FullyMigrated,
    /// Neither column.
    Inconsistent,
}

impl SchemaState {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Untouched => "untouched",
            Self::PartiallyMigrated => "partially_migrated",
            Self::FullyMigrated => "fully_migrated",
            Self::Inconsistent => "inconsistent",
        }
    }
}

impl std::fmt::Display for SchemaState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a column set. Identifier matching is ASCII case-insensitive.
#[must_use]
pub fn classify<I, S>(columns: I) -> SchemaState
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut has_legacy = false;
    let mut has_priority = false;
    for column in columns {
        let column = column.as_ref();
        has_legacy |= column.eq_ignore_ascii_case(LEGACY_COLUMN);
        has_priority |= column.eq_ignore_ascii_case(PRIORITY_COLUMN);
    }

    match (has_legacy, has_priority) {
        (true, false) => SchemaState::Untouched,
        (true, true) => SchemaState::PartiallyMigrated,
        (false, true) => SchemaState::FullyMigrated,
        (false, false) => SchemaState::Inconsistent,
    }
}

/// Check whether a table exists.
///
/// # Errors
///
/// Returns an error if the catalog query fails.
pub fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    conn.prepare("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1")?
        .exists([table])
}

/// Column names of a table, in declaration order.
///
/// # Errors
///
/// Returns an error if the pragma query fails.
pub fn table_columns(conn: &Connection, table: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1) ORDER BY cid")?;
    stmt.query_map([table], |row| row.get::<_, String>(0))?
        .collect()
}

/// Whether the linked SQLite can drop a column in place.
#[must_use]
pub fn supports_drop_column() -> bool {
    rusqlite::version_number() >= DROP_COLUMN_MIN_VERSION
}

/// Whether `Issues.Priority` is already declared `NOT NULL` with the
/// canonical-name CHECK, i.e. dropping the legacy column in place leaves
/// the target shape.
///
/// # Errors
///
/// Returns an error if the catalog queries fail.
pub fn priority_column_sealed(conn: &Connection) -> Result<bool> {
    let not_null: Option<bool> = conn
        .query_row(
            "SELECT \"notnull\" FROM pragma_table_info(?1) WHERE name = ?2 COLLATE NOCASE",
            [ISSUES_TABLE, PRIORITY_COLUMN],
            |row| row.get(0),
        )
        .optional()?;
    if not_null != Some(true) {
        return Ok(false);
    }

    let sql: Option<String> = conn
        .query_row(
            "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [ISSUES_TABLE],
            |row| row.get::<_, Option<String>>(0),
        )
        .optional()?
        .flatten();
    Ok(sql.is_some_and(|sql| {
        let compact: String = sql.chars().filter(|c| !c.is_whitespace()).collect();
        compact.to_uppercase().contains(PRIORITY_CHECK_COMPACT)
    }))
}

/// Create the target-shape `Issues` table if absent.
///
/// # Errors
///
/// Returns an error if the DDL fails.
pub fn apply_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(TARGET_SCHEMA_SQL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_all_states() {
        let base = ["Code", "ShortDescription", "LongDescription"];
        let with = |extra: &[&'static str]| -> Vec<&'static str> {
            base.iter().chain(extra.iter()).copied().collect()
        };

        assert_eq!(classify(with(&["IsUrgent"])), SchemaState::Untouched);
        assert_eq!(
            classify(with(&["IsUrgent", "Priority"])),
            SchemaState::PartiallyMigrated
        );
        assert_eq!(classify(with(&["Priority"])), SchemaState::FullyMigrated);
        assert_eq!(classify(with(&[])), SchemaState::Inconsistent);
        assert_eq!(classify(Vec::<String>::new()), SchemaState::Inconsistent);
    }

    #[test]
    fn test_classify_ignores_identifier_case() {
        assert_eq!(classify(["code", "isurgent"]), SchemaState::Untouched);
        assert_eq!(classify(["PRIORITY"]), SchemaState::FullyMigrated);
    }

    #[test]
    fn test_apply_schema_creates_target_shape() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).unwrap();
        assert!(table_exists(&conn, ISSUES_TABLE).unwrap());
        assert_eq!(table_columns(&conn, ISSUES_TABLE).unwrap(), TARGET_COLUMNS);
        assert_eq!(
            classify(table_columns(&conn, ISSUES_TABLE).unwrap()),
            SchemaState::FullyMigrated
        );

        // Idempotent
        apply_schema(&conn).unwrap();
    }

    #[test]
    fn test_target_schema_rejects_unknown_priority() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).unwrap();
        let err = conn.execute(
            "INSERT INTO Issues VALUES ('A', 's', 'l', 'URGENT')",
            [],
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_priority_column_sealed() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(!priority_column_sealed(&conn).unwrap());

        conn.execute_batch(LEGACY_SCHEMA_SQL).unwrap();
        assert!(!priority_column_sealed(&conn).unwrap());

        conn.execute("ALTER TABLE Issues ADD COLUMN Priority TEXT", [])
            .unwrap();
        assert!(!priority_column_sealed(&conn).unwrap());

        let target = Connection::open_in_memory().unwrap();
        apply_schema(&target).unwrap();
        assert!(priority_column_sealed(&target).unwrap());
    }

    #[test]
    fn test_missing_table_has_no_columns() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(!table_exists(&conn, ISSUES_TABLE).unwrap());
        assert!(table_columns(&conn, ISSUES_TABLE).unwrap().is_empty());
    }
}
