#![allow(dead_code)]

use lunch_and_learn::storage::schema::LEGACY_SCHEMA_SQL;
use rusqlite::Connection;
use std::path::Path;

/// Rows used by the end-to-end migration scenario.
pub const LEGACY_ROWS: &[(&str, &str, &str, i64)] =
    &[("A", "s1", "l1", 1), ("B", "s2", "l2", 0)];

/// Create a database with the pre-priority `Issues` table.
pub fn legacy_db(path: &Path, rows: &[(&str, &str, &str, i64)]) {
    let conn = Connection::open(path).expect("open legacy db");
    conn.execute_batch(LEGACY_SCHEMA_SQL).expect("legacy schema");
    for (code, short, long, urgent) in rows {
        conn.execute(
            "INSERT INTO Issues (Code, ShortDescription, LongDescription, IsUrgent)
             VALUES (?1, ?2, ?3, ?4)",
            (code, short, long, urgent),
        )
        .expect("insert legacy row");
    }
}

/// Create a database whose `Issues` table has neither urgency column.
pub fn inconsistent_db(path: &Path) {
    let conn = Connection::open(path).expect("open db");
    conn.execute_batch(
        "CREATE TABLE Issues (
            Code TEXT NOT NULL PRIMARY KEY,
            ShortDescription TEXT NOT NULL,
            LongDescription TEXT NOT NULL
        );
        INSERT INTO Issues VALUES ('A', 's', 'l');",
    )
    .expect("inconsistent schema");
}

/// Column names of `Issues`, in declaration order.
pub fn columns(path: &Path) -> Vec<String> {
    let conn = Connection::open(path).expect("open db");
    let mut stmt = conn
        .prepare("SELECT name FROM pragma_table_info('Issues') ORDER BY cid")
        .expect("prepare");
    stmt.query_map([], |row| row.get::<_, String>(0))
        .expect("query")
        .collect::<Result<_, _>>()
        .expect("rows")
}

/// All rows as `(code, short, long, priority)` in insertion order.
pub fn priority_rows(path: &Path) -> Vec<(String, String, String, String)> {
    let conn = Connection::open(path).expect("open db");
    let mut stmt = conn
        .prepare(
            "SELECT Code, ShortDescription, LongDescription, Priority FROM Issues ORDER BY rowid",
        )
        .expect("prepare");
    stmt.query_map([], |row| {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
    })
    .expect("query")
    .collect::<Result<_, _>>()
    .expect("rows")
}

/// Stored `CREATE TABLE` text of `Issues`.
pub fn table_sql(path: &Path) -> String {
    let conn = Connection::open(path).expect("open db");
    conn.query_row(
        "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = 'Issues'",
        [],
        |row| row.get(0),
    )
    .expect("table sql")
}

/// `(name, type, notnull, default)` for each column of `Issues`.
pub fn column_shape(path: &Path) -> Vec<(String, String, bool, Option<String>)> {
    let conn = Connection::open(path).expect("open db");
    let mut stmt = conn
        .prepare(
            "SELECT name, type, \"notnull\", dflt_value FROM pragma_table_info('Issues') ORDER BY cid",
        )
        .expect("prepare");
    stmt.query_map([], |row| {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
    })
    .expect("query")
    .collect::<Result<_, _>>()
    .expect("rows")
}

/// Whether `Issues` accepts a row with the given raw priority value.
pub fn accepts_priority(path: &Path, priority: Option<&str>) -> bool {
    let conn = Connection::open(path).expect("open db");
    conn.execute(
        "INSERT INTO Issues (Code, ShortDescription, LongDescription, Priority)
         VALUES ('ZZ-CHECK', 's', 'l', ?1)",
        [priority],
    )
    .is_ok()
}
