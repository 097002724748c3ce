//! `IsUrgent` -> `Priority` schema migration.
//!
//! The table shape is classified first ([`SchemaState`]); each state has
//! exactly one [`MigrationAction`]. Every mutating step runs inside a
//! single IMMEDIATE transaction, so an error at any point (including a
//! failed verification) leaves the table exactly as it was.

use crate::error::{LalError, Result};
use crate::model::Priority;
use crate::storage::schema::{
    self, ISSUES_TABLE, LEGACY_COLUMN, PRIORITY_COLUMN, SHADOW_SCHEMA_SQL, SHADOW_TABLE,
    SchemaState,
};
use crate::storage::sqlite::IssueStore;
use rusqlite::{Connection, Transaction};
use serde::Serialize;
use std::str::FromStr;

/// How the legacy column is removed.
///
/// `ALTER TABLE` cannot add `NOT NULL` or `CHECK` to an existing column,
/// so the column is dropped in place only when `Priority` already carries
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum DropStrategy {
    /// Native `DROP COLUMN` when available and `Priority` is already
    /// constrained, shadow table otherwise.
    #[default]
    Auto,
    /// Always rebuild through a shadow table.
    Rebuild,
}

impl FromStr for DropStrategy {
    type Err = LalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "rebuild" => Ok(Self::Rebuild),
            other => Err(LalError::Config(format!(
                "unknown drop strategy '{other}' (expected auto or rebuild)"
            ))),
        }
    }
}

/// How the legacy column was actually removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropMethod {
    Native,
    ShadowTable,
}

/// Policy knobs for a migration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MigrationPolicy {
    /// Priority assigned where `IsUrgent = 0`. `IsUrgent = 1` always maps to HIGH.
    pub default_priority: Priority,
    pub drop_strategy: DropStrategy,
}

/// The single action defined for each schema state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationAction {
    /// Add `Priority`, backfill from `IsUrgent`, verify, drop `IsUrgent`.
    AddBackfillDrop,
    /// Fill unset priorities from `IsUrgent`, verify, drop `IsUrgent`.
    BackfillDrop,
    /// Already in the target shape.
    NoOp,
    /// Neither column is present.
    Fail,
}

impl MigrationAction {
    /// Whether the action changes the database.
    #[must_use]
    pub const fn writes(self) -> bool {
        matches!(self, Self::AddBackfillDrop | Self::BackfillDrop)
    }
}

/// Map a schema state to its action.
#[must_use]
pub const fn plan(state: SchemaState) -> MigrationAction {
    match state {
        SchemaState::Untouched => MigrationAction::AddBackfillDrop,
        SchemaState::PartiallyMigrated => MigrationAction::BackfillDrop,
        SchemaState::FullyMigrated => MigrationAction::NoOp,
        SchemaState::Inconsistent => MigrationAction::Fail,
    }
}

/// Result of a migration run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    /// State observed before the run.
    pub state: SchemaState,
    pub action: MigrationAction,
    /// Rows carried through the migration.
    pub rows: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drop_method: Option<DropMethod>,
}

impl MigrationReport {
    const fn noop(state: SchemaState) -> Self {
        Self {
            state,
            action: MigrationAction::NoOp,
            rows: 0,
            drop_method: None,
        }
    }

    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.action == MigrationAction::NoOp
    }
}

/// Drive the `Issues` table to the target shape.
///
/// # Errors
///
/// - `TableMissing` if there is no `Issues` table
/// - `NoUrgencyColumns` if neither `IsUrgent` nor `Priority` exists
/// - `UnsetPriority` if any row has no valid priority after backfill
/// - database errors from any step
///
/// On every error the transaction is rolled back.
pub fn migrate(store: &mut IssueStore, policy: &MigrationPolicy) -> Result<MigrationReport> {
    let state = store.schema_state()?;
    tracing::info!(%state, "Inspected Issues schema");

    match plan(state) {
        MigrationAction::NoOp => {
            tracing::info!("Database already migrated; nothing to do");
            return Ok(MigrationReport::noop(state));
        }
        MigrationAction::Fail => return Err(no_urgency_columns(store.columns()?)),
        MigrationAction::AddBackfillDrop | MigrationAction::BackfillDrop => {}
    }

    let missing = store.table_missing();
    let tx = store
        .conn_mut()
        .transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;

    // Another writer may have moved the table on while we waited for the lock.
    if !schema::table_exists(&tx, ISSUES_TABLE)? {
        return Err(missing);
    }
    let columns = schema::table_columns(&tx, ISSUES_TABLE)?;
    let locked_state = schema::classify(&columns);
    if locked_state != state {
        tracing::warn!(from = %state, to = %locked_state, "Schema changed before lock was taken");
    }

    let report = match plan(locked_state) {
        MigrationAction::NoOp => MigrationReport::noop(locked_state),
        MigrationAction::Fail => return Err(no_urgency_columns(columns)),
        action @ (MigrationAction::AddBackfillDrop | MigrationAction::BackfillDrop) => {
            let legacy = find_column(&columns, LEGACY_COLUMN);
            let rows = run_steps(&tx, action, &legacy, policy)?;
            let drop_method = drop_legacy_column(&tx, &legacy, policy.drop_strategy)?;
            MigrationReport {
                state: locked_state,
                action,
                rows,
                drop_method: Some(drop_method),
            }
        }
    };

    tx.commit()?;
    tracing::info!(rows = report.rows, action = ?report.action, "Migration committed");
    Ok(report)
}

/// Add (if needed), backfill, and verify. Returns the row count.
fn run_steps(
    tx: &Transaction,
    action: MigrationAction,
    legacy: &str,
    policy: &MigrationPolicy,
) -> Result<usize> {
    let legacy = quote_ident(legacy);

    if action == MigrationAction::AddBackfillDrop {
        tx.execute(
            &format!("ALTER TABLE {ISSUES_TABLE} ADD COLUMN {PRIORITY_COLUMN} TEXT"),
            [],
        )?;
        tracing::debug!("Added Priority column");
    }

    // Keep recognised priorities (normalised to the canonical names),
    // fill everything else that is unset from the legacy flag.
    let backfill = format!(
        "UPDATE {ISSUES_TABLE} SET {PRIORITY_COLUMN} = COALESCE(
            CASE UPPER(TRIM(CAST({PRIORITY_COLUMN} AS TEXT)))
                WHEN 'LOW' THEN 'LOW' WHEN '0' THEN 'LOW'
                WHEN 'MEDIUM' THEN 'MEDIUM' WHEN '1' THEN 'MEDIUM'
                WHEN 'HIGH' THEN 'HIGH' WHEN '2' THEN 'HIGH'
                WHEN '' THEN NULL
                ELSE {PRIORITY_COLUMN}
            END,
            CASE WHEN {legacy} = 1 THEN 'HIGH' WHEN {legacy} = 0 THEN ?1 ELSE NULL END
        )"
    );
    let rows = tx.execute(&backfill, [policy.default_priority.as_str()])?;
    tracing::debug!(rows, default = %policy.default_priority, "Backfilled Priority");

    let unset = count_unset_priorities(tx)?;
    if unset > 0 {
        tracing::warn!(unset, "Verification failed; rolling back");
        return Err(LalError::UnsetPriority { count: unset });
    }

    Ok(rows)
}

/// Rows whose priority is missing or not one of the canonical names.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_unset_priorities(conn: &Connection) -> Result<usize> {
    let count: i64 = conn.query_row(
        &format!(
            "SELECT COUNT(*) FROM {ISSUES_TABLE}
             WHERE {PRIORITY_COLUMN} IS NULL
                OR {PRIORITY_COLUMN} NOT IN ('LOW', 'MEDIUM', 'HIGH')"
        ),
        [],
        |row| row.get(0),
    )?;
    Ok(usize::try_from(count).unwrap_or(0))
}

fn drop_legacy_column(tx: &Transaction, legacy: &str, strategy: DropStrategy) -> Result<DropMethod> {
    if strategy == DropStrategy::Auto
        && schema::supports_drop_column()
        && schema::priority_column_sealed(tx)?
    {
        // A failed statement only rolls back itself, not the transaction.
        match drop_column_native(tx, legacy) {
            Ok(()) => return Ok(DropMethod::Native),
            Err(e) => {
                tracing::debug!(error = %e, "Native DROP COLUMN refused; rebuilding");
            }
        }
    }
    rebuild_without_legacy(tx)?;
    Ok(DropMethod::ShadowTable)
}

fn drop_column_native(tx: &Transaction, legacy: &str) -> Result<()> {
    tx.execute(
        &format!(
            "ALTER TABLE {ISSUES_TABLE} DROP COLUMN {}",
            quote_ident(legacy)
        ),
        [],
    )?;
    tracing::debug!("Dropped IsUrgent column");
    Ok(())
}

/// Shadow table + swap: copy the target columns in rowid order, drop the
/// original, rename the shadow into place.
fn rebuild_without_legacy(tx: &Transaction) -> Result<()> {
    let columns = schema::TARGET_COLUMNS.join(", ");

    tx.execute(&format!("DROP TABLE IF EXISTS {SHADOW_TABLE}"), [])?;
    tx.execute_batch(SHADOW_SCHEMA_SQL)?;
    let copied = tx.execute(
        &format!(
            "INSERT INTO {SHADOW_TABLE} ({columns})
             SELECT {columns} FROM {ISSUES_TABLE} ORDER BY rowid"
        ),
        [],
    )?;
    tx.execute(&format!("DROP TABLE {ISSUES_TABLE}"), [])?;
    tx.execute(
        &format!("ALTER TABLE {SHADOW_TABLE} RENAME TO {ISSUES_TABLE}"),
        [],
    )?;
    tracing::debug!(copied, "Rebuilt Issues through shadow table");
    Ok(())
}

fn no_urgency_columns(observed: Vec<String>) -> LalError {
    LalError::NoUrgencyColumns {
        table: ISSUES_TABLE.to_string(),
        legacy: LEGACY_COLUMN.to_string(),
        target: PRIORITY_COLUMN.to_string(),
        observed,
    }
}

/// Actual spelling of a column as declared in the table.
fn find_column(columns: &[String], wanted: &str) -> String {
    columns
        .iter()
        .find(|c| c.eq_ignore_ascii_case(wanted))
        .cloned()
        .unwrap_or_else(|| wanted.to_string())
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
