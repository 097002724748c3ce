use super::config_with_db;
use crate::cli::InitArgs;
use crate::config::CliOverrides;
use crate::error::Result;
use crate::storage::{IssueStore, SchemaState};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct InitOutput<'a> {
    db: &'a Path,
    created: bool,
    state: SchemaState,
}

/// Execute the init command.
///
/// Creates the database file and the `Issues` table if absent. An
/// existing table is left as it is, whatever its shape.
///
/// # Errors
///
/// Returns an error if the database cannot be created.
pub fn execute(args: &InitArgs, json: bool, cli: &CliOverrides) -> Result<()> {
    let config = config_with_db(args.db.as_ref(), cli)?;
    let db_path = config.db_path.as_path();

    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let existed = db_path.is_file() && IssueStore::open(db_path)?.issues_table_exists()?;
    let store = IssueStore::create(db_path)?;
    let state = store.schema_state()?;

    if json {
        let output = InitOutput {
            db: db_path,
            created: !existed,
            state,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if existed {
        println!(
            "Issues table already exists in {} ({state})",
            db_path.display()
        );
    } else {
        println!("Initialized {}", db_path.display());
    }
    Ok(())
}
