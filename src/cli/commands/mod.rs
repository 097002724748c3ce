//! Subcommand implementations.

pub mod init;
pub mod issues;
pub mod migrate;
pub mod seed;

use crate::config::{self, CliOverrides, Config};
use crate::error::Result;
use std::path::PathBuf;

/// Resolve configuration with a positional database argument applied.
fn config_with_db(db: Option<&PathBuf>, cli: &CliOverrides) -> Result<Config> {
    let mut overrides = cli.clone();
    if let Some(db) = db {
        overrides.db = Some(db.clone());
    }
    config::load_config(&overrides)
}
