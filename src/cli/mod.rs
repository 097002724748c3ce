//! CLI definitions and entry point.

use crate::format::OutputFormat;
use crate::model::Priority;
use crate::storage::DropStrategy;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

/// Issue service client and `IsUrgent` -> `Priority` schema migrator
#[derive(Parser, Debug)]
#[command(name = "lal", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// YAML config file (default: ./lal.yaml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Also write JSON logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List issues from the service
    Issues(IssuesArgs),

    /// Migrate the Issues table from IsUrgent to Priority
    Migrate(MigrateArgs),

    /// Reseed an empty Issues table from a CSV snapshot
    Seed(SeedArgs),

    /// Create the database and Issues table if absent
    Init(InitArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct IssuesArgs {
    /// Base URL of the issue service
    #[arg(long)]
    pub url: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Only show issues with this priority (LOW, MEDIUM, HIGH)
    #[arg(long, value_parser = parse_priority)]
    pub priority: Option<Priority>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct MigrateArgs {
    /// Database file (default: issues.db)
    pub db: Option<PathBuf>,

    /// Skip the pre-migration backup
    #[arg(long)]
    pub no_backup: bool,

    /// Restore the newest backup instead of migrating
    #[arg(long, conflicts_with_all = ["no_backup", "default_priority", "drop_strategy"])]
    pub rollback: bool,

    /// Priority for rows with IsUrgent = 0
    #[arg(long, value_parser = parse_priority)]
    pub default_priority: Option<Priority>,

    /// How to remove the IsUrgent column
    #[arg(long, value_enum)]
    pub drop_strategy: Option<DropStrategy>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct SeedArgs {
    /// Database file (default: issues.db)
    pub db: Option<PathBuf>,

    /// CSV snapshot (default: issues.csv beside the database)
    #[arg(long)]
    pub csv: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct InitArgs {
    /// Database file (default: issues.db)
    pub db: Option<PathBuf>,
}

fn parse_priority(value: &str) -> Result<Priority, String> {
    value.parse().map_err(|e: crate::error::LalError| e.to_string())
}
