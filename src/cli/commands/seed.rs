use super::config_with_db;
use crate::cli::SeedArgs;
use crate::config::CliOverrides;
use crate::error::Result;
use crate::storage::seed;

/// Execute the seed command.
///
/// # Errors
///
/// Returns an error if the database is missing or not migrated, or the
/// snapshot cannot be read or parsed.
pub fn execute(args: &SeedArgs, json: bool, cli: &CliOverrides) -> Result<()> {
    let config = config_with_db(args.db.as_ref(), cli)?;
    let report = seed::seed_from_csv(&config.db_path, args.csv.as_deref())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if report.skipped() {
        println!(
            "Issues table already has {} row(s); nothing seeded.",
            report.existing
        );
    } else {
        println!(
            "Seeded {} issue(s) from {}",
            report.inserted,
            report.csv_path.display()
        );
    }
    Ok(())
}
