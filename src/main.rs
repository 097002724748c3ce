use clap::Parser;
use lunch_and_learn::cli::commands;
use lunch_and_learn::cli::{Cli, Commands};
use lunch_and_learn::config;
use lunch_and_learn::logging::init_logging;
use lunch_and_learn::{LalError, StructuredError};
use std::io::{self, IsTerminal};

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // Help and version go to stdout and succeed; usage errors exit 1.
            std::process::exit(i32::from(e.use_stderr()));
        }
    };

    if let Err(e) = init_logging(cli.verbose, cli.quiet, cli.log_file.as_deref()) {
        eprintln!("Failed to initialize logging: {e}");
    }

    // Ctrl-C exits 1 like any other failure.
    if let Err(e) = ctrlc::set_handler(|| {
        eprintln!("\nInterrupted by user.");
        std::process::exit(1);
    }) {
        tracing::warn!(error = %e, "Failed to install interrupt handler");
    }

    let overrides = config::CliOverrides {
        config: cli.config.clone(),
        ..config::CliOverrides::default()
    };

    let result = match &cli.command {
        Commands::Issues(args) => commands::issues::execute(args, cli.json, &overrides),
        Commands::Migrate(args) => commands::migrate::execute(args, cli.json, &overrides),
        Commands::Seed(args) => commands::seed::execute(args, cli.json, &overrides),
        Commands::Init(args) => commands::init::execute(args, cli.json, &overrides),
    };

    if let Err(e) = result {
        handle_error(&e, cli.json);
    }
}

/// Handle errors with structured output support.
///
/// When --json is set or stdout is not a TTY, outputs structured JSON to stderr.
/// Otherwise, outputs human-readable error with optional color.
fn handle_error(err: &LalError, json_mode: bool) -> ! {
    tracing::debug!(error = ?err, "Command failed");
    let structured = StructuredError::from_error(err);
    let exit_code = structured.code.exit_code();

    let use_json = json_mode || !io::stdout().is_terminal();

    if use_json {
        let json = structured.to_json();
        eprintln!(
            "{}",
            serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string())
        );
    } else {
        let use_color = io::stderr().is_terminal();
        eprintln!("{}", structured.to_human(use_color));
    }

    std::process::exit(exit_code);
}
