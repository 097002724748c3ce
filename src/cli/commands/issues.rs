use crate::cli::IssuesArgs;
use crate::client::IssueClient;
use crate::config::{self, CliOverrides};
use crate::error::Result;
use crate::format::{OutputFormat, render_issues};

/// Execute the issues command.
///
/// `--json` forces the JSON format.
///
/// # Errors
///
/// Returns `Connectivity` or `Request` errors from the service, or a
/// config error.
pub fn execute(args: &IssuesArgs, json: bool, cli: &CliOverrides) -> Result<()> {
    let mut overrides = cli.clone();
    if args.url.is_some() {
        overrides.url.clone_from(&args.url);
    }
    let config = config::load_config(&overrides)?;

    let client = IssueClient::new(&config.base_url, config.timeout)?;
    let issues = client.fetch_issues(args.priority)?;

    let format = if json { OutputFormat::Json } else { args.format };
    let rendered = render_issues(&issues, format)?;
    if rendered.ends_with('\n') {
        print!("{rendered}");
    } else {
        println!("{rendered}");
    }
    Ok(())
}
