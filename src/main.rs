mod config;
mod devops;
mod diff;
mod report;

use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

/// Commit Lines — CLI tool that walks the completed pull requests of a set of
/// repositories and attributes to each one the net lines changed until the
/// next merge.
#[derive(Parser, Debug)]
#[command(name = "commit-lines", version, about)]
struct Cli {
    /// Config file (defaults to .commit-lines.toml in the current directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Optional output file path for markdown report
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Emit logs as JSON lines instead of human-readable text
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    info!("loading configuration");
    let config = config::Config::load(cli.config.as_deref())?;
    let client = devops::HttpDevOpsClient::new(config.base_url()?, config.token()?)?;
    let filter = diff::FileFilter::from_config(&config.file_extensions);
    debug!(
        extensions = ?config.file_extensions.admissible,
        branch = %config.repositories.target_branch,
        since = %config.repositories.start_date,
        "configuration loaded"
    );

    info!("listing repositories");
    let repositories = devops::repositories_to_scan(&client, &config).await?;
    info!(count = repositories.len(), "repositories to scan");

    let mut processed = Vec::new();
    let mut failures = Vec::new();
    for repository in repositories {
        debug!(repository = %repository.name, "processing repository");
        match diff::process_repository(&client, &repository, &config, &filter).await {
            Ok(pull_requests) => processed.push((repository, pull_requests)),
            Err(err) => {
                error!(repository = %repository.name, error = %err, "failed to process repository");
                failures.push(report::RepositoryFailure {
                    name: repository.name,
                    reason: err.to_string(),
                });
            }
        }
    }

    info!("generating report");
    let built_report = report::build(processed, failures, &config);
    report::output(&built_report, cli.output.as_deref())?;
    info!(total_lines = built_report.total_lines, "done");

    Ok(())
}

/// Logs go to stderr so the terminal report on stdout stays clean.
/// RUST_LOG overrides the default `info` level.
fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    }
}
