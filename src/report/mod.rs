pub mod types;

pub use types::{Report, RepositoryFailure};
use types::{AuthorTotal, PullRequestLine, RepositoryReport};

use crate::config::Config;
use crate::devops::{PullRequest, Repository};
use chrono::{DateTime, Utc};
use colored::Colorize;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report file: {0}")]
    FileWrite(#[from] std::io::Error),
}

/// Build a Report from processed repositories and the ones that failed.
pub fn build(
    processed: Vec<(Repository, Vec<PullRequest>)>,
    failures: Vec<RepositoryFailure>,
    config: &Config,
) -> Report {
    let mut by_author: BTreeMap<String, AuthorTotal> = BTreeMap::new();

    let repositories: Vec<RepositoryReport> = processed
        .into_iter()
        .map(|(repository, pull_requests)| {
            let lines: Vec<PullRequestLine> = pull_requests
                .iter()
                .map(|pr| PullRequestLine {
                    id: pr.pull_request_id,
                    closed_date: pr.closed_date,
                    author: pr.author().to_string(),
                    committed_lines: pr.committed_lines,
                })
                .collect();

            for line in &lines {
                let total = by_author
                    .entry(line.author.clone())
                    .or_insert_with(|| AuthorTotal {
                        author: line.author.clone(),
                        pull_requests: 0,
                        committed_lines: 0,
                    });
                total.pull_requests += 1;
                total.committed_lines += line.committed_lines;
            }

            RepositoryReport {
                name: repository.name,
                total_lines: lines.iter().map(|l| l.committed_lines).sum(),
                pull_requests: lines,
            }
        })
        .collect();

    let mut authors: Vec<AuthorTotal> = by_author.into_values().collect();
    authors.sort_by(|a, b| b.committed_lines.cmp(&a.committed_lines));

    Report {
        since: config.repositories.start_date,
        target_branch: config.repositories.target_branch.clone(),
        total_lines: repositories.iter().map(|r| r.total_lines).sum(),
        repositories,
        failures,
        authors,
    }
}

/// Output the report to terminal (default) or to a markdown file.
#[instrument(skip(report), fields(repositories = report.repositories.len(), total_lines = report.total_lines))]
pub fn output(report: &Report, output_path: Option<&Path>) -> Result<(), ReportError> {
    match output_path {
        None => {
            debug!("writing report to terminal");
            print_terminal_report(report);
            Ok(())
        }
        Some(path) => {
            debug!(path = %path.display(), "writing report to file");
            write_markdown_report(report, path)
        }
    }
}

fn format_date(date: Option<DateTime<Utc>>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Format and print the report to the terminal with colors.
///
/// Committed lines since 2023-01-01 into master
///
/// ═══ billing ═══ (+120)
///   #4711  2023-02-01  Dana Reyes       +10
/// ...
fn print_terminal_report(report: &Report) {
    println!();
    println!(
        "Committed lines since {} into {}",
        report.since, report.target_branch
    );
    println!();

    for repo in &report.repositories {
        println!("═══ {} ═══ ({})", repo.name, colorize_lines(repo.total_lines));
        if repo.pull_requests.is_empty() {
            println!("  No completed pull requests.");
        }
        for pr in &repo.pull_requests {
            println!(
                "  #{:<6} {}  {:<24} {}",
                pr.id,
                format_date(pr.closed_date),
                pr.author,
                colorize_lines(pr.committed_lines)
            );
        }
        println!();
    }

    for failure in &report.failures {
        println!(
            "{} {}: {}",
            "FAILED".red().bold(),
            failure.name,
            failure.reason
        );
    }
    if !report.failures.is_empty() {
        println!();
    }

    if !report.authors.is_empty() {
        println!("═══ Authors ═══");
        for author in &report.authors {
            println!(
                "  {:<24} {:>4} PRs  {}",
                author.author,
                author.pull_requests,
                colorize_lines(author.committed_lines)
            );
        }
        println!();
    }

    println!("═══ Total: {} ═══", colorize_lines(report.total_lines));
    println!();
}

/// Write the report as a markdown file.
fn write_markdown_report(report: &Report, path: &Path) -> Result<(), ReportError> {
    let mut md = String::new();
    md.push_str(&format!(
        "# Committed lines since {} into `{}`\n\n",
        report.since, report.target_branch
    ));

    for repo in &report.repositories {
        md.push_str(&format!("## {}\n\n", repo.name));
        if repo.pull_requests.is_empty() {
            md.push_str("No completed pull requests.\n\n");
            continue;
        }
        md.push_str("| PR | Closed | Author | Committed lines |\n");
        md.push_str("|---:|---|---|---:|\n");
        for pr in &repo.pull_requests {
            md.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                pr.id,
                format_date(pr.closed_date),
                pr.author,
                signed(pr.committed_lines)
            ));
        }
        md.push_str(&format!("\n**Total:** {}\n\n", signed(repo.total_lines)));
    }

    if !report.failures.is_empty() {
        md.push_str("## Failed repositories\n\n");
        for failure in &report.failures {
            md.push_str(&format!("- **{}**: {}\n", failure.name, failure.reason));
        }
        md.push('\n');
    }

    if !report.authors.is_empty() {
        md.push_str("## Authors\n\n| Author | PRs | Committed lines |\n|---|---:|---:|\n");
        for author in &report.authors {
            md.push_str(&format!(
                "| {} | {} | {} |\n",
                author.author,
                author.pull_requests,
                signed(author.committed_lines)
            ));
        }
        md.push('\n');
    }

    md.push_str(&format!("## Total: {}\n", signed(report.total_lines)));

    std::fs::write(path, md)?;
    Ok(())
}

fn signed(lines: i64) -> String {
    format!("{lines:+}")
}

/// Helper to colorize a line count for terminal output.
fn colorize_lines(lines: i64) -> colored::ColoredString {
    let text = signed(lines);
    match lines.signum() {
        1 => text.green().bold(),
        -1 => text.red().bold(),
        _ => text.normal(),
    }
}
