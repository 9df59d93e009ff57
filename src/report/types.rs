use chrono::{DateTime, NaiveDate, Utc};

/// One merged pull request and the lines attributed to it.
#[derive(Debug, Clone)]
pub struct PullRequestLine {
    /// Pull request id (e.g., 4711)
    pub id: u64,
    /// When it was completed
    pub closed_date: Option<DateTime<Utc>>,
    /// Author display name
    pub author: String,
    /// Net lines between its merge commit and the next one
    pub committed_lines: i64,
}

/// All pull requests of one repository, oldest first.
#[derive(Debug, Clone)]
pub struct RepositoryReport {
    pub name: String,
    pub pull_requests: Vec<PullRequestLine>,
    /// Sum of committed lines across the repository
    pub total_lines: i64,
}

/// A repository whose processing was aborted.
#[derive(Debug, Clone)]
pub struct RepositoryFailure {
    pub name: String,
    pub reason: String,
}

/// Committed lines summed per author across all repositories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorTotal {
    pub author: String,
    pub pull_requests: usize,
    pub committed_lines: i64,
}

/// Complete audit across all scanned repositories.
#[derive(Debug)]
pub struct Report {
    /// Start-date cutoff of the run
    pub since: NaiveDate,
    /// Branch the pull requests were merged into
    pub target_branch: String,
    pub repositories: Vec<RepositoryReport>,
    pub failures: Vec<RepositoryFailure>,
    /// Highest committed lines first
    pub authors: Vec<AuthorTotal>,
    pub total_lines: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_author_total_equality() {
        let a = AuthorTotal {
            author: "alice".to_string(),
            pull_requests: 2,
            committed_lines: 40,
        };
        assert_eq!(a.clone(), a);
    }
}
