pub mod classify;
pub mod lines;
pub mod resolve;

pub use classify::FileFilter;

use tracing::{debug, error, info, instrument, warn};

use crate::config::Config;
use crate::devops::pagination::{ChangePages, Paginator};
use crate::devops::{self, Change, ChangeKind, DevOpsApi, DevOpsError, PullRequest, Repository};
use resolve::{fetch_contents, ContentPlan};

/// What happened to one admissible file of a commit pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Counted { path: String, delta: i64 },
    /// Change kind with nothing to count (unknown kind, rename without origin)
    Skipped { path: String, kind: ChangeKind },
    /// Fetching or diffing failed; the file counts as zero
    Failed { path: String, reason: String },
}

impl FileOutcome {
    pub fn delta(&self) -> i64 {
        match self {
            FileOutcome::Counted { delta, .. } => *delta,
            FileOutcome::Skipped { .. } | FileOutcome::Failed { .. } => 0,
        }
    }
}

/// Per-file outcomes of the diff between two merge commits.
#[derive(Debug, Clone, Default)]
pub struct CommitDiff {
    pub files: Vec<FileOutcome>,
}

impl CommitDiff {
    /// Sum of the successfully counted files.
    pub fn net_lines(&self) -> i64 {
        self.files.iter().map(FileOutcome::delta).sum()
    }
}

/// Attributes net changed lines to merged pull requests.
///
/// Everything runs sequentially: pairs one after another, files within a
/// pair one after another.
pub struct DiffEngine<'a, A: ?Sized> {
    api: &'a A,
    filter: &'a FileFilter,
    page_size: usize,
}

impl<'a, A: DevOpsApi + ?Sized> DiffEngine<'a, A> {
    pub fn new(api: &'a A, filter: &'a FileFilter, page_size: usize) -> Self {
        Self {
            api,
            filter,
            page_size,
        }
    }

    /// Count net lines changed between two merge commits.
    ///
    /// Listing the change set is all-or-nothing; a file that cannot be
    /// fetched is logged and counted as zero.
    #[instrument(skip(self, repository), fields(repository = %repository.name))]
    pub async fn commit_diff(
        &self,
        repository: &Repository,
        base_commit: &str,
        target_commit: &str,
    ) -> Result<CommitDiff, DevOpsError> {
        let pages = ChangePages {
            api: self.api,
            repository_id: &repository.id,
            base_commit,
            target_commit,
        };
        let changes = Paginator::new(pages, self.page_size).collect_all().await?;
        let admissible = self.filter.classify(&changes);
        debug!(changes = changes.len(), admissible = admissible.len(), "classified changes");

        let mut diff = CommitDiff::default();
        for change in admissible {
            diff.files
                .push(self.file_outcome(change, base_commit, target_commit).await);
        }

        for file in &diff.files {
            match file {
                FileOutcome::Counted { path, delta } => {
                    debug!(path = %path, delta, "counted file");
                }
                FileOutcome::Skipped { path, kind } => {
                    debug!(path = %path, kind = %kind, "nothing to count for file");
                }
                FileOutcome::Failed { path, reason } => {
                    error!(
                        repository = %repository.name,
                        base_commit,
                        target_commit,
                        path = %path,
                        error = %reason,
                        "failed to count changed lines of file"
                    );
                }
            }
        }

        Ok(diff)
    }

    async fn file_outcome(&self, change: &Change, base_commit: &str, target_commit: &str) -> FileOutcome {
        let path = change.item.path.clone();
        let plan = ContentPlan::for_change(change, base_commit, target_commit);
        debug!(path = %path, kind = %change.change_type, urls = ?plan.urls(), "resolved content");

        match fetch_contents(self.api, &plan).await {
            Ok(Some(contents)) => FileOutcome::Counted {
                path,
                delta: contents.delta(),
            },
            Ok(None) => FileOutcome::Skipped {
                path,
                kind: change.change_type.clone(),
            },
            Err(err) => FileOutcome::Failed {
                path,
                reason: err.to_string(),
            },
        }
    }

    /// Walk the pull requests oldest to newest and store on each one the net
    /// lines between its merge commit and the next one's.
    ///
    /// Takes the newest-first list from `merged_pull_requests` and returns
    /// it oldest first. The newest pull request keeps zero.
    pub async fn process_pull_requests(
        &self,
        repository: &Repository,
        mut pull_requests: Vec<PullRequest>,
    ) -> Result<Vec<PullRequest>, DevOpsError> {
        pull_requests.reverse();
        let total = pull_requests.len();

        for position in 1..total {
            let commits = (
                pull_requests[position - 1].merge_commit_id(),
                pull_requests[position].merge_commit_id(),
            );
            let (base_commit, target_commit) = match commits {
                (Some(base), Some(target)) => (base.to_string(), target.to_string()),
                _ => {
                    warn!(
                        repository = %repository.name,
                        pull_request_id = pull_requests[position - 1].pull_request_id,
                        "missing merge commit, pair not counted"
                    );
                    continue;
                }
            };

            let diff = self
                .commit_diff(repository, &base_commit, &target_commit)
                .await?;

            let previous = &mut pull_requests[position - 1];
            previous.committed_lines = diff.net_lines();
            info!(
                repository = %repository.name,
                position,
                total,
                pull_request_id = previous.pull_request_id,
                status = %previous.status,
                closed_date = ?previous.closed_date,
                author = %previous.author(),
                committed_lines = previous.committed_lines,
                "processed pull request"
            );
        }

        Ok(pull_requests)
    }
}

/// List one repository's merged pull requests and attribute their lines.
/// Errors abort this repository only; the caller moves on to the next.
#[instrument(skip_all, fields(repository = %repository.name))]
pub async fn process_repository<A: DevOpsApi + ?Sized>(
    api: &A,
    repository: &Repository,
    config: &Config,
    filter: &FileFilter,
) -> Result<Vec<PullRequest>, DevOpsError> {
    let pull_requests = devops::merged_pull_requests(api, repository, config).await?;
    info!(
        count = pull_requests.len(),
        since = %config.repositories.start_date,
        "found completed pull requests"
    );

    DiffEngine::new(api, filter, config.page_size())
        .process_pull_requests(repository, pull_requests)
        .await
}
