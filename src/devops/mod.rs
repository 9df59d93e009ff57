pub mod pagination;
pub mod types;

#[cfg(test)]
pub mod testing;

pub use types::{Change, ChangeKind, PullRequest, Repository};

use async_trait::async_trait;
use chrono::{NaiveTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::Config;
use pagination::{Paginator, PullRequestPages};
use types::{CommitDiffsResponse, ListResponse};

/// Pull request status filter used when listing merges.
pub const COMPLETED_STATUS: &str = "completed";

const USER_AGENT: &str = concat!("commit-lines/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum DevOpsError {
    #[error("DevOps API request failed: {0}")]
    ApiRequest(#[from] reqwest::Error),

    #[error("DevOps API returned {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Failed to decode DevOps API response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// The DevOps REST endpoints the audit consumes.
/// Implementations must be Send + Sync; callers await them one at a time.
#[async_trait]
pub trait DevOpsApi: Send + Sync {
    /// Every repository of the configured project.
    async fn list_repositories(&self) -> Result<Vec<Repository>, DevOpsError>;

    /// One skip/top page of pull requests into `target_branch` with `status`.
    async fn pull_requests_page(
        &self,
        repository_id: &str,
        target_branch: &str,
        status: &str,
        skip: usize,
        top: usize,
    ) -> Result<Vec<PullRequest>, DevOpsError>;

    /// One skip/top page of file changes between two commits.
    async fn changes_page(
        &self,
        repository_id: &str,
        base_commit: &str,
        target_commit: &str,
        skip: usize,
        top: usize,
    ) -> Result<Vec<Change>, DevOpsError>;

    /// Raw text behind a content URL that already names its revision.
    async fn fetch_content(&self, url: &str) -> Result<String, DevOpsError>;
}

/// reqwest-backed client authenticating with a personal access token.
pub struct HttpDevOpsClient {
    http: reqwest::Client,
    base_url: String,
    pat: String,
}

impl HttpDevOpsClient {
    /// `base_url` must end with a slash (see `Config::base_url`).
    pub fn new(base_url: String, pat: String) -> Result<Self, DevOpsError> {
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            http,
            base_url,
            pat,
        })
    }

    async fn get_text(&self, url: &str) -> Result<String, DevOpsError> {
        let response = self
            .http
            .get(url)
            .basic_auth("", Some(&self.pat))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DevOpsError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, DevOpsError> {
        let body = self.get_text(url).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl DevOpsApi for HttpDevOpsClient {
    async fn list_repositories(&self) -> Result<Vec<Repository>, DevOpsError> {
        let url = repositories_url(&self.base_url);
        debug!("fetching repository list");
        let response: ListResponse<Repository> = self.get_json(&url).await?;
        Ok(response.value)
    }

    async fn pull_requests_page(
        &self,
        repository_id: &str,
        target_branch: &str,
        status: &str,
        skip: usize,
        top: usize,
    ) -> Result<Vec<PullRequest>, DevOpsError> {
        let url = pull_requests_url(&self.base_url, repository_id, target_branch, status, skip, top);
        let response: ListResponse<PullRequest> = self.get_json(&url).await?;
        Ok(response.value)
    }

    async fn changes_page(
        &self,
        repository_id: &str,
        base_commit: &str,
        target_commit: &str,
        skip: usize,
        top: usize,
    ) -> Result<Vec<Change>, DevOpsError> {
        let url = commit_diffs_url(&self.base_url, repository_id, base_commit, target_commit, skip, top);
        let response: CommitDiffsResponse = self.get_json(&url).await?;
        Ok(response.changes)
    }

    async fn fetch_content(&self, url: &str) -> Result<String, DevOpsError> {
        self.get_text(url).await
    }
}

fn repositories_url(base_url: &str) -> String {
    format!("{base_url}git/repositories?api-version=6.0")
}

fn pull_requests_url(
    base_url: &str,
    repository_id: &str,
    target_branch: &str,
    status: &str,
    skip: usize,
    top: usize,
) -> String {
    format!(
        "{base_url}git/repositories/{repository_id}/pullrequests\
         ?searchCriteria.targetRefName=refs/heads/{target_branch}\
         &searchCriteria.status={status}&$top={top}&$skip={skip}&api-version=7.0"
    )
}

fn commit_diffs_url(
    base_url: &str,
    repository_id: &str,
    base_commit: &str,
    target_commit: &str,
    skip: usize,
    top: usize,
) -> String {
    format!(
        "{base_url}git/repositories/{repository_id}/diffs/commits\
         ?$top={top}&$skip={skip}&baseVersion={base_commit}&targetVersion={target_commit}\
         &baseVersionType=commit&targetVersionType=commit&api-version=7.0"
    )
}

/// List all repositories and keep those on the configured allow-list.
#[instrument(skip_all)]
pub async fn repositories_to_scan<A: DevOpsApi + ?Sized>(
    api: &A,
    config: &Config,
) -> Result<Vec<Repository>, DevOpsError> {
    let available = api.list_repositories().await?;
    debug!(available = available.len(), "received repository list");
    Ok(available
        .into_iter()
        .filter(|repo| config.repositories.names.contains(&repo.name))
        .collect())
}

/// Completed pull requests into the configured branch since the start date,
/// newest first.
#[instrument(skip_all, fields(repository = %repository.name))]
pub async fn merged_pull_requests<A: DevOpsApi + ?Sized>(
    api: &A,
    repository: &Repository,
    config: &Config,
) -> Result<Vec<PullRequest>, DevOpsError> {
    let pages = PullRequestPages {
        api,
        repository_id: &repository.id,
        target_branch: &config.repositories.target_branch,
        status: COMPLETED_STATUS,
    };
    let cutoff = Utc.from_utc_datetime(
        &config
            .repositories
            .start_date
            .and_time(NaiveTime::default()),
    );

    let mut pull_requests: Vec<PullRequest> = Paginator::new(pages, config.page_size())
        .collect_all()
        .await?
        .into_iter()
        .filter(|pr| pr.closed_date.is_some_and(|closed| closed >= cutoff))
        .collect();
    pull_requests.sort_by(|a, b| b.closed_date.cmp(&a.closed_date));

    debug!(count = pull_requests.len(), since = %config.repositories.start_date, "listed completed pull requests");
    Ok(pull_requests)
}
