//! In-memory `DevOpsApi` for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::types::{ChangeItem, CommitRef, IdentityRef};
use super::{Change, ChangeKind, DevOpsApi, DevOpsError, PullRequest, Repository};

#[derive(Default)]
pub struct MockDevOpsApi {
    pub repositories: Vec<Repository>,
    pub pull_requests: Vec<PullRequest>,
    /// Change sets keyed by (base commit, target commit)
    pub changes: HashMap<(String, String), Vec<Change>>,
    /// File contents keyed by URL; unknown URLs answer 404
    pub contents: HashMap<String, String>,
    pub fail_pull_requests: bool,
    /// Commit pairs whose change listing answers 500
    pub failing_pairs: Vec<(String, String)>,
    pub pull_request_requests: Mutex<usize>,
    pub change_requests: Mutex<Vec<(String, String)>>,
    pub fetched: Mutex<Vec<String>>,
}

impl MockDevOpsApi {
    pub fn with_changes(mut self, base: &str, target: &str, changes: Vec<Change>) -> Self {
        self.changes
            .insert((base.to_string(), target.to_string()), changes);
        self
    }

    pub fn with_content(mut self, url: &str, content: &str) -> Self {
        self.contents.insert(url.to_string(), content.to_string());
        self
    }

    pub fn pull_request_page_requests(&self) -> usize {
        *self.pull_request_requests.lock().unwrap()
    }

    /// Distinct commit pairs whose change set was requested, in order.
    pub fn requested_pairs(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = Vec::new();
        for pair in self.change_requests.lock().unwrap().iter() {
            if !pairs.contains(pair) {
                pairs.push(pair.clone());
            }
        }
        pairs
    }

    pub fn fetched_urls(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

fn page<T: Clone>(items: &[T], skip: usize, top: usize) -> Vec<T> {
    items.iter().skip(skip).take(top).cloned().collect()
}

#[async_trait]
impl DevOpsApi for MockDevOpsApi {
    async fn list_repositories(&self) -> Result<Vec<Repository>, DevOpsError> {
        Ok(self.repositories.clone())
    }

    async fn pull_requests_page(
        &self,
        _repository_id: &str,
        _target_branch: &str,
        _status: &str,
        skip: usize,
        top: usize,
    ) -> Result<Vec<PullRequest>, DevOpsError> {
        *self.pull_request_requests.lock().unwrap() += 1;
        if self.fail_pull_requests {
            return Err(DevOpsError::Status {
                url: "pullrequests".to_string(),
                status: 503,
            });
        }
        Ok(page(&self.pull_requests, skip, top))
    }

    async fn changes_page(
        &self,
        _repository_id: &str,
        base_commit: &str,
        target_commit: &str,
        skip: usize,
        top: usize,
    ) -> Result<Vec<Change>, DevOpsError> {
        let key = (base_commit.to_string(), target_commit.to_string());
        self.change_requests.lock().unwrap().push(key.clone());
        if self.failing_pairs.contains(&key) {
            return Err(DevOpsError::Status {
                url: "diffs/commits".to_string(),
                status: 500,
            });
        }
        Ok(self
            .changes
            .get(&key)
            .map(|changes| page(changes, skip, top))
            .unwrap_or_default())
    }

    async fn fetch_content(&self, url: &str) -> Result<String, DevOpsError> {
        self.fetched.lock().unwrap().push(url.to_string());
        self.contents
            .get(url)
            .cloned()
            .ok_or_else(|| DevOpsError::Status {
                url: url.to_string(),
                status: 404,
            })
    }
}

/// Completed pull request closed at `closed` (RFC 3339) with merge commit `commit`.
pub fn pull_request(id: u64, closed: &str, commit: &str) -> PullRequest {
    PullRequest {
        pull_request_id: id,
        status: "completed".to_string(),
        closed_date: Some(closed.parse().unwrap()),
        created_by: Some(IdentityRef {
            display_name: format!("author-{id}"),
        }),
        last_merge_target_commit: Some(CommitRef {
            commit_id: commit.to_string(),
        }),
        committed_lines: 0,
    }
}

/// A file change whose content URL points at `target` like the real API does.
pub fn file_change(path: &str, kind: ChangeKind, target: &str) -> Change {
    Change {
        item: ChangeItem {
            path: path.to_string(),
            is_folder: false,
            url: item_url(path, target),
        },
        change_type: kind,
        source_server_item: None,
    }
}

pub fn folder_change(path: &str) -> Change {
    Change {
        item: ChangeItem {
            path: path.to_string(),
            is_folder: true,
            url: String::new(),
        },
        change_type: ChangeKind::Edit,
        source_server_item: None,
    }
}

pub fn item_url(path: &str, version: &str) -> String {
    format!(
        "https://dev.azure.com/org/project/_apis/git/repositories/r/items/{}?versionType=Commit&version={version}",
        urlencoding::encode(path.trim_start_matches('/'))
    )
}
