use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A git repository as listed by `git/repositories`.
#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub id: String,
    pub name: String,
}

/// A completed pull request merged into the target branch.
///
/// Deserialized from the `pullrequests` listing; `committed_lines` is not on
/// the wire and is filled in by the diff engine.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
    /// Numeric pull request id (e.g., 1234)
    pub pull_request_id: u64,
    /// Lifecycle status, "completed" for merged pull requests
    #[serde(default)]
    pub status: String,
    /// When the pull request was completed
    #[serde(default)]
    pub closed_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_by: Option<IdentityRef>,
    /// Commit the pull request produced on the target branch
    #[serde(default)]
    pub last_merge_target_commit: Option<CommitRef>,
    /// Net lines attributed to this pull request
    #[serde(skip)]
    pub committed_lines: i64,
}

impl PullRequest {
    /// Display name of the pull request's author, empty when unknown.
    pub fn author(&self) -> &str {
        self.created_by
            .as_ref()
            .map(|identity| identity.display_name.as_str())
            .unwrap_or_default()
    }

    pub fn merge_commit_id(&self) -> Option<&str> {
        self.last_merge_target_commit
            .as_ref()
            .map(|commit| commit.commit_id.as_str())
            .filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityRef {
    #[serde(default)]
    pub display_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRef {
    pub commit_id: String,
}

/// One file-level difference between two commits.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Change {
    pub item: ChangeItem,
    pub change_type: ChangeKind,
    /// Path before the rename; only present for rename kinds
    #[serde(default)]
    pub source_server_item: Option<String>,
}

impl Change {
    /// Prior path of a renamed file, None when absent or blank.
    pub fn prior_path(&self) -> Option<&str> {
        self.source_server_item
            .as_deref()
            .filter(|path| !path.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeItem {
    /// Repository path, e.g. "/src/Billing/Invoice.cs"
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub is_folder: bool,
    /// Content URL; its `version=` query parameter names the target commit
    #[serde(default)]
    pub url: String,
}

/// Kind of change reported for a file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum ChangeKind {
    Add,
    Edit,
    Delete,
    EditRename,
    /// Anything else the API reports (e.g. "rename", "edit, sourceRename")
    Unrecognized(String),
}

impl From<String> for ChangeKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "add" => ChangeKind::Add,
            "edit" => ChangeKind::Edit,
            "delete" => ChangeKind::Delete,
            "edit, rename" => ChangeKind::EditRename,
            _ => ChangeKind::Unrecognized(value),
        }
    }
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeKind::Add => write!(f, "add"),
            ChangeKind::Edit => write!(f, "edit"),
            ChangeKind::Delete => write!(f, "delete"),
            ChangeKind::EditRename => write!(f, "edit, rename"),
            ChangeKind::Unrecognized(other) => write!(f, "{other}"),
        }
    }
}

/// `{ "value": [...] }` envelope used by the list endpoints.
#[derive(Debug, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
}

/// Body of `diffs/commits`.
#[derive(Debug, Deserialize)]
pub struct CommitDiffsResponse {
    #[serde(default)]
    pub changes: Vec<Change>,
}
