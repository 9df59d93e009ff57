use crate::devops::{Change, ChangeKind, DevOpsApi, DevOpsError};

use super::lines;

/// Which revisions of a changed file must be fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPlan {
    Added { target_url: String },
    Deleted { base_url: String },
    Edited { base_url: String, target_url: String },
    /// Nothing to fetch; the file contributes zero lines
    Skipped,
}

impl ContentPlan {
    /// Work out the content URLs of `change` between `base_commit` and
    /// `target_commit`. The change's own URL points at the target commit.
    pub fn for_change(change: &Change, base_commit: &str, target_commit: &str) -> Self {
        let url = change.item.url.as_str();
        match &change.change_type {
            ChangeKind::Add => ContentPlan::Added {
                target_url: url.to_string(),
            },
            ChangeKind::Delete => ContentPlan::Deleted {
                base_url: at_revision(url, target_commit, base_commit),
            },
            ChangeKind::Edit => ContentPlan::Edited {
                base_url: at_revision(url, target_commit, base_commit),
                target_url: url.to_string(),
            },
            ChangeKind::EditRename => match change.prior_path() {
                Some(prior_path) => {
                    let renamed = replace_path(url, &change.item.path, prior_path);
                    ContentPlan::Edited {
                        base_url: at_revision(&renamed, target_commit, base_commit),
                        target_url: url.to_string(),
                    }
                }
                None => ContentPlan::Skipped,
            },
            ChangeKind::Unrecognized(_) => ContentPlan::Skipped,
        }
    }

    /// URLs in the order they are fetched.
    pub fn urls(&self) -> Vec<&str> {
        match self {
            ContentPlan::Added { target_url } => vec![target_url.as_str()],
            ContentPlan::Deleted { base_url } => vec![base_url.as_str()],
            ContentPlan::Edited {
                base_url,
                target_url,
            } => vec![target_url.as_str(), base_url.as_str()],
            ContentPlan::Skipped => Vec::new(),
        }
    }
}

/// Point a content URL at another commit by rewriting its `version=` token.
fn at_revision(url: &str, from_commit: &str, to_commit: &str) -> String {
    url.replace(
        &format!("version={from_commit}"),
        &format!("version={to_commit}"),
    )
}

/// Swap the percent-encoded repository path inside a content URL.
fn replace_path(url: &str, path: &str, new_path: &str) -> String {
    let encoded_path = urlencoding::encode(strip_root(path));
    let encoded_new_path = urlencoding::encode(strip_root(new_path));
    url.replace(&*encoded_path, &encoded_new_path)
}

fn strip_root(path: &str) -> &str {
    path.strip_prefix('/').unwrap_or(path)
}

/// Fetched revisions of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContents {
    Added { target: String },
    Deleted { base: String },
    Edited { base: String, target: String },
}

impl FileContents {
    pub fn delta(&self) -> i64 {
        match self {
            FileContents::Added { target } => lines::added_delta(target),
            FileContents::Deleted { base } => lines::deleted_delta(base),
            FileContents::Edited { base, target } => lines::edited_delta(base, target),
        }
    }
}

/// Fetch every revision named by `plan`. `Ok(None)` for skipped files.
pub async fn fetch_contents<A: DevOpsApi + ?Sized>(
    api: &A,
    plan: &ContentPlan,
) -> Result<Option<FileContents>, DevOpsError> {
    let contents = match plan {
        ContentPlan::Added { target_url } => FileContents::Added {
            target: api.fetch_content(target_url).await?,
        },
        ContentPlan::Deleted { base_url } => FileContents::Deleted {
            base: api.fetch_content(base_url).await?,
        },
        ContentPlan::Edited {
            base_url,
            target_url,
        } => {
            let target = api.fetch_content(target_url).await?;
            let base = api.fetch_content(base_url).await?;
            FileContents::Edited { base, target }
        }
        ContentPlan::Skipped => return Ok(None),
    };
    Ok(Some(contents))
}
