use async_trait::async_trait;
use tracing::debug;

use super::types::{Change, PullRequest};
use super::{DevOpsApi, DevOpsError};

/// An endpoint that can be read one skip/top page at a time.
#[async_trait]
pub trait PageSource: Send + Sync {
    type Item: Send;

    async fn fetch_page(&self, skip: usize, top: usize) -> Result<Vec<Self::Item>, DevOpsError>;
}

#[async_trait]
impl<'s, T: PageSource + ?Sized> PageSource for &'s T {
    type Item = T::Item;

    async fn fetch_page(&self, skip: usize, top: usize) -> Result<Vec<Self::Item>, DevOpsError> {
        (**self).fetch_page(skip, top).await
    }
}

/// Walks a [`PageSource`] page by page.
///
/// The offset advances by the page size after every non-empty page; the
/// first empty page ends the walk. Nothing is deduplicated.
pub struct Paginator<S> {
    source: S,
    top: usize,
    skip: usize,
    exhausted: bool,
}

impl<S: PageSource> Paginator<S> {
    pub fn new(source: S, top: usize) -> Self {
        Self {
            source,
            top: top.max(1),
            skip: 0,
            exhausted: false,
        }
    }

    /// Fetch the next page, or `None` once an empty page has been seen.
    pub async fn next_page(&mut self) -> Result<Option<Vec<S::Item>>, DevOpsError> {
        if self.exhausted {
            return Ok(None);
        }

        let page = self.source.fetch_page(self.skip, self.top).await?;
        debug!(skip = self.skip, top = self.top, items = page.len(), "fetched page");
        if page.is_empty() {
            self.exhausted = true;
            return Ok(None);
        }

        self.skip += self.top;
        Ok(Some(page))
    }

    /// Start over from the first page.
    #[allow(dead_code)] // collect_all callers never rewind
    pub fn reset(&mut self) {
        self.skip = 0;
        self.exhausted = false;
    }

    /// Concatenate every page in arrival order. Any failed page fails the
    /// whole call.
    pub async fn collect_all(mut self) -> Result<Vec<S::Item>, DevOpsError> {
        let mut items = Vec::new();
        while let Some(page) = self.next_page().await? {
            items.extend(page);
        }
        Ok(items)
    }
}

/// Completed pull requests into one branch of one repository.
pub struct PullRequestPages<'a, A: ?Sized> {
    pub api: &'a A,
    pub repository_id: &'a str,
    pub target_branch: &'a str,
    pub status: &'a str,
}

#[async_trait]
impl<'a, A: DevOpsApi + ?Sized> PageSource for PullRequestPages<'a, A> {
    type Item = PullRequest;

    async fn fetch_page(&self, skip: usize, top: usize) -> Result<Vec<PullRequest>, DevOpsError> {
        self.api
            .pull_requests_page(self.repository_id, self.target_branch, self.status, skip, top)
            .await
    }
}

/// File changes between two commits of one repository.
pub struct ChangePages<'a, A: ?Sized> {
    pub api: &'a A,
    pub repository_id: &'a str,
    pub base_commit: &'a str,
    pub target_commit: &'a str,
}

#[async_trait]
impl<'a, A: DevOpsApi + ?Sized> PageSource for ChangePages<'a, A> {
    type Item = Change;

    async fn fetch_page(&self, skip: usize, top: usize) -> Result<Vec<Change>, DevOpsError> {
        self.api
            .changes_page(
                self.repository_id,
                self.base_commit,
                self.target_commit,
                skip,
                top,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Serves pages of fixed sizes, numbering items by position.
    struct FixedPages {
        sizes: Vec<usize>,
        requests: Mutex<Vec<(usize, usize)>>,
        fail_at: Option<usize>,
    }

    impl FixedPages {
        fn new(sizes: Vec<usize>) -> Self {
            Self {
                sizes,
                requests: Mutex::new(Vec::new()),
                fail_at: None,
            }
        }
    }

    #[async_trait]
    impl PageSource for FixedPages {
        type Item = usize;

        async fn fetch_page(&self, skip: usize, top: usize) -> Result<Vec<usize>, DevOpsError> {
            let mut requests = self.requests.lock().unwrap();
            let index = requests.len();
            requests.push((skip, top));
            if self.fail_at == Some(index) {
                return Err(DevOpsError::Status {
                    url: format!("page-{index}"),
                    status: 500,
                });
            }
            let size = self.sizes.get(index).copied().unwrap_or(0);
            Ok((skip..skip + size).collect())
        }
    }

    #[tokio::test]
    async fn test_collects_pages_until_empty() {
        let source = FixedPages::new(vec![2, 2, 1, 0]);
        let items = Paginator::new(&source, 2).collect_all().await.unwrap();
        assert_eq!(items, vec![0, 1, 2, 3, 4]);
        assert_eq!(
            *source.requests.lock().unwrap(),
            vec![(0, 2), (2, 2), (4, 2), (6, 2)]
        );
    }

    #[tokio::test]
    async fn test_empty_first_page() {
        let source = FixedPages::new(vec![0]);
        let items = Paginator::new(&source, 100).collect_all().await.unwrap();
        assert!(items.is_empty());
        assert_eq!(source.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_page_aborts_fetch() {
        let mut source = FixedPages::new(vec![2, 2, 1, 0]);
        source.fail_at = Some(1);
        let result = Paginator::new(&source, 2).collect_all().await;
        assert!(matches!(result, Err(DevOpsError::Status { status: 500, .. })));
    }

    #[tokio::test]
    async fn test_next_page_stops_after_exhaustion_and_restarts() {
        let source = FixedPages::new(vec![1, 0, 3, 0]);
        let mut pages = Paginator::new(&source, 5);
        assert_eq!(pages.next_page().await.unwrap(), Some(vec![0]));
        assert_eq!(pages.next_page().await.unwrap(), None);
        assert_eq!(pages.next_page().await.unwrap(), None);
        assert_eq!(source.requests.lock().unwrap().len(), 2);

        pages.reset();
        assert_eq!(pages.next_page().await.unwrap(), Some(vec![0, 1, 2]));
    }

    #[tokio::test]
    async fn test_zero_page_size_still_advances() {
        let source = FixedPages::new(vec![1, 1, 0]);
        let items = Paginator::new(&source, 0).collect_all().await.unwrap();
        assert_eq!(items, vec![0, 1]);
    }
}
