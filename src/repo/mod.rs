use anyhow::Result;

use crate::domain::pull_request::{PullRequest, Repository};

pub mod github;
pub mod memory;

/// Where repositories and their open pull requests come from.
///
/// Implementations hand back UTC timestamps and surface transport errors as-is.
#[allow(async_fn_in_trait)]
pub trait PullRequestSource {
    async fn repositories(&self, organization: &str) -> Result<Vec<Repository>>;

    /// Open pull requests, restricted to those targeting `base` when given.
    async fn open_pull_requests(
        &self,
        organization: &str,
        repository: &Repository,
        base: Option<&str>,
    ) -> Result<Vec<PullRequest>>;
}
