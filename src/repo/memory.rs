use std::cell::RefCell;
use std::collections::HashSet;

use anyhow::{Result, anyhow};
use time::{Duration, OffsetDateTime};

use super::PullRequestSource;
use crate::domain::pull_request::{Commit, PullRequest, Repository, ReviewEvent, ReviewState};

/// Open pull request together with the base branch it targets.
#[derive(Debug, Clone)]
pub struct SeededPull {
    pub base: String,
    pub pull: PullRequest,
}

/// Fixed snapshot of repositories, used by `--demo` and tests.
#[derive(Default)]
pub struct InMemorySource {
    repositories: Vec<(Repository, Vec<SeededPull>)>,
    fetched: RefCell<Vec<String>>,
}

impl InMemorySource {
    pub fn with_seed(seed: impl IntoIterator<Item = (Repository, Vec<SeededPull>)>) -> Self {
        let mut source = Self::default();
        source.repositories.extend(seed);
        source
    }

    /// Names of repositories whose pull requests were requested, in order.
    #[cfg(test)]
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.borrow().clone()
    }
}

impl PullRequestSource for InMemorySource {
    async fn repositories(&self, _organization: &str) -> Result<Vec<Repository>> {
        Ok(self.repositories.iter().map(|(r, _)| r.clone()).collect())
    }

    async fn open_pull_requests(
        &self,
        _organization: &str,
        repository: &Repository,
        base: Option<&str>,
    ) -> Result<Vec<PullRequest>> {
        self.fetched.borrow_mut().push(repository.name.clone());
        let (_, pulls) = self
            .repositories
            .iter()
            .find(|(r, _)| r.name == repository.name)
            .ok_or_else(|| anyhow!("repository {} not found", repository.name))?;
        Ok(pulls
            .iter()
            .filter(|p| base.is_none_or(|b| p.base == b))
            .map(|p| p.pull.clone())
            .collect())
    }
}

/// A small organization showing every banner color, relative to `now`.
pub fn demo_seed(organization: &str, now: OffsetDateTime) -> InMemorySource {
    let ago = |minutes: i64| now - Duration::minutes(minutes);
    let review = |reviewer: &str, state, minutes| ReviewEvent {
        reviewer: reviewer.to_string(),
        state,
        submitted_at: ago(minutes),
    };
    let pull = |number: u64, title: &str, author: &str, created: i64, commit: i64| PullRequest {
        number,
        title: title.to_string(),
        author: author.to_string(),
        created_at: ago(created),
        url: format!("https://github.com/{organization}/widgets/pull/{number}"),
        mergeable: Some(true),
        commits: vec![Commit {
            committed_at: ago(commit),
        }],
        requested_reviewers: HashSet::new(),
        reviews: Vec::new(),
    };

    let mut approved = pull(1, "Add sprocket support", "octocat", 3 * 24 * 60, 2 * 24 * 60);
    approved.reviews = vec![review("alice", ReviewState::Approved, 60)];

    let mut stale = pull(2, "Refactor gear train", "alice", 26 * 60, 10);
    stale.reviews = vec![review("bob", ReviewState::Approved, 120)];

    let mut rejected = pull(3, "Drop legacy cogs", "bob", 90, 80);
    rejected.reviews = vec![
        review("carol", ReviewState::Commented, 70),
        review("carol", ReviewState::ChangesRequested, 60),
    ];

    let mut pending = pull(4, "Document flywheel", "carol", 5, 5);
    pending.requested_reviewers = ["octocat".to_string()].into();

    let mut draft = pull(5, "WIP: experimental ratchet", "octocat", 1, 1);
    draft.mergeable = None;

    let widgets = Repository {
        name: "widgets".to_string(),
        url: format!("https://github.com/{organization}/widgets"),
    };
    let main = |pull| SeededPull {
        base: "main".to_string(),
        pull,
    };
    InMemorySource::with_seed([(
        widgets,
        vec![main(approved), main(stale), main(rejected), main(pending), main(draft)],
    )])
}
