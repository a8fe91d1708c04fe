use std::collections::HashSet;

use time::OffsetDateTime;

use crate::domain::pull_request::{Commit, PullRequest, ReviewEvent, ReviewState};

pub fn ts(secs: i64) -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(secs).unwrap()
}

pub fn review(reviewer: &str, state: ReviewState, at: i64) -> ReviewEvent {
    ReviewEvent {
        reviewer: reviewer.to_string(),
        state,
        submitted_at: ts(at),
    }
}

/// Open pull request by `author` with a single commit at `commit_at`.
pub fn pull(number: u64, author: &str, commit_at: i64) -> PullRequest {
    PullRequest {
        number,
        title: format!("Change #{number}"),
        author: author.to_string(),
        created_at: ts(0),
        url: format!("https://github.com/acme/widgets/pull/{number}"),
        mergeable: None,
        commits: vec![Commit {
            committed_at: ts(commit_at),
        }],
        requested_reviewers: HashSet::new(),
        reviews: Vec::new(),
    }
}
