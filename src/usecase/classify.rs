use std::collections::{BTreeMap, HashMap, HashSet};

use thiserror::Error;
use time::OffsetDateTime;
use tracing::warn;

use crate::domain::pull_request::{Color, Commit, Identity, PullRequest, ReviewState};
use crate::domain::review::ReviewVerdict;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClassifyError {
    #[error("pull request #{number} has no commits")]
    NoCommits { number: u64 },
}

pub fn latest_commit_timestamp(
    number: u64,
    commits: &[Commit],
) -> Result<OffsetDateTime, ClassifyError> {
    commits
        .iter()
        .map(|c| c.committed_at)
        .max()
        .ok_or(ClassifyError::NoCommits { number })
}

/// Decide the banner color for a pull request.
///
/// Rules, first match wins:
/// 1. pushed after the latest change request: warning
/// 2. change request still unaddressed: danger
/// 3. pushed after the earliest approval: warning
/// 4. nobody left to review and GitHub says mergeable: good
pub fn classify(
    verdicts: &HashMap<Identity, ReviewVerdict>,
    requested_reviewers: &HashSet<Identity>,
    latest_commit: OffsetDateTime,
    mergeable: Option<bool>,
) -> Option<Color> {
    let earliest_approval = verdicts
        .values()
        .filter(|v| v.state == ReviewState::Approved)
        .map(|v| v.submitted_at)
        .min();
    let latest_rejection = verdicts
        .values()
        .filter(|v| v.state == ReviewState::ChangesRequested)
        .map(|v| v.submitted_at)
        .max();

    match (latest_rejection, earliest_approval) {
        (Some(rejected), _) if latest_commit > rejected => Some(Color::Warning),
        (Some(_), _) => Some(Color::Danger),
        (None, Some(approved)) if latest_commit > approved => Some(Color::Warning),
        _ if requested_reviewers.is_empty() && mergeable == Some(true) => Some(Color::Good),
        _ => None,
    }
}

/// [`classify`] for a fetched pull request; a pull request without commits
/// is logged and left unclassified.
pub fn classify_pull_request(
    pr: &PullRequest,
    verdicts: &HashMap<Identity, ReviewVerdict>,
) -> Option<Color> {
    match latest_commit_timestamp(pr.number, &pr.commits) {
        Ok(latest_commit) => classify(
            verdicts,
            &pr.requested_reviewers,
            latest_commit,
            pr.mergeable,
        ),
        Err(err) => {
            warn!(url = %pr.url, "{err}; leaving it unclassified");
            None
        }
    }
}

/// Reviewer names for display, one per identity, approved ones struck through.
///
/// Requested reviewers are pending (again), so they are never struck.
pub fn reviewer_display(
    verdicts: &HashMap<Identity, ReviewVerdict>,
    requested_reviewers: &HashSet<Identity>,
) -> Vec<String> {
    let mut approved: BTreeMap<&str, bool> = BTreeMap::new();
    for (reviewer, verdict) in verdicts {
        approved.insert(reviewer.as_str(), verdict.state == ReviewState::Approved);
    }
    for reviewer in requested_reviewers {
        approved.insert(reviewer.as_str(), false);
    }
    approved
        .into_iter()
        .map(|(reviewer, done)| {
            if done {
                format!("~{reviewer}~")
            } else {
                reviewer.to_string()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pull_request::ReviewEvent;
    use crate::domain::review::aggregate;
    use crate::testutil::{pull, review, ts};

    fn verdicts_of(reviews: &[ReviewEvent]) -> HashMap<Identity, ReviewVerdict> {
        aggregate(reviews, &HashSet::new())
    }

    fn requested(names: &[&str]) -> HashSet<Identity> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn unaddressed_change_request_is_danger() {
        let v = verdicts_of(&[review("a", ReviewState::ChangesRequested, 100)]);
        assert_eq!(classify(&v, &requested(&[]), ts(50), Some(true)), Some(Color::Danger));
    }

    #[test]
    fn commit_after_change_request_is_warning() {
        let v = verdicts_of(&[review("a", ReviewState::ChangesRequested, 100)]);
        assert_eq!(classify(&v, &requested(&[]), ts(150), Some(true)), Some(Color::Warning));
    }

    #[test]
    fn fixed_rejection_stays_warning_however_old() {
        let v = verdicts_of(&[review("a", ReviewState::ChangesRequested, 1)]);
        assert_eq!(
            classify(&v, &requested(&["b"]), ts(1_000_000_000), None),
            Some(Color::Warning)
        );
    }

    #[test]
    fn commit_after_approval_is_stale_warning() {
        let v = verdicts_of(&[review("a", ReviewState::Approved, 100)]);
        assert_eq!(classify(&v, &requested(&[]), ts(150), Some(true)), Some(Color::Warning));
    }

    #[test]
    fn approved_and_mergeable_is_good() {
        let v = verdicts_of(&[review("a", ReviewState::Approved, 100)]);
        assert_eq!(classify(&v, &requested(&[]), ts(50), Some(true)), Some(Color::Good));
    }

    #[test]
    fn approved_but_reviewers_pending_is_unclassified() {
        let v = verdicts_of(&[review("a", ReviewState::Approved, 100)]);
        assert_eq!(classify(&v, &requested(&["b"]), ts(50), Some(true)), None);
    }

    #[test]
    fn unreviewed_pull_request_depends_on_mergeable_flag() {
        let v = HashMap::new();
        assert_eq!(classify(&v, &requested(&[]), ts(10), Some(true)), Some(Color::Good));
        assert_eq!(classify(&v, &requested(&[]), ts(10), Some(false)), None);
        assert_eq!(classify(&v, &requested(&[]), ts(10), None), None);
    }

    #[test]
    fn rejection_is_checked_before_approval() {
        let v = verdicts_of(&[
            review("a", ReviewState::Approved, 100),
            review("b", ReviewState::ChangesRequested, 200),
        ]);
        assert_eq!(classify(&v, &requested(&[]), ts(150), Some(true)), Some(Color::Danger));
        assert_eq!(classify(&v, &requested(&[]), ts(250), Some(true)), Some(Color::Warning));
    }

    #[test]
    fn earliest_approval_and_latest_rejection_are_used() {
        let v = verdicts_of(&[
            review("a", ReviewState::Approved, 100),
            review("b", ReviewState::Approved, 300),
        ]);
        assert_eq!(classify(&v, &requested(&[]), ts(200), Some(true)), Some(Color::Warning));

        let v = verdicts_of(&[
            review("a", ReviewState::ChangesRequested, 100),
            review("b", ReviewState::ChangesRequested, 300),
        ]);
        assert_eq!(classify(&v, &requested(&[]), ts(200), Some(true)), Some(Color::Danger));
    }

    #[test]
    fn latest_commit_is_the_maximum_not_the_last() {
        let mut pr = pull(1, "author", 300);
        pr.commits.push(Commit { committed_at: ts(100) });
        assert_eq!(latest_commit_timestamp(pr.number, &pr.commits), Ok(ts(300)));
    }

    #[test]
    fn pull_request_without_commits_is_unclassified() {
        let mut pr = pull(7, "author", 0);
        pr.commits.clear();
        pr.mergeable = Some(true);
        assert_eq!(
            latest_commit_timestamp(pr.number, &pr.commits),
            Err(ClassifyError::NoCommits { number: 7 })
        );
        let v = verdicts_of(&[review("a", ReviewState::ChangesRequested, 100)]);
        assert_eq!(classify_pull_request(&pr, &v), None);
    }

    #[test]
    fn reviewer_display_strikes_approvals_and_merges_requests() {
        let v = verdicts_of(&[
            review("alice", ReviewState::Approved, 1),
            review("bob", ReviewState::Commented, 2),
        ]);
        let shown = reviewer_display(&v, &requested(&["bob", "carol"]));
        assert_eq!(shown, vec!["~alice~", "bob", "carol"]);
    }

    #[test]
    fn re_requested_reviewer_is_not_struck() {
        let v = verdicts_of(&[review("alice", ReviewState::Approved, 1)]);
        let shown = reviewer_display(&v, &requested(&["alice"]));
        assert_eq!(shown, vec!["alice"]);
    }
}
