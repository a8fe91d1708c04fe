use std::collections::{HashMap, HashSet};

use time::OffsetDateTime;

use super::pull_request::{Identity, ReviewEvent, ReviewState};

/// Current, most authoritative review of one reviewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewVerdict {
    pub state: ReviewState,
    pub submitted_at: OffsetDateTime,
}

impl From<&ReviewEvent> for ReviewVerdict {
    fn from(event: &ReviewEvent) -> Self {
        Self {
            state: event.state.clone(),
            submitted_at: event.submitted_at,
        }
    }
}

/// Per-reviewer state machine fed with review events in submission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ReviewerState {
    #[default]
    Unreviewed,
    /// Only non-terminal reviews (comments, dismissals, ...) seen so far.
    Commented(ReviewVerdict),
    Approved(ReviewVerdict),
    ChangesRequested(ReviewVerdict),
}

impl ReviewerState {
    pub fn advance(self, event: &ReviewEvent) -> Self {
        let incoming = ReviewVerdict::from(event);
        match self {
            held @ (Self::Approved(_) | Self::ChangesRequested(_))
                if !event.state.is_terminal() =>
            {
                held
            }
            _ => match event.state {
                ReviewState::Approved => Self::Approved(incoming),
                ReviewState::ChangesRequested => Self::ChangesRequested(incoming),
                ReviewState::Commented | ReviewState::Other(_) => Self::Commented(incoming),
            },
        }
    }

    pub fn verdict(&self) -> Option<&ReviewVerdict> {
        match self {
            Self::Unreviewed => None,
            Self::Commented(v) | Self::Approved(v) | Self::ChangesRequested(v) => Some(v),
        }
    }
}

/// Collapse a review history into one verdict per reviewer.
///
/// Reviews by anyone in `exclude` are ignored; callers pass the pull request
/// author so self-reviews never count. The last approve/reject wins, and
/// comments only fill in for reviewers without a terminal verdict.
pub fn aggregate(
    reviews: &[ReviewEvent],
    exclude: &HashSet<Identity>,
) -> HashMap<Identity, ReviewVerdict> {
    let mut states: HashMap<Identity, ReviewerState> = HashMap::new();
    for review in reviews {
        if exclude.contains(&review.reviewer) {
            continue;
        }
        let state = states.entry(review.reviewer.clone()).or_default();
        *state = std::mem::take(state).advance(review);
    }
    states
        .into_iter()
        .filter_map(|(reviewer, state)| state.verdict().cloned().map(|v| (reviewer, v)))
        .collect()
}
