use std::collections::HashSet;

use time::OffsetDateTime;

/// GitHub login of a user (or slug of a team for review requests).
pub type Identity = String;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewState {
    Approved,
    ChangesRequested,
    Commented,
    /// Any other state GitHub reports (DISMISSED, PENDING, ...), kept verbatim.
    Other(String),
}

impl ReviewState {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "APPROVED" => Self::Approved,
            "CHANGES_REQUESTED" => Self::ChangesRequested,
            "COMMENTED" => Self::Commented,
            other => Self::Other(other.to_string()),
        }
    }

    /// Approve and reject are terminal; everything else can be superseded.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::ChangesRequested)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewEvent {
    pub reviewer: Identity,
    pub state: ReviewState,
    pub submitted_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Commit {
    pub committed_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub author: Identity,
    pub created_at: OffsetDateTime,
    pub url: String,
    /// `None` while GitHub is still computing mergeability.
    pub mergeable: Option<bool>,
    pub commits: Vec<Commit>,
    pub requested_reviewers: HashSet<Identity>,
    pub reviews: Vec<ReviewEvent>,
}

/// Banner color attached to a pull request in the notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Good,
    Warning,
    Danger,
}

impl Color {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Warning => "warning",
            Self::Danger => "danger",
        }
    }
}
