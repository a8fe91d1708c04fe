use std::collections::HashSet;

use time::OffsetDateTime;
use tracing::debug;

use super::age::format_age;
use super::classify::{classify_pull_request, reviewer_display};
use super::filter::{author_allowed, is_allowed};
use crate::app::NotifyConfig;
use crate::domain::pull_request::{Color, PullRequest, Repository};
use crate::domain::review::aggregate;
use crate::sink::{Attachment, Field, Message};

pub const MAX_PULLS_PER_REPOSITORY: usize = 20;

const TRUNCATION_WARNING: &str = "\n*WARNING: Too many open pull requests, only 20 will be shown!*";
const FOOTER_ICON: &str = "https://github.githubassets.com/images/modules/logos_page/GitHub-Mark.png";
const NO_REVIEWERS: &str = "_No reviewers assigned_";

/// Messages for one repository, ready to hand to a sink.
#[derive(Debug, Clone)]
pub struct RepositoryBatch {
    pub header: String,
    pub attachments: Vec<Attachment>,
    /// More pull requests qualified than [`MAX_PULLS_PER_REPOSITORY`].
    pub truncated: bool,
}

impl RepositoryBatch {
    pub fn into_message(self) -> Message {
        Message {
            text: Some(self.header),
            attachments: self.attachments,
        }
    }
}

pub struct NotificationBuilder<'a> {
    organization: String,
    config: &'a NotifyConfig,
}

impl<'a> NotificationBuilder<'a> {
    pub fn new(organization: impl Into<String>, config: &'a NotifyConfig) -> Self {
        Self {
            organization: organization.into(),
            config,
        }
    }

    /// Filter, classify and format the open pull requests of one repository.
    /// Returns `None` when nothing qualifies.
    pub fn build(
        &self,
        repository: &Repository,
        pulls: &[PullRequest],
        now: OffsetDateTime,
    ) -> Option<RepositoryBatch> {
        let mut attachments: Vec<Attachment> = pulls
            .iter()
            .filter(|pr| author_allowed(&pr.author, &self.config.usernames))
            .filter(|pr| is_allowed(&pr.title, &self.config.ignored_words))
            .map(|pr| self.attachment(repository, pr, now))
            .collect();

        if attachments.is_empty() {
            debug!(repository = %repository.name, "no qualifying pull requests");
            return None;
        }

        let mut header = format!(
            "Pull requests open for `<{}|{}>`",
            repository.url,
            self.label(repository)
        );
        let truncated = attachments.len() > MAX_PULLS_PER_REPOSITORY;
        if truncated {
            header.push_str(TRUNCATION_WARNING);
            attachments.truncate(MAX_PULLS_PER_REPOSITORY);
        }

        Some(RepositoryBatch {
            header,
            attachments,
            truncated,
        })
    }

    fn label(&self, repository: &Repository) -> String {
        format!("[{}/{}]", self.organization, repository.name)
    }

    fn attachment(
        &self,
        repository: &Repository,
        pr: &PullRequest,
        now: OffsetDateTime,
    ) -> Attachment {
        let exclude: HashSet<String> = [pr.author.clone()].into();
        let verdicts = aggregate(&pr.reviews, &exclude);
        let color = classify_pull_request(pr, &verdicts);
        let reviewers = reviewer_display(&verdicts, &pr.requested_reviewers);
        let (footer, ts) = format_age(pr.created_at, now);

        debug!(
            repository = %repository.name,
            number = pr.number,
            color = color.map(Color::as_str).unwrap_or("none"),
            "classified pull request"
        );

        Attachment {
            title: Some(format!(
                "{} <{}|#{}: {}>",
                self.label(repository),
                pr.url,
                pr.number,
                pr.title
            )),
            text: None,
            color,
            fields: vec![
                Field {
                    title: "By".to_string(),
                    value: pr.author.clone(),
                    short: true,
                },
                Field {
                    title: "Reviewers".to_string(),
                    value: if reviewers.is_empty() {
                        NO_REVIEWERS.to_string()
                    } else {
                        reviewers.join(", ")
                    },
                    short: true,
                },
            ],
            footer_icon: Some(FOOTER_ICON.to_string()),
            footer: Some(footer),
            ts: Some(ts),
        }
    }
}

/// Color key sent once before the repository messages.
pub fn legend() -> Message {
    let entry = |text: &str, color| Attachment {
        text: Some(text.to_string()),
        color: Some(color),
        ..Attachment::default()
    };
    Message {
        text: None,
        attachments: vec![
            entry("Reviewed by the requested reviewers and is mergeable", Color::Good),
            entry("Commit has been pushed after an approval or change request", Color::Warning),
            entry("Change has been requested", Color::Danger),
        ],
    }
}
