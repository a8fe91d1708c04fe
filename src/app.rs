use anyhow::{Context, Result};
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::repo::PullRequestSource;
use crate::sink::NotificationSink;
use crate::usecase::filter::repository_allowed;
use crate::usecase::notification::{NotificationBuilder, RepositoryBatch, legend};

/// Filtering options for one run. List entries are lower-cased and trimmed.
#[derive(Debug, Clone, Default)]
pub struct NotifyConfig {
    pub ignored_words: Vec<String>,
    pub repositories: Vec<String>,
    /// Pull request authors to include; empty means everyone.
    pub usernames: Vec<String>,
    pub branch: Option<String>,
}

/// Split a comma-separated option into lower-cased, trimmed, non-empty items.
pub fn parse_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(|item| item.trim().to_lowercase())
            .filter(|item| !item.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub repositories: usize,
    pub messages: usize,
}

pub struct App<S: PullRequestSource, K: NotificationSink> {
    source: S,
    sink: K,
    organization: String,
    config: NotifyConfig,
}

impl<S: PullRequestSource, K: NotificationSink> App<S, K> {
    pub fn new(source: S, sink: K, organization: impl Into<String>, config: NotifyConfig) -> Self {
        Self {
            source,
            sink,
            organization: organization.into(),
            config,
        }
    }

    /// Classify every open pull request and send one message per repository,
    /// preceded by the color legend. Any provider or sink error aborts the run.
    pub async fn run(&self, now: OffsetDateTime) -> Result<RunSummary> {
        let batches = self.collect(now).await?;
        if batches.is_empty() {
            info!(organization = %self.organization, "no open pull requests to report");
            return Ok(RunSummary::default());
        }

        self.sink
            .send(&legend())
            .await
            .context("failed to send legend")?;
        let mut summary = RunSummary {
            repositories: batches.len(),
            messages: 1,
        };
        for batch in batches {
            self.sink
                .send(&batch.into_message())
                .await
                .context("failed to send repository message")?;
            summary.messages += 1;
        }
        info!(
            organization = %self.organization,
            repositories = summary.repositories,
            messages = summary.messages,
            "notification sent"
        );
        Ok(summary)
    }

    async fn collect(&self, now: OffsetDateTime) -> Result<Vec<RepositoryBatch>> {
        let builder = NotificationBuilder::new(self.organization.clone(), &self.config);
        let mut batches = Vec::new();
        for repository in self.source.repositories(&self.organization).await? {
            if !repository_allowed(&repository.name, &self.config.repositories) {
                debug!(repository = %repository.name, "not in allow-list, skipping");
                continue;
            }
            let pulls = self
                .source
                .open_pull_requests(&self.organization, &repository, self.config.branch.as_deref())
                .await?;
            if let Some(batch) = builder.build(&repository, &pulls, now) {
                if batch.truncated {
                    info!(
                        repository = %repository.name,
                        open = pulls.len(),
                        "too many open pull requests, truncating"
                    );
                }
                batches.push(batch);
            }
        }
        Ok(batches)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::domain::pull_request::Repository;
    use crate::repo::memory::{InMemorySource, SeededPull};
    use crate::sink::{Message, SinkError};
    use crate::testutil::{pull, ts};

    #[derive(Default)]
    struct RecordingSink {
        sent: RefCell<Vec<Message>>,
    }

    impl NotificationSink for &RecordingSink {
        async fn send(&self, message: &Message) -> Result<(), SinkError> {
            self.sent.borrow_mut().push(message.clone());
            Ok(())
        }
    }

    fn repo(name: &str) -> Repository {
        Repository {
            name: name.to_string(),
            url: format!("https://github.com/acme/{name}"),
        }
    }

    fn on_main(pulls: Vec<crate::domain::pull_request::PullRequest>) -> Vec<SeededPull> {
        pulls
            .into_iter()
            .map(|pull| SeededPull {
                base: "main".to_string(),
                pull,
            })
            .collect()
    }

    #[test]
    fn parse_list_trims_lowercases_and_drops_empty() {
        assert_eq!(parse_list(Some(" WIP, Do Not Merge ,,")), vec!["wip", "do not merge"]);
        assert!(parse_list(Some("")).is_empty());
        assert!(parse_list(None).is_empty());
    }

    #[tokio::test]
    async fn sends_legend_first_then_one_message_per_repository() {
        let source = InMemorySource::with_seed([
            (repo("widgets"), on_main(vec![pull(1, "octocat", 1)])),
            (repo("gadgets"), on_main(vec![pull(2, "octocat", 1), pull(3, "hubot", 1)])),
            (repo("empty"), Vec::new()),
        ]);
        let sink = RecordingSink::default();
        let app = App::new(source, &sink, "acme", NotifyConfig::default());

        let summary = app.run(ts(100)).await.unwrap();
        assert_eq!(
            summary,
            RunSummary {
                repositories: 2,
                messages: 3
            }
        );

        let sent = sink.sent.borrow();
        assert_eq!(sent[0], legend());
        assert!(sent[1].text.as_deref().unwrap().contains("[acme/widgets]"));
        assert_eq!(sent[2].attachments.len(), 2);
    }

    #[tokio::test]
    async fn nothing_is_sent_when_no_repository_qualifies() {
        let mut wip = pull(1, "octocat", 1);
        wip.title = "WIP: later".to_string();
        let source = InMemorySource::with_seed([(repo("widgets"), on_main(vec![wip]))]);
        let sink = RecordingSink::default();
        let config = NotifyConfig {
            ignored_words: vec!["wip".to_string()],
            ..NotifyConfig::default()
        };
        let app = App::new(source, &sink, "acme", config);

        assert_eq!(app.run(ts(100)).await.unwrap(), RunSummary::default());
        assert!(sink.sent.borrow().is_empty());
    }

    #[tokio::test]
    async fn repositories_outside_allow_list_are_not_fetched() {
        let source = InMemorySource::with_seed([
            (repo("widgets"), on_main(vec![pull(1, "octocat", 1)])),
            (repo("Gadgets"), on_main(vec![pull(2, "octocat", 1)])),
        ]);
        let sink = RecordingSink::default();
        let config = NotifyConfig {
            repositories: vec!["gadgets".to_string()],
            ..NotifyConfig::default()
        };
        let app = App::new(source, &sink, "acme", config);
        app.run(ts(100)).await.unwrap();

        assert_eq!(app.source.fetched(), vec!["Gadgets"]);
        assert_eq!(sink.sent.borrow().len(), 2);
    }

    #[tokio::test]
    async fn base_branch_is_passed_to_the_source() {
        let source = InMemorySource::with_seed([(
            repo("widgets"),
            vec![SeededPull {
                base: "release".to_string(),
                pull: pull(1, "octocat", 1),
            }],
        )]);
        let sink = RecordingSink::default();
        let config = NotifyConfig {
            branch: Some("main".to_string()),
            ..NotifyConfig::default()
        };
        let app = App::new(source, &sink, "acme", config);
        assert_eq!(app.run(ts(100)).await.unwrap(), RunSummary::default());
    }

    struct FailingSink;

    impl NotificationSink for FailingSink {
        async fn send(&self, _message: &Message) -> Result<(), SinkError> {
            Err(SinkError::Status {
                status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                body: "boom".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn sink_failure_aborts_the_run() {
        let source =
            InMemorySource::with_seed([(repo("widgets"), on_main(vec![pull(1, "octocat", 1)]))]);
        let app = App::new(source, FailingSink, "acme", NotifyConfig::default());
        let err = app.run(ts(100)).await.unwrap_err();
        assert!(format!("{err:#}").contains("boom"));
    }
}
