mod app;
mod domain;
mod repo;
mod sink;
mod usecase;

#[cfg(test)]
mod testutil;

use anyhow::{Result, anyhow};
use clap::Parser;
use time::OffsetDateTime;
use tracing_subscriber::EnvFilter;

use app::{App, NotifyConfig, parse_list};
use repo::PullRequestSource;
use repo::github::GithubSource;
use sink::slack::SlackWebhook;
use sink::stdout::StdoutSink;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "pr-reminder: post open pull requests of an organization to Slack",
    long_about = None
)]
struct Args {
    /// GitHub organization to scan
    #[arg(long, env = "ORGANIZATION")]
    organization: String,

    /// Personal access token for the GitHub API
    #[arg(long, env = "GITHUB_API_TOKEN", hide_env_values = true, required_unless_present = "demo")]
    github_token: Option<String>,

    /// API base URL, for GitHub Enterprise
    #[arg(long, env = "GITHUB_URL")]
    github_url: Option<String>,

    /// Slack incoming webhook URL
    #[arg(long, env = "SLACK_WEBHOOK", hide_env_values = true, required_unless_present = "dry_run")]
    slack_webhook: Option<String>,

    /// Comma-separated title keywords; matching pull requests are skipped
    #[arg(long, env = "IGNORE_WORDS")]
    ignore_words: Option<String>,

    /// Comma-separated repository names to include (default: all)
    #[arg(long, env = "REPOSITORIES")]
    repositories: Option<String>,

    /// Comma-separated pull request authors to include (default: all)
    #[arg(long, env = "USERNAMES")]
    usernames: Option<String>,

    /// Only pull requests targeting this base branch
    #[arg(long, env = "BRANCH")]
    branch: Option<String>,

    /// Print webhook payloads to stdout instead of posting them
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Use built-in sample pull requests instead of GitHub
    #[arg(long, default_value_t = false)]
    demo: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn notify_config(&self) -> NotifyConfig {
        NotifyConfig {
            ignored_words: parse_list(self.ignore_words.as_deref()),
            repositories: parse_list(self.repositories.as_deref()),
            usernames: parse_list(self.usernames.as_deref()),
            branch: self
                .branch
                .as_deref()
                .map(str::trim)
                .filter(|b| !b.is_empty())
                .map(str::to_string),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| anyhow!("failed to build tokio runtime: {e}"))?;

    rt.block_on(async move {
        let now = OffsetDateTime::now_utc();
        if args.demo {
            let source = repo::memory::demo_seed(&args.organization, now);
            run(source, &args, now).await
        } else {
            let token = github_token(args.github_token.as_deref())?;
            let source = GithubSource::new(&token, args.github_url.as_deref())?;
            run(source, &args, now).await
        }
    })
}

async fn run<S: PullRequestSource>(source: S, args: &Args, now: OffsetDateTime) -> Result<()> {
    let config = args.notify_config();
    if args.dry_run {
        App::new(source, StdoutSink, &args.organization, config)
            .run(now)
            .await?;
    } else {
        let webhook = args
            .slack_webhook
            .as_deref()
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .ok_or_else(|| anyhow!("Slack webhook is required (env SLACK_WEBHOOK)"))?;
        App::new(source, SlackWebhook::new(webhook), &args.organization, config)
            .run(now)
            .await?;
    }
    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}

fn github_token(raw: Option<&str>) -> Result<String> {
    let raw = raw.ok_or_else(|| anyhow!("GitHub token is required (env GITHUB_API_TOKEN)"))?;
    let trimmed = raw.trim().to_string();
    if trimmed.is_empty() {
        return Err(anyhow!(
            "GitHub token is empty after trimming; please re-export"
        ));
    }
    Ok(trimmed)
}
