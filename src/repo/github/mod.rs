pub mod model;
mod timeutil;

use std::collections::HashSet;

use anyhow::{Result, anyhow};
use model::{
    Connection, FollowUpData, FollowUpPull, GraphQlResponse, OrganizationData, PullRequestNode,
    RepositoryData, RequestedReviewer,
};
use octocrab::Octocrab;
use timeutil::parse_github_datetime;
use tracing::{debug, warn};

use super::PullRequestSource;
use crate::domain::pull_request::{Commit, PullRequest, Repository, ReviewEvent, ReviewState};

const PAGE_SIZE: i32 = 50;

/// Login GitHub reports for deleted accounts.
const GHOST: &str = "ghost";

#[derive(Debug, serde::Serialize)]
struct GraphQlPayload<V> {
    query: &'static str,
    variables: V,
}

#[derive(Debug, serde::Serialize)]
struct RepositoriesVars<'a> {
    org: &'a str,
    page_size: i32,
    cursor: Option<String>,
}

#[derive(Debug, serde::Serialize)]
struct PullRequestsVars<'a> {
    owner: &'a str,
    name: &'a str,
    base: Option<&'a str>,
    page_size: i32,
    cursor: Option<String>,
}

#[derive(Debug, serde::Serialize)]
struct PullRequestVars<'a> {
    owner: &'a str,
    name: &'a str,
    number: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    cursor: Option<String>,
}

const REPOSITORIES_QUERY: &str = r#"
query Repositories($org: String!, $page_size: Int!, $cursor: String) {
  organization(login: $org) {
    repositories(first: $page_size, after: $cursor, orderBy: {field: NAME, direction: ASC}) {
      pageInfo {
        hasNextPage
        endCursor
      }
      nodes {
        name
        url
      }
    }
  }
}
"#;

const PULL_REQUESTS_QUERY: &str = r#"
query OpenPullRequests(
  $owner: String!
  $name: String!
  $base: String
  $page_size: Int!
  $cursor: String
) {
  repository(owner: $owner, name: $name) {
    pullRequests(
      states: OPEN
      baseRefName: $base
      first: $page_size
      after: $cursor
      orderBy: {field: CREATED_AT, direction: DESC}
    ) {
      pageInfo {
        hasNextPage
        endCursor
      }
      nodes {
        number
        title
        url
        createdAt
        author {
          login
        }
        mergeable
        commits(last: 100) {
          nodes {
            commit {
              committedDate
            }
          }
        }
        reviews(first: 100) {
          pageInfo {
            hasNextPage
            endCursor
          }
          nodes {
            ...ReviewFields
          }
        }
        reviewRequests(first: 100) {
          nodes {
            requestedReviewer {
              __typename
              ... on User {
                login
              }
              ... on Team {
                slug
              }
            }
          }
        }
      }
    }
  }
}

fragment ReviewFields on PullRequestReview {
  author {
    login
  }
  state
  submittedAt
}
"#;

const REVIEWS_QUERY: &str = r#"
query PullRequestReviews($owner: String!, $name: String!, $number: Int!, $cursor: String) {
  repository(owner: $owner, name: $name) {
    pullRequest(number: $number) {
      reviews(first: 100, after: $cursor) {
        pageInfo {
          hasNextPage
          endCursor
        }
        nodes {
          author {
            login
          }
          state
          submittedAt
        }
      }
    }
  }
}
"#;

const MERGEABLE_QUERY: &str = r#"
query PullRequestMergeable($owner: String!, $name: String!, $number: Int!) {
  repository(owner: $owner, name: $name) {
    pullRequest(number: $number) {
      mergeable
    }
  }
}
"#;

fn into_data<T>(resp: GraphQlResponse<T>, what: &str) -> Result<T> {
    if let Some(errors) = resp.errors.filter(|e| !e.is_empty()) {
        let messages: Vec<_> = errors.into_iter().map(|e| e.message).collect();
        return Err(anyhow!(
            "GitHub GraphQL {what} query failed: {}",
            messages.join("; ")
        ));
    }
    resp.data
        .ok_or_else(|| anyhow!("GitHub GraphQL {what} query returned no data"))
}

/// Follow-up cursor of a page, or `None` on the last page.
fn next_cursor<T>(conn: &Connection<T>) -> Option<String> {
    let page_info = conn.page_info.as_ref()?;
    if !page_info.has_next_page {
        return None;
    }
    page_info.end_cursor.clone()
}

fn parse_mergeable(raw: Option<&str>) -> Option<bool> {
    match raw? {
        "MERGEABLE" => Some(true),
        "CONFLICTING" => Some(false),
        _ => None,
    }
}

fn requested_identity(reviewer: RequestedReviewer) -> Option<String> {
    match reviewer.typename.as_deref() {
        Some("User") => reviewer.login,
        Some("Team") => reviewer.slug,
        _ => reviewer.login.or(reviewer.slug),
    }
}

fn to_pull_request(node: PullRequestNode) -> Option<PullRequest> {
    let Some(created_at) = parse_github_datetime(&node.created_at) else {
        warn!(url = %node.url, created_at = %node.created_at, "unparsable createdAt, skipping");
        return None;
    };

    let commits = node
        .commits
        .map(Connection::into_nodes)
        .into_iter()
        .flatten()
        .filter_map(|c| parse_github_datetime(&c.commit.committed_date))
        .map(|committed_at| Commit { committed_at })
        .collect();

    let reviews = node
        .reviews
        .map(Connection::into_nodes)
        .into_iter()
        .flatten()
        .filter_map(|r| {
            // drafts have no submission time yet
            let submitted_at = parse_github_datetime(r.submitted_at.as_deref()?)?;
            Some(ReviewEvent {
                reviewer: r.author.map(|a| a.login).unwrap_or_else(|| GHOST.to_string()),
                state: ReviewState::parse(&r.state),
                submitted_at,
            })
        })
        .collect();

    let requested_reviewers: HashSet<String> = node
        .review_requests
        .map(Connection::into_nodes)
        .into_iter()
        .flatten()
        .filter_map(|n| n.requested_reviewer.and_then(requested_identity))
        .collect();

    Some(PullRequest {
        number: node.number,
        title: node.title,
        author: node
            .author
            .map(|a| a.login)
            .unwrap_or_else(|| GHOST.to_string()),
        created_at,
        url: node.url,
        mergeable: parse_mergeable(node.mergeable.as_deref()),
        commits,
        requested_reviewers,
        reviews,
    })
}

pub struct GithubSource {
    octo: Octocrab,
}

impl GithubSource {
    /// Must be called from within a Tokio runtime.
    pub fn new(token: &str, api_base: Option<&str>) -> Result<Self> {
        let mut builder = Octocrab::builder().personal_token(token.to_owned());
        if let Some(api) = api_base {
            builder = builder
                .base_uri(api)
                .map_err(|e| anyhow!("invalid GITHUB_URL: {e}"))?;
        }
        let octo = builder
            .build()
            .map_err(|e| anyhow!("failed to init GitHub client: {e}"))?;
        Ok(Self { octo })
    }

    async fn query<V, T>(&self, query: &'static str, variables: V, what: &str) -> Result<T>
    where
        V: serde::Serialize,
        T: serde::de::DeserializeOwned,
    {
        let payload = GraphQlPayload { query, variables };
        let resp: GraphQlResponse<T> = self
            .octo
            .graphql(&payload)
            .await
            .map_err(|e| anyhow!("GitHub GraphQL {what} query failed: {e:?}"))?;
        into_data(resp, what)
    }

    async fn pull_request_follow_up(
        &self,
        organization: &str,
        repository: &Repository,
        number: u64,
        query: &'static str,
        cursor: Option<String>,
        what: &str,
    ) -> Result<FollowUpPull> {
        let vars = PullRequestVars {
            owner: organization,
            name: &repository.name,
            number,
            cursor,
        };
        let data: FollowUpData = self.query(query, vars, what).await?;
        data.repository
            .and_then(|r| r.pull_request)
            .ok_or_else(|| {
                anyhow!(
                    "pull request {organization}/{}#{number} not found",
                    repository.name
                )
            })
    }

    /// Append the review pages beyond the first, so the newest verdicts are seen.
    async fn fetch_remaining_reviews(
        &self,
        organization: &str,
        repository: &Repository,
        node: &mut PullRequestNode,
    ) -> Result<()> {
        let Some(reviews) = node.reviews.as_mut() else {
            return Ok(());
        };
        let mut cursor = next_cursor(reviews);
        while let Some(after) = cursor {
            let page = self
                .pull_request_follow_up(
                    organization,
                    repository,
                    node.number,
                    REVIEWS_QUERY,
                    Some(after),
                    "reviews",
                )
                .await?
                .reviews
                .ok_or_else(|| anyhow!("reviews of #{} missing from response", node.number))?;
            cursor = next_cursor(&page);
            reviews
                .nodes
                .get_or_insert_with(Vec::new)
                .extend(page.nodes.unwrap_or_default());
        }
        Ok(())
    }

    /// GitHub computes mergeability lazily; the first query often says UNKNOWN.
    async fn refresh_mergeable(
        &self,
        organization: &str,
        repository: &Repository,
        node: &mut PullRequestNode,
    ) -> Result<()> {
        if parse_mergeable(node.mergeable.as_deref()).is_some() {
            return Ok(());
        }
        let pull = self
            .pull_request_follow_up(
                organization,
                repository,
                node.number,
                MERGEABLE_QUERY,
                None,
                "mergeable",
            )
            .await?;
        debug!(number = node.number, mergeable = ?pull.mergeable, "re-queried mergeable");
        node.mergeable = pull.mergeable;
        Ok(())
    }
}

impl PullRequestSource for GithubSource {
    async fn repositories(&self, organization: &str) -> Result<Vec<Repository>> {
        let mut out = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let vars = RepositoriesVars {
                org: organization,
                page_size: PAGE_SIZE,
                cursor: cursor.clone(),
            };
            let data: OrganizationData = self
                .query(REPOSITORIES_QUERY, vars, "repositories")
                .await?;
            let repositories = data
                .organization
                .ok_or_else(|| anyhow!("organization {organization} not found"))?
                .repositories;

            cursor = next_cursor(&repositories);
            out.extend(repositories.into_nodes().map(|r| Repository {
                name: r.name,
                url: r.url,
            }));
            if cursor.is_none() {
                break;
            }
        }
        debug!(organization, count = out.len(), "fetched repositories");
        Ok(out)
    }

    async fn open_pull_requests(
        &self,
        organization: &str,
        repository: &Repository,
        base: Option<&str>,
    ) -> Result<Vec<PullRequest>> {
        let mut out = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let vars = PullRequestsVars {
                owner: organization,
                name: &repository.name,
                base,
                page_size: PAGE_SIZE,
                cursor: cursor.clone(),
            };
            let data: RepositoryData = self
                .query(PULL_REQUESTS_QUERY, vars, "pull requests")
                .await?;
            let pulls = data
                .repository
                .ok_or_else(|| {
                    anyhow!("repository {organization}/{} not found", repository.name)
                })?
                .pull_requests;

            cursor = next_cursor(&pulls);
            for mut node in pulls.into_nodes() {
                self.fetch_remaining_reviews(organization, repository, &mut node)
                    .await?;
                self.refresh_mergeable(organization, repository, &mut node)
                    .await?;
                out.extend(to_pull_request(node));
            }
            if cursor.is_none() {
                break;
            }
        }
        debug!(repository = %repository.name, count = out.len(), "fetched open pull requests");
        Ok(out)
    }
}
