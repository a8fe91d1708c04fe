// GraphQL response shapes for the organization and pull request queries.

#[derive(Debug, serde::Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    pub errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, serde::Deserialize)]
pub struct GraphQlError {
    pub message: String,
}

#[derive(Debug, serde::Deserialize)]
pub struct PageInfo {
    #[serde(rename = "hasNextPage")]
    pub has_next_page: bool,
    #[serde(rename = "endCursor")]
    pub end_cursor: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
pub struct Connection<T> {
    #[serde(rename = "pageInfo")]
    pub page_info: Option<PageInfo>,
    pub nodes: Option<Vec<Option<T>>>,
}

impl<T> Connection<T> {
    pub fn into_nodes(self) -> impl Iterator<Item = T> {
        self.nodes.unwrap_or_default().into_iter().flatten()
    }
}

#[derive(Debug, serde::Deserialize)]
pub struct OrganizationData {
    pub organization: Option<Organization>,
}

#[derive(Debug, serde::Deserialize)]
pub struct Organization {
    pub repositories: Connection<RepositoryNode>,
}

#[derive(Debug, serde::Deserialize)]
pub struct RepositoryNode {
    pub name: String,
    pub url: String,
}

#[derive(Debug, serde::Deserialize)]
pub struct RepositoryData {
    pub repository: Option<RepositoryPulls>,
}

#[derive(Debug, serde::Deserialize)]
pub struct RepositoryPulls {
    #[serde(rename = "pullRequests")]
    pub pull_requests: Connection<PullRequestNode>,
}

#[derive(Debug, serde::Deserialize)]
pub struct Actor {
    pub login: String,
}

#[derive(Debug, serde::Deserialize)]
pub struct PullRequestNode {
    pub number: u64,
    pub title: String,
    pub url: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    pub author: Option<Actor>,
    pub mergeable: Option<String>, // "MERGEABLE" | "CONFLICTING" | "UNKNOWN"
    pub commits: Option<Connection<CommitNode>>,
    pub reviews: Option<Connection<ReviewNode>>,
    #[serde(rename = "reviewRequests")]
    pub review_requests: Option<Connection<ReviewRequestNode>>,
}

#[derive(Debug, serde::Deserialize)]
pub struct CommitNode {
    pub commit: CommitInner,
}

#[derive(Debug, serde::Deserialize)]
pub struct CommitInner {
    #[serde(rename = "committedDate")]
    pub committed_date: String,
}

#[derive(Debug, serde::Deserialize)]
pub struct ReviewNode {
    pub author: Option<Actor>,
    pub state: String,
    #[serde(rename = "submittedAt")]
    pub submitted_at: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
pub struct ReviewRequestNode {
    #[serde(rename = "requestedReviewer")]
    pub requested_reviewer: Option<RequestedReviewer>,
}

#[derive(Debug, serde::Deserialize)]
pub struct RequestedReviewer {
    #[serde(rename = "__typename")]
    pub typename: Option<String>,
    pub login: Option<String>, // User
    pub slug: Option<String>,  // Team
}

/// `repository.pullRequest(number:)`, used for review pages and mergeable refreshes.
#[derive(Debug, serde::Deserialize)]
pub struct FollowUpData {
    pub repository: Option<FollowUpRepository>,
}

#[derive(Debug, serde::Deserialize)]
pub struct FollowUpRepository {
    #[serde(rename = "pullRequest")]
    pub pull_request: Option<FollowUpPull>,
}

#[derive(Debug, serde::Deserialize)]
pub struct FollowUpPull {
    pub mergeable: Option<String>,
    pub reviews: Option<Connection<ReviewNode>>,
}
