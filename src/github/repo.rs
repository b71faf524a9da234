//! Repository gateway over the GitHub REST API via octocrab.

use async_trait::async_trait;
use octocrab::Octocrab;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::GatewayError;
use crate::git::gateway::{Commit, CommitFilter, RepositoryGateway, Tag};

/// Page size used for tag and commit listings (GitHub maximum).
pub const COMMITS_PER_PAGE: u8 = 100;

#[derive(Debug, Deserialize)]
struct ApiTag {
    name: String,
    commit: ApiSha,
}

#[derive(Debug, Deserialize)]
struct ApiSha {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct ApiCommit {
    sha: String,
    commit: ApiCommitDetail,
    #[serde(default)]
    parents: Vec<ApiSha>,
}

#[derive(Debug, Deserialize)]
struct ApiCommitDetail {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ApiComparison {
    merge_base_commit: ApiSha,
}

#[derive(Debug, Serialize)]
struct PageQuery<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
    per_page: u8,
    page: u32,
}

impl From<ApiCommit> for Commit {
    fn from(api: ApiCommit) -> Self {
        Commit {
            sha: api.sha,
            message: api.commit.message,
            parent_count: api.parents.len(),
        }
    }
}

/// A repository hosted on GitHub.
pub struct GitHubRepository {
    client: Octocrab,
    owner: String,
    name: String,
}

impl GitHubRepository {
    /// Build a client, authenticated when a token is available.
    pub fn new(owner: &str, name: &str, token: Option<String>) -> Result<Self, GatewayError> {
        let builder = Octocrab::builder();
        let client = match token {
            Some(token) => builder.personal_token(token).build(),
            None => {
                warn!("No GitHub token found, using unauthenticated API access");
                builder.build()
            }
        }
        .map_err(|e| GatewayError::GitHub(Box::new(e)))?;

        Ok(Self::with_client(client, owner, name))
    }

    /// Use a pre-configured octocrab client.
    ///
    /// This allows dependency injection for testing with mock servers.
    pub fn with_client(client: Octocrab, owner: &str, name: &str) -> Self {
        Self {
            client,
            owner: owner.to_string(),
            name: name.to_string(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn route(&self, suffix: &str) -> String {
        format!("/repos/{}/{}/{}", self.owner, self.name, suffix)
    }

    fn map_error(&self, e: octocrab::Error) -> GatewayError {
        let err_display = e.to_string();
        let err_debug = format!("{:?}", e);

        if err_display.to_lowercase().contains("rate limit")
            || err_debug.to_lowercase().contains("rate limit")
        {
            return GatewayError::RateLimited;
        }
        if err_display.contains("Not Found") || err_debug.contains("Not Found") {
            return GatewayError::RepositoryNotFound {
                owner: self.owner.clone(),
                repo: self.name.clone(),
            };
        }
        GatewayError::GitHub(Box::new(e))
    }

    /// Lazily page through the commit history starting at `from`.
    pub fn commit_pages(&self, from: &str) -> CommitPager<'_> {
        CommitPager {
            repo: self,
            start: from.to_string(),
            next_page: 1,
            exhausted: false,
        }
    }
}

/// Produces one page of commits per call, newest first.
///
/// Pages are requested only on demand so a listing that finds its boundary
/// early never fetches the rest of the history.
pub struct CommitPager<'a> {
    repo: &'a GitHubRepository,
    start: String,
    next_page: u32,
    exhausted: bool,
}

impl CommitPager<'_> {
    /// Fetch the next page, or `None` once the history is exhausted.
    pub async fn next_page(&mut self) -> Result<Option<Vec<Commit>>, GatewayError> {
        if self.exhausted {
            return Ok(None);
        }

        let query = PageQuery {
            sha: Some(&self.start),
            per_page: COMMITS_PER_PAGE,
            page: self.next_page,
        };
        debug!(page = self.next_page, start = %self.start, "Fetching commit page");

        let items: Vec<ApiCommit> = self
            .repo
            .client
            .get(self.repo.route("commits"), Some(&query))
            .await
            .map_err(|e| self.repo.map_error(e))?;

        if items.len() < COMMITS_PER_PAGE as usize {
            self.exhausted = true;
        }
        self.next_page += 1;

        if items.is_empty() {
            return Ok(None);
        }
        Ok(Some(items.into_iter().map(Commit::from).collect()))
    }
}

#[async_trait]
impl RepositoryGateway for GitHubRepository {
    async fn list_tags(&self) -> Result<Vec<Tag>, GatewayError> {
        let mut tags = Vec::new();
        let mut page = 1u32;

        loop {
            let query = PageQuery {
                sha: None,
                per_page: COMMITS_PER_PAGE,
                page,
            };
            let items: Vec<ApiTag> = self
                .client
                .get(self.route("tags"), Some(&query))
                .await
                .map_err(|e| self.map_error(e))?;

            let count = items.len();
            tags.extend(items.into_iter().map(|t| Tag {
                name: t.name,
                sha: t.commit.sha,
            }));

            if count < COMMITS_PER_PAGE as usize {
                break;
            }
            page += 1;
        }

        debug!(count = tags.len(), owner = %self.owner, repo = %self.name, "Listed tags");
        Ok(tags)
    }

    async fn list_commits(
        &self,
        from: &str,
        until: &str,
        exclude: CommitFilter,
    ) -> Result<Vec<Commit>, GatewayError> {
        let mut commits = Vec::new();
        let mut pager = self.commit_pages(from);

        while let Some(page) = pager.next_page().await? {
            for commit in page {
                if commit.sha == until {
                    return Ok(commits);
                }
                if !exclude(&commit) {
                    commits.push(commit);
                }
            }
        }

        debug!(from, until, "Boundary not found, returning full history");
        Ok(commits)
    }

    async fn merge_base(&self, a: &str, b: &str) -> Result<String, GatewayError> {
        let comparison: ApiComparison = self
            .client
            .get(self.route(&format!("compare/{}...{}", a, b)), None::<&()>)
            .await
            .map_err(|e| self.map_error(e))?;
        Ok(comparison.merge_base_commit.sha)
    }
}
