//! The source-control capability set consumed by window resolution.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// A tag and the commit it points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub sha: String,
}

/// A commit as seen by window resolution and issue extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub sha: String,
    pub message: String,
    pub parent_count: usize,
}

impl Commit {
    /// First line of the commit message.
    pub fn subject(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }
}

/// Predicate selecting commits to omit from a listing.
pub type CommitFilter = fn(&Commit) -> bool;

/// Excludes merge commits.
pub fn is_merge(commit: &Commit) -> bool {
    commit.parent_count > 1
}

/// Excludes nothing.
pub fn keep_all(_commit: &Commit) -> bool {
    false
}

/// Operations the release core needs from a hosted or local repository.
#[async_trait]
pub trait RepositoryGateway: Send + Sync {
    /// All tags of the repository. Order is not significant.
    async fn list_tags(&self) -> Result<Vec<Tag>, GatewayError>;

    /// Commits reachable from `from`, newest first, stopping before `until`.
    ///
    /// `until` itself is never returned. Commits for which `exclude` returns
    /// true are skipped but still consumed. If `until` is never encountered
    /// the whole reachable history is returned.
    async fn list_commits(
        &self,
        from: &str,
        until: &str,
        exclude: CommitFilter,
    ) -> Result<Vec<Commit>, GatewayError>;

    /// Lowest common ancestor of two references.
    async fn merge_base(&self, a: &str, b: &str) -> Result<String, GatewayError>;
}
