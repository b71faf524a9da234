//! Repository gateway over a local clone using git2-rs.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use git2::{Oid, Repository};
use tracing::{debug, warn};

use crate::error::GatewayError;

use super::gateway::{Commit, CommitFilter, RepositoryGateway, Tag};

/// A repository on the local filesystem.
///
/// The repository is reopened for each call so the gateway stays `Sync`
/// without holding a `git2::Repository` across calls.
#[derive(Debug, Clone)]
pub struct LocalRepository {
    path: PathBuf,
}

impl LocalRepository {
    /// Open a local repository, failing early if the path is not a git repository.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, GatewayError> {
        let path = path.as_ref().to_path_buf();
        Repository::open(&path).map_err(GatewayError::OpenRepository)?;
        Ok(Self { path })
    }

    fn repo(&self) -> Result<Repository, GatewayError> {
        Repository::open(&self.path).map_err(GatewayError::OpenRepository)
    }
}

#[async_trait]
impl RepositoryGateway for LocalRepository {
    async fn list_tags(&self) -> Result<Vec<Tag>, GatewayError> {
        let repo = self.repo()?;
        let mut tags = Vec::new();

        repo.tag_foreach(|oid, name_bytes| {
            if let Ok(name_str) = std::str::from_utf8(name_bytes) {
                let name = name_str
                    .strip_prefix("refs/tags/")
                    .unwrap_or(name_str)
                    .to_string();

                // Annotated tags point at a tag object, lightweight tags at the commit
                let resolved = match repo.find_tag(oid) {
                    Ok(tag_obj) => tag_obj.target_id(),
                    Err(_) => oid,
                };

                tags.push(Tag {
                    name,
                    sha: resolved.to_string(),
                });
            } else {
                warn!("Skipping tag with OID {} - name is not valid UTF-8", oid);
            }
            true
        })
        .map_err(GatewayError::Git)?;

        debug!(count = tags.len(), "Listed local tags");
        Ok(tags)
    }

    async fn list_commits(
        &self,
        from: &str,
        until: &str,
        exclude: CommitFilter,
    ) -> Result<Vec<Commit>, GatewayError> {
        let repo = self.repo()?;
        let from_oid = resolve_reference(&repo, from)?;
        let until_oid = resolve_reference(&repo, until).ok();

        let mut revwalk = repo.revwalk().map_err(GatewayError::Git)?;
        revwalk
            .set_sorting(git2::Sort::TOPOLOGICAL | git2::Sort::TIME)
            .map_err(GatewayError::Git)?;
        revwalk.push(from_oid).map_err(GatewayError::Git)?;

        let mut commits = Vec::new();
        for oid in revwalk {
            let oid = oid.map_err(GatewayError::Git)?;
            if Some(oid) == until_oid || oid.to_string() == until {
                return Ok(commits);
            }
            let commit = repo.find_commit(oid).map_err(GatewayError::Git)?;
            let commit = Commit {
                sha: oid.to_string(),
                message: commit.message().unwrap_or("").to_string(),
                parent_count: commit.parent_count(),
            };
            if !exclude(&commit) {
                commits.push(commit);
            }
        }

        debug!(from, until, "Boundary not found, returning full history");
        Ok(commits)
    }

    async fn merge_base(&self, a: &str, b: &str) -> Result<String, GatewayError> {
        let repo = self.repo()?;
        let a_oid = resolve_reference(&repo, a)?;
        let b_oid = resolve_reference(&repo, b)?;
        let base = repo.merge_base(a_oid, b_oid).map_err(GatewayError::Git)?;
        Ok(base.to_string())
    }
}

/// Resolve a reference (tag, branch, commit hash) to a commit OID.
fn resolve_reference(repo: &Repository, reference: &str) -> Result<Oid, GatewayError> {
    if let Ok(oid) = Oid::from_str(reference) {
        if repo.find_commit(oid).is_ok() {
            return Ok(oid);
        }
    }

    let obj = repo
        .revparse_single(reference)
        .map_err(|e| GatewayError::ReferenceNotFound(reference.to_string(), e))?;
    let commit = obj
        .peel_to_commit()
        .map_err(|e| GatewayError::ReferenceNotFound(reference.to_string(), e))?;
    Ok(commit.id())
}
