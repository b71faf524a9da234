//! Release window resolution.
//!
//! A release window is the ordered list of commits between the build commit
//! of a snapshot and the boundary of the previous release. The boundary is
//! the previous version's tag, refined by the fork point of the previous
//! release branch when that fork happened after the tag was cut.

use std::fmt;

use tracing::{debug, info, warn};

use crate::error::WindowError;
use crate::version::{BranchPointer, Version};

use super::gateway::{Commit, RepositoryGateway, Tag, is_merge, keep_all};

/// Inputs for one window resolution.
#[derive(Debug, Clone)]
pub struct WindowRequest {
    /// Version being released.
    pub version: Version,
    /// Commit the snapshot was built from.
    pub build_commit: String,
    /// Current head of the component's source, used to report commits that
    /// landed after the build was cut.
    pub head_commit: Option<String>,
    /// Target branch of the build.
    pub branch: Option<String>,
    /// Explicit lower bound, bypassing tag and branch boundary logic.
    pub tail_override: Option<String>,
}

/// What determined the lower bound of the window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundaryKind {
    Tag { name: String },
    ForkPoint { branch: String },
    Override,
}

/// The commit ending the previous release's scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Boundary {
    pub sha: String,
    pub kind: BoundaryKind,
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            BoundaryKind::Tag { name } => write!(f, "tag {} ({})", name, self.sha),
            BoundaryKind::ForkPoint { branch } => {
                write!(f, "fork point of {} ({})", branch, self.sha)
            }
            BoundaryKind::Override => write!(f, "override {}", self.sha),
        }
    }
}

/// Resolved commit range of a release.
#[derive(Debug, Clone)]
pub struct ReleaseWindow {
    pub boundary: Boundary,
    /// Non-merge commits in the release, newest first.
    pub commits: Vec<Commit>,
    /// Commits on the component head that are not part of the build.
    pub missing_merges: Vec<Commit>,
}

/// Computes release windows against a repository gateway.
pub struct ReleaseWindowResolver<'a, G: RepositoryGateway + ?Sized> {
    repo: &'a G,
}

impl<'a, G: RepositoryGateway + ?Sized> ReleaseWindowResolver<'a, G> {
    pub fn new(repo: &'a G) -> Self {
        Self { repo }
    }

    /// Resolve the window for `request`.
    pub async fn resolve(&self, request: &WindowRequest) -> Result<ReleaseWindow, WindowError> {
        let missing_merges = match request.head_commit.as_deref() {
            Some(head) if head != request.build_commit => {
                self.repo
                    .list_commits(head, &request.build_commit, is_merge)
                    .await?
            }
            _ => Vec::new(),
        };
        debug!(count = missing_merges.len(), "Commits since build");

        if let Some(tail) = request.tail_override.as_deref() {
            info!(tail, "Using explicit tail commit");
            let commits = self
                .repo
                .list_commits(&request.build_commit, tail, is_merge)
                .await?;
            return Ok(ReleaseWindow {
                boundary: Boundary {
                    sha: tail.to_string(),
                    kind: BoundaryKind::Override,
                },
                commits,
                missing_merges,
            });
        }

        let tags = self.repo.list_tags().await?;
        let tag = find_boundary_tag(&tags, &request.version)?;
        info!(tag = %tag.name, sha = %tag.sha, "Previous release tag");

        let fork = match request.branch.as_deref() {
            Some(branch) => self.fork_point(branch, &request.build_commit).await?,
            None => None,
        };

        let mut boundary = Boundary {
            sha: tag.sha.clone(),
            kind: BoundaryKind::Tag {
                name: tag.name.clone(),
            },
        };
        if let Some((branch, fork_sha)) = &fork {
            if fork_sha != &tag.sha
                && self
                    .is_after(&request.build_commit, &tag.sha, fork_sha)
                    .await?
            {
                info!(branch = %branch, sha = %fork_sha, "Fork point supersedes tag boundary");
                boundary = Boundary {
                    sha: fork_sha.clone(),
                    kind: BoundaryKind::ForkPoint {
                        branch: branch.clone(),
                    },
                };
            }
        }

        let mut commits = self
            .repo
            .list_commits(&request.build_commit, &boundary.sha, is_merge)
            .await?;

        let fork_sha = fork.as_ref().map(|(_, sha)| sha.as_str());
        if let Some(pos) = commits
            .iter()
            .position(|c| c.sha == tag.sha || Some(c.sha.as_str()) == fork_sha)
        {
            warn!(sha = %commits[pos].sha, "Boundary commit leaked into listing, truncating");
            commits.truncate(pos);
        }

        Ok(ReleaseWindow {
            boundary,
            commits,
            missing_merges,
        })
    }

    /// Merge-base of the previous release branch and the build commit.
    async fn fork_point(
        &self,
        branch: &str,
        build_commit: &str,
    ) -> Result<Option<(String, String)>, WindowError> {
        let Some(previous) = BranchPointer::parse(branch).and_then(|b| b.previous()) else {
            debug!(branch, "Branch has no previous release branch");
            return Ok(None);
        };
        let previous = previous.name();
        let sha = self.repo.merge_base(&previous, build_commit).await?;
        debug!(branch = %previous, sha = %sha, "Previous release branch fork point");
        Ok(Some((previous, sha)))
    }

    /// Whether `candidate` lies on the history walk from `head` down to `boundary`.
    ///
    /// The walk is cut at `boundary` here as well, since a gateway may list
    /// past the requested stop.
    async fn is_after(
        &self,
        head: &str,
        boundary: &str,
        candidate: &str,
    ) -> Result<bool, WindowError> {
        let walk = self.repo.list_commits(head, boundary, keep_all).await?;
        Ok(walk
            .iter()
            .take_while(|c| c.sha != boundary)
            .any(|c| c.sha == candidate))
    }
}

/// Find the tag marking the end of the previous release.
///
/// - Patch releases (`X.Y.Z`, Z > 0) require the exact tag `vX.Y.(Z-1)`.
/// - Minor releases (`X.Y.0`) use the highest patch tag of line `X.(Y-1)`.
///   Tags that do not parse as versions are skipped with a warning.
pub fn find_boundary_tag(tags: &[Tag], version: &Version) -> Result<Tag, WindowError> {
    if let Some(expected) = version.previous_patch_tag() {
        return tags
            .iter()
            .find(|t| t.name == expected)
            .cloned()
            .ok_or(WindowError::NoPreviousTag { expected });
    }

    let Some(previous_minor) = version.previous_minor() else {
        return Err(WindowError::NoPreviousTag {
            expected: format!("a v{}.x.y tag preceding v{}", version.major, version),
        });
    };

    let mut best: Option<(u64, &Tag)> = None;
    for tag in tags {
        let parsed = match Version::parse(&tag.name) {
            Ok(v) => v,
            Err(e) => {
                warn!(tag = %tag.name, error = %e, "Unable to parse tag as a version, skipping");
                continue;
            }
        };
        if parsed.major == version.major
            && parsed.minor == previous_minor
            && best.is_none_or(|(patch, _)| parsed.patch > patch)
        {
            best = Some((parsed.patch, tag));
        }
    }

    best.map(|(_, tag)| tag.clone())
        .ok_or(WindowError::NoPreviousTag {
            expected: format!("v{}.{}.*", version.major, previous_minor),
        })
}
