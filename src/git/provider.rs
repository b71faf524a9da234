//! Choose a repository gateway from a source URL.

use std::path::Path;

use crate::error::GatewayError;
use crate::github::{GitHubRepository, get_github_token, parse_github_remote};

use super::gateway::RepositoryGateway;
use super::local::LocalRepository;

/// Open the gateway matching the host of `git_url`.
///
/// - `https://github.com/...` and `git@github.com:...` use the GitHub API
/// - `file://...` and filesystem paths use a local clone
/// - any other host fails with [`GatewayError::UnsupportedProvider`]
pub fn open_repository(git_url: &str) -> Result<Box<dyn RepositoryGateway>, GatewayError> {
    if let Some(path) = git_url.strip_prefix("file://") {
        return Ok(Box::new(LocalRepository::open(path)?));
    }
    if Path::new(git_url).is_absolute() || git_url.starts_with("./") {
        return Ok(Box::new(LocalRepository::open(git_url)?));
    }

    let (owner, name) = parse_github_remote(git_url)?;
    Ok(Box::new(GitHubRepository::new(
        &owner,
        &name,
        get_github_token(),
    )?))
}
