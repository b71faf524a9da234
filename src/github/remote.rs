//! GitHub repository URL parsing.

use crate::error::GatewayError;

/// Extract owner and repo from a GitHub remote URL.
///
/// Accepts `https://github.com/owner/repo(.git)` and `git@github.com:owner/repo(.git)`.
pub fn parse_github_remote(url: &str) -> Result<(String, String), GatewayError> {
    if let Some(path) = url.strip_prefix("git@github.com:") {
        return parse_owner_repo_path(path, url);
    }

    let parsed = url::Url::parse(url)
        .map_err(|_| GatewayError::InvalidRepositoryUrl(url.to_string()))?;
    match parsed.host_str() {
        Some("github.com") | Some("www.github.com") => {
            parse_owner_repo_path(parsed.path().trim_start_matches('/'), url)
        }
        Some(host) => Err(GatewayError::UnsupportedProvider(host.to_string())),
        None => Err(GatewayError::InvalidRepositoryUrl(url.to_string())),
    }
}

fn parse_owner_repo_path(path: &str, url: &str) -> Result<(String, String), GatewayError> {
    let path = path.trim_end_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    let mut parts = path.split('/');

    match (parts.next(), parts.next()) {
        (Some(owner), Some(repo)) if !owner.is_empty() && !repo.is_empty() => {
            Ok((owner.to_string(), repo.to_string()))
        }
        _ => Err(GatewayError::InvalidRepositoryUrl(url.to_string())),
    }
}
