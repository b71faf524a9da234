//! GitHub authentication detection.
//!
//! Auth order:
//! 1. `gh auth token` (gh CLI)
//! 2. GITHUB_TOKEN env var
//! 3. GH_TOKEN env var
//! 4. `~/.github/token`

use std::env;
use std::path::Path;
use std::process::Command;

/// Get a GitHub token using the configured auth strategy.
///
/// Returns `None` when no credential is available; callers fall back to
/// anonymous (rate-limited) API access.
pub fn get_github_token() -> Option<String> {
    if let Some(token) = get_token_from_gh_cli() {
        return Some(token);
    }

    for var in ["GITHUB_TOKEN", "GH_TOKEN"] {
        if let Ok(token) = env::var(var) {
            if !token.is_empty() {
                return Some(token);
            }
        }
    }

    dirs::home_dir().and_then(|home| read_token_file(&home.join(".github").join("token")))
}

/// Read a token file, trimming surrounding whitespace.
pub fn read_token_file(path: &Path) -> Option<String> {
    let token = std::fs::read_to_string(path).ok()?;
    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Try to get a token from the gh CLI.
fn get_token_from_gh_cli() -> Option<String> {
    let status = Command::new("gh").args(["auth", "status"]).output().ok()?;

    if !status.status.success() {
        return None;
    }

    let output = Command::new("gh").args(["auth", "token"]).output().ok()?;

    if output.status.success() {
        let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if !token.is_empty() {
            return Some(token);
        }
    }

    None
}
