//! GitHub API operations using octocrab.

pub mod auth;
pub mod remote;
pub mod repo;

pub use auth::get_github_token;
pub use remote::parse_github_remote;
pub use repo::{COMMITS_PER_PAGE, GitHubRepository};
