//! Error types for release-ledger modules using thiserror.

use thiserror::Error;

/// Errors from version parsing.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum VersionError {
    #[error("Malformed version '{input}': expected a version of format vX.Y.Z ({reason})")]
    MalformedVersion { input: String, reason: String },
}

/// Errors from source-control gateways.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Unsupported git provider: {0}")]
    UnsupportedProvider(String),

    #[error("Unexpected repository URL: {0}")]
    InvalidRepositoryUrl(String),

    #[error("GitHub request failed: {0}")]
    GitHub(#[source] Box<octocrab::Error>),

    #[error("Repository not found: {owner}/{repo}")]
    RepositoryNotFound { owner: String, repo: String },

    #[error("Rate limited by GitHub API")]
    RateLimited,

    #[error("Failed to open repository: {0}")]
    OpenRepository(#[source] git2::Error),

    #[error("Failed to find reference '{0}': {1}")]
    ReferenceNotFound(String, #[source] git2::Error),

    #[error("Git operation failed: {0}")]
    Git(#[source] git2::Error),
}

/// Errors from release window resolution.
#[derive(Error, Debug)]
pub enum WindowError {
    #[error(
        "No previous tag found (expected {expected}). Pass an explicit tail commit to bound the release."
    )]
    NoPreviousTag { expected: String },

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Errors from the Jira REST client.
#[derive(Error, Debug)]
pub enum JiraError {
    #[error("Jira request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("Jira returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse Jira response: {0}")]
    InvalidResponse(String),

    #[error("Issue not found: {0}")]
    IssueNotFound(String),

    #[error("Unexpected issues found for key {key}: {count} matches")]
    AmbiguousIssue { key: String, count: usize },

    #[error("Invalid Jira URL: {0}")]
    InvalidUrl(String),

    #[error("Jira API token not found. Set JIRA_API_TOKEN or write it to ~/.jira/token")]
    MissingToken,
}

/// Errors from issue reference extraction.
#[derive(Error, Debug)]
pub enum IssueError {
    #[error("At least one issue project key is required")]
    NoProjects,

    #[error("Invalid issue key pattern: {0}")]
    InvalidPattern(String),

    #[error("Failed to fetch issue {key}: {source}")]
    IssueFetch {
        key: String,
        #[source]
        source: JiraError,
    },
}

/// Errors from release selection and assembly.
#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("No successful releases found")]
    NoSuccessfulRelease,

    #[error("Failed to serialize release data: {0}")]
    Serialization(String),

    #[error("Failed to write release manifest: {0}")]
    WriteFailed(#[source] std::io::Error),
}

/// Errors from the Konflux (Kubernetes) API client.
#[derive(Error, Debug)]
pub enum KonfluxError {
    #[error("Konflux request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("Konflux returned {status} for {path}: {body}")]
    Status {
        status: u16,
        path: String,
        body: String,
    },

    #[error("Failed to parse Konflux response: {0}")]
    InvalidResponse(String),

    #[error("Invalid Konflux server URL: {0}")]
    InvalidServer(String),

    #[error("Snapshot {snapshot} is missing {what}")]
    IncompleteSnapshot { snapshot: String, what: String },

    #[error(
        "Konflux server not configured. Set [konflux] server, KONFLUX_SERVER, or log in with 'oc login'"
    )]
    MissingServer,
}

/// Errors from errata listing.
#[derive(Error, Debug)]
pub enum ErrataError {
    #[error("curl is required for errata listing but was not found in PATH")]
    CurlNotInstalled,

    #[error("Failed to spawn curl: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("curl timed out after {0} seconds")]
    Timeout(u64),

    #[error("Invalid errata URL: {0}")]
    InvalidUrl(String),

    #[error("error running curl: {output}: exit code {code:?}")]
    CurlFailed { output: String, code: Option<i32> },

    #[error("error unmarshalling response {output}: {reason}")]
    InvalidJson { output: String, reason: String },
}

/// Errors from configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {reason}")]
    ParseFailed { path: String, reason: String },

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

/// Errors from release planning ticket creation.
#[derive(Error, Debug)]
pub enum PlanError {
    #[error("Version {0} is not a valid semver")]
    InvalidVersion(String),

    #[error(transparent)]
    Jira(#[from] JiraError),

    #[error(transparent)]
    Release(#[from] ReleaseError),
}

/// Errors from building a release candidate end to end.
#[derive(Error, Debug)]
pub enum CandidateError {
    #[error(transparent)]
    Konflux(#[from] KonfluxError),

    #[error(transparent)]
    Release(#[from] ReleaseError),

    #[error(transparent)]
    Version(#[from] VersionError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Window(#[from] WindowError),

    #[error(transparent)]
    Issue(#[from] IssueError),
}
