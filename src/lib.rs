//! release-ledger - resolves what goes into the next release of a component.
//!
//! # Overview
//!
//! Starting from the release service's latest successful release, release-ledger
//! finds the commit range that is new since the previous version, collects the
//! tracked issues those commits reference, and assembles the release notes and
//! `Release` manifest for the next version. It also creates and updates the
//! Jira tickets that track a release.

pub mod candidate;
pub mod config;
pub mod errata;
pub mod error;
pub mod git;
pub mod github;
pub mod jira;
pub mod konflux;
pub mod release;
pub mod retry;
pub mod version;

// Re-export commonly used types
pub use candidate::{CandidateRequest, ReleaseCandidate};
pub use config::Config;
pub use error::{
    CandidateError, ConfigError, ErrataError, GatewayError, IssueError, JiraError, KonfluxError,
    PlanError, ReleaseError, VersionError, WindowError,
};
pub use git::{Commit, ReleaseWindow, ReleaseWindowResolver, RepositoryGateway, Tag, WindowRequest};
pub use jira::{IssueRecord, IssueReferenceExtractor, IssueTracker};
pub use release::{AdvisoryType, ReleaseManifest, ReleaseRecord, ReleaseRef, select_latest};
pub use version::Version;
