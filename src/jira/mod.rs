//! Issue tracker access and issue reference extraction.

pub mod client;
pub mod extract;
pub mod tracker;
pub mod types;

pub use client::{DEFAULT_JIRA_URL, JiraClient, get_jira_token};
pub use extract::IssueReferenceExtractor;
pub use tracker::{IssueRecord, IssueTracker};
