//! The issue-tracker capability consumed by issue extraction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::JiraError;

use super::client::JiraClient;
use super::types::Issue;

/// The fields of a tracked issue that release assembly reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRecord {
    pub key: String,
    pub summary: String,
    pub fix_versions: Vec<String>,
    pub epic_name: Option<String>,
    pub labels: Vec<String>,
    pub priority: Option<String>,
    pub security: Option<String>,
}

impl IssueRecord {
    /// A record with only a key and summary set.
    pub fn new(key: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            summary: summary.into(),
            fix_versions: Vec::new(),
            epic_name: None,
            labels: Vec::new(),
            priority: None,
            security: None,
        }
    }
}

impl From<Issue> for IssueRecord {
    fn from(issue: Issue) -> Self {
        let fields = issue.fields;
        Self {
            key: issue.key,
            summary: fields.summary,
            fix_versions: fields.fix_versions.into_iter().map(|v| v.name).collect(),
            epic_name: Some(fields.epic_name).filter(|n| !n.is_empty()),
            labels: fields.labels,
            priority: fields.priority.map(|p| p.name),
            security: fields.security.map(|s| s.name),
        }
    }
}

/// Keyed issue lookup.
///
/// This abstraction allows mocking the issue tracker in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Fetch the issue identified by `key`.
    async fn fetch_issue(&self, key: &str) -> Result<IssueRecord, JiraError>;
}

#[async_trait]
impl IssueTracker for JiraClient {
    async fn fetch_issue(&self, key: &str) -> Result<IssueRecord, JiraError> {
        self.get_issue(key).await.map(IssueRecord::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jira::types::{FixVersion, IssueFields, Priority, Security};

    #[test]
    fn test_record_from_issue() {
        let issue = Issue {
            key: "OCPBUGS-42".to_string(),
            fields: IssueFields {
                summary: "fix typo".to_string(),
                fix_versions: vec![FixVersion {
                    name: "WMCO 10.15.1".to_string(),
                }],
                labels: vec!["backport".to_string()],
                priority: Some(Priority {
                    name: "Minor".to_string(),
                }),
                security: Some(Security {
                    name: "Red Hat Employee".to_string(),
                }),
                ..Default::default()
            },
        };

        let record = IssueRecord::from(issue);
        assert_eq!(record.key, "OCPBUGS-42");
        assert_eq!(record.fix_versions, vec!["WMCO 10.15.1"]);
        assert_eq!(record.epic_name, None);
        assert_eq!(record.priority.as_deref(), Some("Minor"));
        assert_eq!(record.security.as_deref(), Some("Red Hat Employee"));
    }
}
