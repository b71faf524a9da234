//! Release record assembly and advisory classification.

use serde::{Deserialize, Serialize};

use crate::jira::IssueRecord;

/// Source identifier attached to every fixed issue.
pub const ISSUE_SOURCE: &str = "issues.redhat.com";

const CVE_PREFIX: &str = "CVE-";

/// Advisory classification of a release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdvisoryType {
    /// Bug fix advisory.
    #[serde(rename = "RHBA")]
    Routine,
    /// Security advisory, fixes at least one CVE.
    #[serde(rename = "RHSA")]
    Security,
}

impl AdvisoryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdvisoryType::Routine => "RHBA",
            AdvisoryType::Security => "RHSA",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CveEntry {
    pub component: String,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedIssue {
    pub id: String,
    pub source: String,
}

/// Release notes handed to the release service.
///
/// Serializes as `{type, cves, issues: {fixed}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "ReleaseNotesWire", from = "ReleaseNotesWire")]
pub struct ReleaseRecord {
    pub advisory_type: AdvisoryType,
    pub cve_entries: Vec<CveEntry>,
    pub fixed_issues: Vec<FixedIssue>,
}

#[derive(Serialize, Deserialize)]
struct ReleaseNotesWire {
    #[serde(rename = "type")]
    advisory_type: AdvisoryType,
    #[serde(default)]
    cves: Vec<CveEntry>,
    #[serde(default)]
    issues: IssuesWire,
}

#[derive(Default, Serialize, Deserialize)]
struct IssuesWire {
    #[serde(default)]
    fixed: Vec<FixedIssue>,
}

impl From<ReleaseRecord> for ReleaseNotesWire {
    fn from(record: ReleaseRecord) -> Self {
        Self {
            advisory_type: record.advisory_type,
            cves: record.cve_entries,
            issues: IssuesWire {
                fixed: record.fixed_issues,
            },
        }
    }
}

impl From<ReleaseNotesWire> for ReleaseRecord {
    fn from(wire: ReleaseNotesWire) -> Self {
        Self {
            advisory_type: wire.advisory_type,
            cve_entries: wire.cves,
            fixed_issues: wire.issues.fixed,
        }
    }
}

/// CVE identifier of an issue summary, if the summary starts with `CVE-`.
pub fn cve_name(summary: &str) -> Option<&str> {
    if summary.starts_with(CVE_PREFIX) {
        summary.split_whitespace().next()
    } else {
        None
    }
}

/// Build the release record for `component` from its fixed issues.
pub fn assemble(component: &str, issues: &[IssueRecord]) -> ReleaseRecord {
    let cve_entries: Vec<CveEntry> = issues
        .iter()
        .filter_map(|issue| cve_name(&issue.summary))
        .map(|cve| CveEntry {
            component: component.to_string(),
            key: cve.to_string(),
        })
        .collect();

    let advisory_type = if cve_entries.is_empty() {
        AdvisoryType::Routine
    } else {
        AdvisoryType::Security
    };

    let fixed_issues = issues
        .iter()
        .map(|issue| FixedIssue {
            id: issue.key.clone(),
            source: ISSUE_SOURCE.to_string(),
        })
        .collect();

    ReleaseRecord {
        advisory_type,
        cve_entries,
        fixed_issues,
    }
}
