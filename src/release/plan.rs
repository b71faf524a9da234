//! Release planning tickets: schedule, epic and release task.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use tracing::info;

use crate::error::PlanError;
use crate::jira::JiraClient;
use crate::jira::types::{
    EPIC_ISSUE, Issue, IssueFields, IssueType, MAJOR_PRIORITY, Priority, Project, Security,
    TASK_ISSUE, TargetVersion,
};

use super::manifest::ReleaseManifest;

const QE_PERIOD_DAYS: u64 = 10;
const PATCH_QE_PERIOD_DAYS: u64 = 7;

pub const RELEASE_EPIC_LABEL: &str = "OperatorProductization";
const RELEASE_TASK_LABELS: [&str; 3] = ["docs", "qe", "release"];
const SECURITY_LEVEL: &str = "Red Hat Employee";

/// Key dates of a planned release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleasePlanSchedule {
    /// Build handed over to QE.
    pub handover: NaiveDate,
    /// Last QE day.
    pub qe_end: NaiveDate,
    /// General availability.
    pub release: NaiveDate,
    pub patch: bool,
}

impl ReleasePlanSchedule {
    pub fn new(release: NaiveDate, patch: bool) -> Self {
        let qe_period = if patch {
            PATCH_QE_PERIOD_DAYS
        } else {
            QE_PERIOD_DAYS
        };
        let qe_end = round_down_to_weekday(release - Days::new(1));
        let handover = round_down_to_weekday(qe_end - Days::new(qe_period));
        Self {
            handover,
            qe_end,
            release,
            patch,
        }
    }
}

/// Move weekend dates back to the preceding Friday.
pub fn round_down_to_weekday(date: NaiveDate) -> NaiveDate {
    match date.weekday() {
        Weekday::Sat => date - Days::new(1),
        Weekday::Sun => date - Days::new(2),
        _ => date,
    }
}

/// Parse a planning version, accepting an optional leading `v`.
pub fn parse_plan_version(input: &str) -> Result<semver::Version, PlanError> {
    semver::Version::parse(input.strip_prefix('v').unwrap_or(input))
        .map_err(|_| PlanError::InvalidVersion(input.to_string()))
}

/// The Jira tickets tracking one release.
#[derive(Debug, Clone)]
pub struct ReleaseTickets {
    pub project: String,
    pub version: semver::Version,
    pub schedule: ReleasePlanSchedule,
    pub manifest: Option<ReleaseManifest>,
}

impl ReleaseTickets {
    pub fn new(project: &str, version: semver::Version, schedule: ReleasePlanSchedule) -> Self {
        Self {
            project: project.to_string(),
            version,
            schedule,
            manifest: None,
        }
    }

    pub fn with_manifest(mut self, manifest: ReleaseManifest) -> Self {
        self.manifest = Some(manifest);
        self
    }

    fn stream(&self) -> &'static str {
        if self.schedule.patch { "z-stream" } else { "y-stream" }
    }

    pub fn epic_description(&self) -> String {
        format!(
            "Tracks the WMCO {version} {stream} release.\n\n\
             ||Milestone||Date||\n\
             |QE handover|{handover}|\n\
             |QE sign-off|{qe_end}|\n\
             |GA|{release}|\n",
            version = self.version,
            stream = self.stream(),
            handover = self.schedule.handover,
            qe_end = self.schedule.qe_end,
            release = self.schedule.release,
        )
    }

    pub fn task_description(&self) -> Result<String, PlanError> {
        let mut description = format!(
            "Release Red Hat OpenShift for Windows Containers {version}.\n\n\
             * Handover to QE: {handover}\n\
             * GA: {release}\n",
            version = self.version,
            handover = self.schedule.handover,
            release = self.schedule.release,
        );
        if let Some(manifest) = &self.manifest {
            description.push_str("\nh3. Release\n{code:yaml}\n");
            description.push_str(&manifest.to_yaml()?);
            description.push_str("{code}\n");
        }
        Ok(description)
    }

    pub fn epic_issue(&self) -> Issue {
        Issue {
            fields: IssueFields {
                summary: format!("Windows Machine Config Operator {} Release", self.version),
                description: self.epic_description(),
                project: Some(Project {
                    key: self.project.clone(),
                }),
                issue_type: Some(IssueType {
                    name: EPIC_ISSUE.to_string(),
                }),
                target_version: vec![TargetVersion {
                    name: format!("WMCO {}", self.version),
                }],
                epic_name: format!("WMCO {} Release", self.version),
                security: Some(Security {
                    name: SECURITY_LEVEL.to_string(),
                }),
                labels: vec![RELEASE_EPIC_LABEL.to_string()],
                priority: Some(Priority {
                    name: MAJOR_PRIORITY.to_string(),
                }),
                ..Default::default()
            },
            key: String::new(),
        }
    }

    pub fn task_issue(&self, epic_key: &str) -> Result<Issue, PlanError> {
        Ok(Issue {
            fields: IssueFields {
                summary: format!(
                    "Red Hat OpenShift for Windows Containers {} Release",
                    self.version
                ),
                description: self.task_description()?,
                project: Some(Project {
                    key: self.project.clone(),
                }),
                issue_type: Some(IssueType {
                    name: TASK_ISSUE.to_string(),
                }),
                epic_link: epic_key.to_string(),
                labels: RELEASE_TASK_LABELS.iter().map(|l| l.to_string()).collect(),
                priority: Some(Priority {
                    name: MAJOR_PRIORITY.to_string(),
                }),
                ..Default::default()
            },
            key: String::new(),
        })
    }

    /// Create the epic and its linked release task, returning both keys.
    pub async fn create(&self, client: &JiraClient) -> Result<(String, String), PlanError> {
        let epic = client.create_issue(&self.epic_issue()).await?;
        info!(key = %epic.key, "Created release epic");
        let task = client.create_issue(&self.task_issue(&epic.key)?).await?;
        info!(key = %task.key, epic = %epic.key, "Created release task");
        Ok((epic.key, task.key))
    }

    /// Replace the description of an existing release task.
    pub async fn update(&self, client: &JiraClient, issue_key: &str) -> Result<(), PlanError> {
        let description = self.task_description()?;
        client.update_description(issue_key, &description).await?;
        info!(key = issue_key, "Updated release task");
        Ok(())
    }
}

/// JQL selecting open release epics of `project`.
pub fn open_release_epics_jql(project: &str) -> String {
    format!(
        "project = {} AND issuetype = Epic AND labels in ({}) AND statusCategory != \"Done\"",
        project, RELEASE_EPIC_LABEL
    )
}
