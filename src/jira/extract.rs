//! Issue key extraction from commit messages.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use regex_lite::Regex;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::error::IssueError;
use crate::git::Commit;

use super::tracker::{IssueRecord, IssueTracker};

/// Turns commit ranges into the tracked issues they reference.
///
/// Each distinct key is fetched from the tracker at most once for the
/// lifetime of the extractor, including across concurrent `extract` calls.
pub struct IssueReferenceExtractor<T: IssueTracker> {
    pattern: Regex,
    tracker: T,
    fetched: Mutex<HashMap<String, Arc<OnceCell<IssueRecord>>>>,
}

impl<T: IssueTracker> IssueReferenceExtractor<T> {
    /// Build an extractor matching `<PROJECT>-<digits>` for every project key.
    pub fn new<S: AsRef<str>>(projects: &[S], tracker: T) -> Result<Self, IssueError> {
        Ok(Self {
            pattern: issue_key_pattern(projects)?,
            tracker,
            fetched: Mutex::new(HashMap::new()),
        })
    }

    pub fn tracker(&self) -> &T {
        &self.tracker
    }

    /// Distinct issue keys referenced by `commits`, in first-seen order.
    pub fn issue_keys(&self, commits: &[Commit]) -> Vec<String> {
        let mut seen = HashSet::new();
        commits
            .iter()
            .flat_map(|c| self.pattern.find_iter(&c.message))
            .map(|m| m.as_str().to_string())
            .filter(|key| seen.insert(key.clone()))
            .collect()
    }

    /// Fetch every issue referenced by `commits`.
    ///
    /// Any failed fetch aborts the whole extraction.
    pub async fn extract(&self, commits: &[Commit]) -> Result<Vec<IssueRecord>, IssueError> {
        let keys = self.issue_keys(commits);
        debug!(count = keys.len(), "Issue keys referenced by commits");

        let mut issues = Vec::with_capacity(keys.len());
        for key in keys {
            issues.push(self.fetch_once(&key).await?);
        }
        Ok(issues)
    }

    async fn fetch_once(&self, key: &str) -> Result<IssueRecord, IssueError> {
        let cell = {
            let mut fetched = self.fetched.lock().unwrap_or_else(PoisonError::into_inner);
            fetched.entry(key.to_string()).or_default().clone()
        };

        let record = cell
            .get_or_try_init(|| async {
                debug!(key, "Fetching issue");
                self.tracker.fetch_issue(key).await
            })
            .await
            .map_err(|source| IssueError::IssueFetch {
                key: key.to_string(),
                source,
            })?;
        Ok(record.clone())
    }
}

/// Alternation of `<KEY>-[0-9]*` across all project keys.
fn issue_key_pattern<S: AsRef<str>>(projects: &[S]) -> Result<Regex, IssueError> {
    if projects.is_empty() {
        return Err(IssueError::NoProjects);
    }
    let alternatives: Vec<String> = projects
        .iter()
        .map(|p| format!("{}-[0-9]*", regex_lite::escape(p.as_ref())))
        .collect();
    Regex::new(&alternatives.join("|")).map_err(|e| IssueError::InvalidPattern(e.to_string()))
}
