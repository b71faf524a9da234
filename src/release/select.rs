//! Latest successful release selection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ReleaseError;

const RELEASED_CONDITION: &str = "Released";
const CONDITION_TRUE: &str = "True";

/// A status condition reported on a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// The parts of a release needed to pick the one to build on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseRef {
    pub name: String,
    pub snapshot: String,
    pub created: DateTime<Utc>,
    pub conditions: Vec<Condition>,
}

impl ReleaseRef {
    /// Whether the release carries `Released=True`.
    pub fn is_released(&self) -> bool {
        self.conditions
            .iter()
            .any(|c| c.kind == RELEASED_CONDITION && c.status == CONDITION_TRUE)
    }
}

/// The most recently created successful release.
///
/// Releases without a `Released=True` condition are ignored. Ties on
/// creation time keep the first release seen.
pub fn select_latest(releases: &[ReleaseRef]) -> Result<&ReleaseRef, ReleaseError> {
    let mut latest: Option<&ReleaseRef> = None;
    for release in releases.iter().filter(|r| r.is_released()) {
        if latest.is_none_or(|l| release.created > l.created) {
            latest = Some(release);
        }
    }

    let latest = latest.ok_or(ReleaseError::NoSuccessfulRelease)?;
    debug!(release = %latest.name, snapshot = %latest.snapshot, "Selected latest release");
    Ok(latest)
}
