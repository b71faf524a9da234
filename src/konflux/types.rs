//! Konflux custom resources, reduced to the fields release-ledger reads.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::release::{Condition, ReleaseRef};

/// Label linking a snapshot to the component it was built for.
pub const COMPONENT_LABEL: &str = "appstudio.openshift.io/component";
/// Label linking a release to its application.
pub const APPLICATION_LABEL: &str = "appstudio.openshift.io/application";
/// Annotation carrying the branch a snapshot was built from.
pub const TARGET_BRANCH_ANNOTATION: &str = "build.appstudio.redhat.com/target_branch";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub creation_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReleasePlan {
    pub metadata: ObjectMeta,
    pub spec: ReleasePlanSpec,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReleasePlanSpec {
    pub application: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseList {
    #[serde(default)]
    pub items: Vec<Release>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    pub metadata: ObjectMeta,
    pub spec: ReleaseSpec,
    #[serde(default)]
    pub status: ReleaseStatus,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseSpec {
    pub snapshot: String,
    #[serde(default)]
    pub release_plan: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReleaseStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl Release {
    /// Selection view of this release.
    ///
    /// A release without a creation timestamp sorts as the oldest.
    pub fn to_ref(&self) -> ReleaseRef {
        ReleaseRef {
            name: self.metadata.name.clone(),
            snapshot: self.spec.snapshot.clone(),
            created: self.metadata.creation_timestamp.unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
            conditions: self.status.conditions.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Snapshot {
    pub metadata: ObjectMeta,
    pub spec: SnapshotSpec,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SnapshotSpec {
    #[serde(default)]
    pub components: Vec<SnapshotComponent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotComponent {
    pub name: String,
    #[serde(default)]
    pub source: ComponentSource,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComponentSource {
    #[serde(default)]
    pub git: Option<GitSource>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GitSource {
    pub url: String,
    #[serde(default)]
    pub revision: String,
}

impl Snapshot {
    /// Component this snapshot was built for.
    pub fn component_name(&self) -> Option<&str> {
        self.metadata.labels.get(COMPONENT_LABEL).map(String::as_str)
    }

    /// Branch the snapshot was built from.
    pub fn target_branch(&self) -> Option<&str> {
        self.metadata
            .annotations
            .get(TARGET_BRANCH_ANNOTATION)
            .map(String::as_str)
            .filter(|b| !b.is_empty())
    }

    /// Git source of a named component in the snapshot.
    pub fn component_source(&self, name: &str) -> Option<&GitSource> {
        self.spec
            .components
            .iter()
            .filter(|c| c.name == name)
            .last()
            .and_then(|c| c.source.git.as_ref())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Component {
    pub metadata: ObjectMeta,
    pub spec: ComponentSpec,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComponentSpec {
    #[serde(default)]
    pub source: ComponentSource,
}

impl Component {
    /// Revision the component currently builds from.
    pub fn revision(&self) -> Option<&str> {
        self.spec
            .source
            .git
            .as_ref()
            .map(|g| g.revision.as_str())
            .filter(|r| !r.is_empty())
    }
}
