//! Release manifests submitted to the release service.

use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::info;

use crate::error::ReleaseError;

use super::assemble::ReleaseRecord;

pub const RELEASE_API_VERSION: &str = "appstudio.redhat.com/v1alpha1";
pub const RELEASE_KIND: &str = "Release";

/// A `Release` object ready to be applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseManifest {
    pub api_version: String,
    pub kind: String,
    pub metadata: ManifestMetadata,
    pub spec: ManifestSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestMetadata {
    pub generate_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestSpec {
    pub snapshot: String,
    pub release_plan: String,
    pub data: ManifestData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestData {
    pub release_notes: ReleaseRecord,
}

impl ReleaseManifest {
    pub fn new(release_plan: &str, snapshot: &str, notes: ReleaseRecord) -> Self {
        Self {
            api_version: RELEASE_API_VERSION.to_string(),
            kind: RELEASE_KIND.to_string(),
            metadata: ManifestMetadata {
                generate_name: format!("{}-", release_plan),
            },
            spec: ManifestSpec {
                snapshot: snapshot.to_string(),
                release_plan: release_plan.to_string(),
                data: ManifestData {
                    release_notes: notes,
                },
            },
        }
    }

    pub fn to_yaml(&self) -> Result<String, ReleaseError> {
        serde_yaml::to_string(self).map_err(|e| ReleaseError::Serialization(e.to_string()))
    }

    /// Write the manifest as YAML, replacing `path` atomically.
    pub fn write_to(&self, path: &Path) -> Result<(), ReleaseError> {
        let yaml = self.to_yaml()?;
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let mut file = NamedTempFile::new_in(dir).map_err(ReleaseError::WriteFailed)?;
        file.write_all(yaml.as_bytes())
            .map_err(ReleaseError::WriteFailed)?;
        file.persist(path)
            .map_err(|e| ReleaseError::WriteFailed(e.error))?;

        info!(path = %path.display(), "Wrote release manifest");
        Ok(())
    }
}
