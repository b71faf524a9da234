//! Strict three-component version parsing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::VersionError;

/// A `vMAJOR.MINOR.PATCH` release version.
///
/// Unlike a full semver, pre-release and build metadata are rejected: a
/// release tag either names exactly three numeric components or it does
/// not identify a release at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse `vX.Y.Z` or `X.Y.Z`.
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let raw = input.strip_prefix('v').unwrap_or(input);
        let parts: Vec<&str> = raw.split('.').collect();
        if parts.len() != 3 {
            return Err(malformed(
                input,
                format!("found {} component(s)", parts.len()),
            ));
        }

        let component = |name: &str, value: &str| -> Result<u64, VersionError> {
            if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
                return Err(malformed(input, format!("{} '{}' is not numeric", name, value)));
            }
            value
                .parse::<u64>()
                .map_err(|e| malformed(input, format!("{} '{}': {}", name, value, e)))
        };

        Ok(Self {
            major: component("major", parts[0])?,
            minor: component("minor", parts[1])?,
            patch: component("patch", parts[2])?,
        })
    }

    /// A patch release has a non-zero patch component.
    pub fn is_patch_release(&self) -> bool {
        self.patch != 0
    }

    /// Tag name of the immediately preceding patch, e.g. `v4.2.3` -> `v4.2.2`.
    pub fn previous_patch_tag(&self) -> Option<String> {
        let patch = self.patch.checked_sub(1)?;
        Some(format!("v{}.{}.{}", self.major, self.minor, patch))
    }

    /// The minor line preceding this one within the same major, if any.
    pub fn previous_minor(&self) -> Option<u64> {
        self.minor.checked_sub(1)
    }

    /// Canonical tag name for this version.
    pub fn tag_name(&self) -> String {
        format!("v{}", self)
    }
}

fn malformed(input: &str, reason: String) -> VersionError {
    VersionError::MalformedVersion {
        input: input.to_string(),
        reason,
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Version::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
