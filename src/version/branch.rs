//! Release branch naming (`release-<major>.<minor>`).

use std::fmt;

const RELEASE_BRANCH_PREFIX: &str = "release-";

/// A branch following the `release-<major>.<minor>` naming scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BranchPointer {
    pub major: u64,
    pub minor: u64,
}

impl BranchPointer {
    /// Parse a branch name, returning `None` for branches outside the scheme.
    pub fn parse(branch: &str) -> Option<Self> {
        let rest = branch.strip_prefix(RELEASE_BRANCH_PREFIX)?;
        let (major, minor) = rest.split_once('.')?;
        let numeric = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
        if !numeric(major) || !numeric(minor) {
            return None;
        }
        Some(Self {
            major: major.parse().ok()?,
            minor: minor.parse().ok()?,
        })
    }

    /// The release branch of the preceding minor line, e.g. `release-4.15` -> `release-4.14`.
    pub fn previous(&self) -> Option<Self> {
        Some(Self {
            major: self.major,
            minor: self.minor.checked_sub(1)?,
        })
    }

    pub fn name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for BranchPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}.{}", RELEASE_BRANCH_PREFIX, self.major, self.minor)
    }
}
