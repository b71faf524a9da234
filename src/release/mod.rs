//! Release records: selection, assembly, manifests and planning tickets.

pub mod assemble;
pub mod manifest;
pub mod plan;
pub mod select;

pub use assemble::{AdvisoryType, CveEntry, FixedIssue, ISSUE_SOURCE, ReleaseRecord, assemble, cve_name};
pub use manifest::ReleaseManifest;
pub use plan::{ReleasePlanSchedule, ReleaseTickets, open_release_epics_jql, parse_plan_version};
pub use select::{Condition, ReleaseRef, select_latest};
