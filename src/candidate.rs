//! End-to-end release candidate: from a release plan to a ready manifest.

use std::io::{self, Write};

use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::{CandidateError, GatewayError, KonfluxError};
use crate::git::{
    ReleaseWindow, ReleaseWindowResolver, RepositoryGateway, WindowRequest, open_repository,
};
use crate::jira::{IssueRecord, IssueReferenceExtractor, IssueTracker};
use crate::konflux::ReleaseMetadataSource;
use crate::release::{ReleaseManifest, assemble, select_latest};
use crate::version::Version;

/// What to build a candidate for.
#[derive(Debug, Clone)]
pub struct CandidateRequest {
    pub namespace: String,
    pub release_plan: String,
    pub version: Version,
    /// Explicit lower bound of the release window.
    pub tail_override: Option<String>,
}

/// The next release of a component, as it would ship today.
#[derive(Debug, Clone)]
pub struct ReleaseCandidate {
    pub component: String,
    pub snapshot: String,
    pub snapshot_created: Option<DateTime<Utc>>,
    pub git_url: String,
    pub build_commit: String,
    pub window: ReleaseWindow,
    pub issues: Vec<IssueRecord>,
    pub manifest: ReleaseManifest,
}

impl ReleaseCandidate {
    /// Build a candidate, opening the component's repository by URL.
    pub async fn build<M, T>(
        metadata: &M,
        extractor: &IssueReferenceExtractor<T>,
        request: &CandidateRequest,
    ) -> Result<Self, CandidateError>
    where
        M: ReleaseMetadataSource + ?Sized,
        T: IssueTracker,
    {
        Self::build_with(metadata, extractor, request, open_repository).await
    }

    /// Build a candidate with a custom repository opener.
    pub async fn build_with<M, T, O>(
        metadata: &M,
        extractor: &IssueReferenceExtractor<T>,
        request: &CandidateRequest,
        open: O,
    ) -> Result<Self, CandidateError>
    where
        M: ReleaseMetadataSource + ?Sized,
        T: IssueTracker,
        O: Fn(&str) -> Result<Box<dyn RepositoryGateway>, GatewayError>,
    {
        let namespace = request.namespace.as_str();

        let plan = metadata
            .release_plan(namespace, &request.release_plan)
            .await?;
        let releases = metadata
            .releases(
                plan.metadata.namespace.as_deref().unwrap_or(namespace),
                &plan.spec.application,
            )
            .await?;
        let refs: Vec<_> = releases.iter().map(|r| r.to_ref()).collect();
        let latest = select_latest(&refs)?;
        info!(release = %latest.name, snapshot = %latest.snapshot, "Building on latest release");

        let snapshot = metadata.snapshot(namespace, &latest.snapshot).await?;
        let component = snapshot
            .component_name()
            .ok_or_else(|| incomplete(&snapshot.metadata.name, "a component label"))?
            .to_string();
        let source = snapshot.component_source(&component).ok_or_else(|| {
            incomplete(
                &snapshot.metadata.name,
                &format!("a git source for component {}", component),
            )
        })?;
        if source.revision.is_empty() {
            return Err(incomplete(&snapshot.metadata.name, "a build revision").into());
        }
        let branch = snapshot.target_branch().map(str::to_string);

        let current = metadata.component(namespace, &component).await?;
        let head_commit = current.revision().map(str::to_string);

        let repo = open(&source.url)?;
        let window = ReleaseWindowResolver::new(repo.as_ref())
            .resolve(&WindowRequest {
                version: request.version,
                build_commit: source.revision.clone(),
                head_commit,
                branch,
                tail_override: request.tail_override.clone(),
            })
            .await?;
        info!(
            boundary = %window.boundary,
            commits = window.commits.len(),
            "Resolved release window"
        );

        let issues = extractor.extract(&window.commits).await?;
        let notes = assemble(&component, &issues);
        let manifest = ReleaseManifest::new(&request.release_plan, &snapshot.metadata.name, notes);

        Ok(Self {
            component,
            snapshot: snapshot.metadata.name.clone(),
            snapshot_created: snapshot.metadata.creation_timestamp,
            git_url: source.url.clone(),
            build_commit: source.revision.clone(),
            window,
            issues,
            manifest,
        })
    }

    /// Human-readable status report.
    pub fn write_report<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let created = self
            .snapshot_created
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "unknown".to_string());
        writeln!(out, "Snapshot timestamp: {}", created)?;
        writeln!(out, "Snapshot commit: {}", self.build_commit)?;
        writeln!(out, "Release boundary: {}", self.window.boundary)?;
        writeln!(out, "-----\n")?;

        writeln!(
            out,
            "{} recent merges not included in release:",
            self.window.missing_merges.len()
        )?;
        for (i, commit) in self.window.missing_merges.iter().enumerate() {
            writeln!(out, "{}: {}", i + 1, commit.subject())?;
        }
        writeln!(out, "-----\n")?;

        writeln!(out, "Jira issues included in this release:")?;
        let rows: Vec<[String; 3]> = self
            .issues
            .iter()
            .map(|issue| {
                [
                    issue.key.clone(),
                    issue.summary.clone(),
                    issue.fix_versions.join(", "),
                ]
            })
            .collect();
        write_table(out, ["Issue", "Summary", "Fix Version"], &rows)?;
        writeln!(out, "-----\n")?;
        Ok(())
    }
}

fn incomplete(snapshot: &str, what: &str) -> KonfluxError {
    KonfluxError::IncompleteSnapshot {
        snapshot: snapshot.to_string(),
        what: what.to_string(),
    }
}

const RULE: &str = "___";

/// Left-aligned columns separated by two spaces.
fn write_table<W: Write>(out: &mut W, header: [&str; 3], rows: &[[String; 3]]) -> io::Result<()> {
    let mut widths = header.map(|h| h.chars().count().max(RULE.len()));
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut line = |cells: [&str; 3]| -> io::Result<()> {
        let padded: Vec<String> = cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = width))
            .collect();
        writeln!(out, "{}", padded.join("  ").trim_end())
    };

    line(header)?;
    line([RULE; 3])?;
    for row in rows {
        line([row[0].as_str(), row[1].as_str(), row[2].as_str()])?;
    }
    Ok(())
}
