//! Release window resolution against an in-memory repository.

mod common;

use std::sync::atomic::Ordering;

use common::FakeRepository;
use release_ledger::error::{GatewayError, WindowError};
use release_ledger::git::{BoundaryKind, ReleaseWindowResolver, WindowRequest};
use release_ledger::version::Version;

fn request(version: &str, build: &str) -> WindowRequest {
    WindowRequest {
        version: Version::parse(version).unwrap(),
        build_commit: build.to_string(),
        head_commit: None,
        branch: None,
        tail_override: None,
    }
}

fn shas(commits: &[release_ledger::Commit]) -> Vec<&str> {
    commits.iter().map(|c| c.sha.as_str()).collect()
}

/// main:         a1 - a2 - a3 - a4 - a5 - a6 - a7 - a8
/// release-4.17:           \- b1 - b2 - b3 - b4
///
/// v10.15.0 = b1, v10.15.1 = b3, release-4.17 forked from main at a3 and
/// release-4.16 points at a2.
fn forked_history() -> FakeRepository {
    let mut repo = FakeRepository::new();
    repo.chain(None, &["a1", "a2", "a3", "a4", "a5", "a6", "a7", "a8"])
        .chain(Some("a3"), &["b1", "b2", "b3", "b4"])
        .branch("release-4.16", "a2")
        .branch("release-4.17", "b4")
        .branch("release-4.18", "a8")
        .tag("v10.15.0", "b1")
        .tag("v10.15.1", "b3");
    repo
}

#[tokio::test]
async fn test_patch_release_bounded_by_previous_patch_tag() {
    let repo = forked_history();
    let mut req = request("v10.15.2", "b4");
    req.branch = Some("release-4.17".to_string());

    let window = ReleaseWindowResolver::new(&repo).resolve(&req).await.unwrap();

    assert_eq!(
        window.boundary.kind,
        BoundaryKind::Tag {
            name: "v10.15.1".to_string()
        }
    );
    assert_eq!(shas(&window.commits), vec!["b4"]);
}

#[tokio::test]
async fn test_minor_release_uses_fork_point_after_tag() {
    let repo = forked_history();
    let mut req = request("10.16.0", "a6");
    req.branch = Some("release-4.18".to_string());

    let window = ReleaseWindowResolver::new(&repo).resolve(&req).await.unwrap();

    assert_eq!(window.boundary.sha, "a3");
    assert_eq!(
        window.boundary.kind,
        BoundaryKind::ForkPoint {
            branch: "release-4.17".to_string()
        }
    );
    assert_eq!(shas(&window.commits), vec!["a6", "a5", "a4"]);
    assert_eq!(
        repo.merge_base_calls.lock().unwrap().as_slice(),
        &[("release-4.17".to_string(), "a6".to_string())]
    );
}

#[tokio::test]
async fn test_tag_kept_when_more_recent_than_fork() {
    // Tag cut on the build line after the previous branch forked
    let mut repo = FakeRepository::new();
    repo.chain(None, &["a1", "a2", "a3", "a4", "a5"])
        .chain(Some("a2"), &["b1"])
        .branch("release-4.17", "b1")
        .tag("v10.15.3", "a3");

    let mut req = request("10.16.0", "a5");
    req.branch = Some("release-4.18".to_string());

    let window = ReleaseWindowResolver::new(&repo).resolve(&req).await.unwrap();

    assert_eq!(window.boundary.sha, "a3");
    assert!(matches!(window.boundary.kind, BoundaryKind::Tag { .. }));
    assert_eq!(shas(&window.commits), vec!["a5", "a4"]);
}

#[tokio::test]
async fn test_merge_commits_excluded() {
    let mut repo = FakeRepository::new();
    repo.chain(None, &["a1", "a2"])
        .commit("side", "feature", &["a1"])
        .commit("m1", "Merge pull request #12 from feature", &["a2", "side"])
        .commit("a3", "WINC-7: fix", &["m1"])
        .tag("v1.2.0", "a1");

    let window = ReleaseWindowResolver::new(&repo)
        .resolve(&request("v1.2.1", "a3"))
        .await
        .unwrap();

    assert_eq!(shas(&window.commits), vec!["a3", "a2"]);
}

#[tokio::test]
async fn test_branch_without_previous_gets_no_fork_refinement() {
    let repo = forked_history();
    for branch in ["main", "release-4.0", "feature/x"] {
        let mut req = request("10.16.0", "a6");
        req.branch = Some(branch.to_string());

        let window = ReleaseWindowResolver::new(&repo).resolve(&req).await.unwrap();
        assert!(matches!(window.boundary.kind, BoundaryKind::Tag { .. }));
    }
    assert!(repo.merge_base_calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_tail_override_skips_tag_lookup() {
    // No tags at all: without the override this would fail
    let mut repo = FakeRepository::new();
    repo.chain(None, &["a1", "a2", "a3", "a4"]);

    let mut req = request("10.16.0", "a4");
    req.tail_override = Some("a2".to_string());
    req.branch = Some("release-4.18".to_string());

    let window = ReleaseWindowResolver::new(&repo).resolve(&req).await.unwrap();

    assert_eq!(window.boundary.kind, BoundaryKind::Override);
    assert_eq!(shas(&window.commits), vec!["a4", "a3"]);
    assert!(repo.merge_base_calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_merges_between_head_and_build() {
    let repo = forked_history();
    let mut req = request("v10.16.0", "a6");
    req.head_commit = Some("a8".to_string());

    let window = ReleaseWindowResolver::new(&repo).resolve(&req).await.unwrap();
    assert_eq!(shas(&window.missing_merges), vec!["a8", "a7"]);
}

#[tokio::test]
async fn test_head_equal_to_build_lists_nothing() {
    let repo = forked_history();
    let mut req = request("v10.16.0", "a6");
    req.head_commit = Some("a6".to_string());

    let window = ReleaseWindowResolver::new(&repo).resolve(&req).await.unwrap();
    assert!(window.missing_merges.is_empty());
}

#[tokio::test]
async fn test_no_previous_tag() {
    let repo = forked_history();
    let err = ReleaseWindowResolver::new(&repo)
        .resolve(&request("v10.15.9", "b4"))
        .await
        .unwrap_err();
    assert!(matches!(err, WindowError::NoPreviousTag { expected } if expected == "v10.15.8"));

    // No listing happens once the boundary cannot be found
    assert_eq!(repo.list_commits_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unknown_previous_branch_surfaces_gateway_error() {
    let repo = forked_history();
    let mut req = request("10.16.0", "a6");
    req.branch = Some("release-4.30".to_string());

    let err = ReleaseWindowResolver::new(&repo).resolve(&req).await.unwrap_err();
    assert!(matches!(
        err,
        WindowError::Gateway(GatewayError::ReferenceNotFound(name, _)) if name == "release-4.29"
    ));
}

#[tokio::test]
async fn test_older_fork_does_not_replace_tag_when_listing_overruns() {
    // Gateway lists past the tag: the fork at a3 sits below tag a5
    let mut repo = FakeRepository::new();
    repo.chain(None, &["a1", "a2", "a3", "a4", "a5", "a6", "a7", "a8"])
        .branch("release-4.17", "a3")
        .tag("v10.15.9", "a5")
        .overrun_until();

    let mut req = request("10.16.0", "a8");
    req.branch = Some("release-4.18".to_string());

    let window = ReleaseWindowResolver::new(&repo).resolve(&req).await.unwrap();

    assert_eq!(
        window.boundary.kind,
        BoundaryKind::Tag {
            name: "v10.15.9".to_string()
        }
    );
    assert_eq!(window.boundary.sha, "a5");
    assert_eq!(shas(&window.commits), vec!["a8", "a7", "a6"]);
}

#[tokio::test]
async fn test_overrun_listing_truncated_at_fork_point() {
    let mut repo = forked_history();
    repo.overrun_until();

    let mut req = request("10.16.0", "a6");
    req.branch = Some("release-4.18".to_string());

    let window = ReleaseWindowResolver::new(&repo).resolve(&req).await.unwrap();

    assert_eq!(window.boundary.sha, "a3");
    assert!(matches!(window.boundary.kind, BoundaryKind::ForkPoint { .. }));
    assert_eq!(shas(&window.commits), vec!["a6", "a5", "a4"]);
}

#[tokio::test]
async fn test_overrun_listing_truncated_at_tag() {
    let mut repo = forked_history();
    repo.overrun_until();

    let mut req = request("v10.15.2", "b4");
    req.branch = Some("release-4.17".to_string());

    let window = ReleaseWindowResolver::new(&repo).resolve(&req).await.unwrap();

    assert_eq!(window.boundary.sha, "b3");
    assert_eq!(shas(&window.commits), vec!["b4"]);
}
