//! End-to-end candidate resolution with mocked Konflux and in-memory git.

mod common;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{CountingTracker, FakeRepository};
use release_ledger::error::{CandidateError, GatewayError, KonfluxError, ReleaseError};
use release_ledger::git::RepositoryGateway;
use release_ledger::jira::IssueReferenceExtractor;
use release_ledger::konflux::KonfluxClient;
use release_ledger::release::AdvisoryType;
use release_ledger::retry::RetryPolicy;
use release_ledger::{CandidateRequest, ReleaseCandidate, Version};

const API: &str = "/apis/appstudio.redhat.com/v1alpha1/namespaces/windows-tenant";
const GIT_URL: &str = "https://github.com/openshift/windows-machine-config-operator";

async fn mount(server: &MockServer, resource: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("{}/{}", API, resource)))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn konflux(releases: serde_json::Value) -> MockServer {
    let server = MockServer::start().await;
    mount(
        &server,
        "releaseplans/wmco-prod",
        json!({"metadata": {"name": "wmco-prod"}, "spec": {"application": "wmco"}}),
    )
    .await;
    mount(&server, "releases", releases).await;
    mount(
        &server,
        "snapshots/snap-c",
        json!({
            "metadata": {
                "name": "snap-c",
                "creationTimestamp": "2024-05-03T00:00:00Z",
                "labels": {"appstudio.openshift.io/component": "wmco"},
                "annotations": {"build.appstudio.redhat.com/target_branch": "release-4.18"}
            },
            "spec": {"components": [
                {"name": "wmco", "source": {"git": {"url": GIT_URL, "revision": "a6"}}}
            ]}
        }),
    )
    .await;
    mount(
        &server,
        "components/wmco",
        json!({"metadata": {"name": "wmco"},
               "spec": {"source": {"git": {"url": GIT_URL, "revision": "a8"}}}}),
    )
    .await;
    server
}

fn releases() -> serde_json::Value {
    let released = json!([{"type": "Released", "status": "True"}]);
    let failed = json!([{"type": "Released", "status": "False"}]);
    json!({"items": [
        {"metadata": {"name": "A", "creationTimestamp": "2024-05-01T00:00:00Z"},
         "spec": {"snapshot": "snap-a"}, "status": {"conditions": released}},
        {"metadata": {"name": "B", "creationTimestamp": "2024-05-04T00:00:00Z"},
         "spec": {"snapshot": "snap-b"}, "status": {"conditions": failed}},
        {"metadata": {"name": "C", "creationTimestamp": "2024-05-03T00:00:00Z"},
         "spec": {"snapshot": "snap-c"}, "status": {"conditions": released}}
    ]})
}

/// main: a1 .. a8, release-4.17 forked at a3, v10.15.1 on the branch.
fn history() -> FakeRepository {
    let mut repo = FakeRepository::new();
    repo.chain(None, &["a1", "a2", "a3"])
        .commit("a4", "WINC-1: CVE-2024-0001 fix", &["a3"])
        .commit("a5", "OCPBUGS-22: node join, WINC-1 follow-up", &["a4"])
        .commit("a6", "chore: bump deps", &["a5"])
        .commit("a7", "WINC-9 after build", &["a6"])
        .commit("a8", "another post-build change", &["a7"])
        .chain(Some("a3"), &["b1", "b2"])
        .branch("release-4.17", "b2")
        .tag("v10.15.1", "b2");
    repo
}

fn request() -> CandidateRequest {
    CandidateRequest {
        namespace: "windows-tenant".to_string(),
        release_plan: "wmco-prod".to_string(),
        version: Version::new(10, 16, 0),
        tail_override: None,
    }
}

fn open_fake(url: &str) -> Result<Box<dyn RepositoryGateway>, GatewayError> {
    assert_eq!(url, GIT_URL);
    Ok(Box::new(history()))
}

#[tokio::test]
async fn test_candidate_end_to_end() {
    let server = konflux(releases()).await;
    let client = KonfluxClient::new(&server.uri(), None, false)
        .unwrap()
        .with_retry(RetryPolicy::none());
    let tracker = CountingTracker::new(&[
        ("WINC-1", "CVE-2024-0001 buffer overflow"),
        ("OCPBUGS-22", "Node fails to join"),
    ]);
    let extractor = IssueReferenceExtractor::new(&["WINC", "OCPBUGS"], tracker).unwrap();

    let candidate = ReleaseCandidate::build_with(&client, &extractor, &request(), open_fake)
        .await
        .unwrap();

    assert_eq!(candidate.snapshot, "snap-c");
    assert_eq!(candidate.component, "wmco");
    assert_eq!(candidate.build_commit, "a6");
    assert_eq!(candidate.window.boundary.sha, "a3");

    let window: Vec<&str> = candidate.window.commits.iter().map(|c| c.sha.as_str()).collect();
    assert_eq!(window, vec!["a6", "a5", "a4"]);
    let missing: Vec<&str> = candidate
        .window
        .missing_merges
        .iter()
        .map(|c| c.sha.as_str())
        .collect();
    assert_eq!(missing, vec!["a8", "a7"]);

    // WINC-9 only appears after the build and is not fetched
    let keys: Vec<&str> = candidate.issues.iter().map(|i| i.key.as_str()).collect();
    assert_eq!(keys, vec!["OCPBUGS-22", "WINC-1"]);

    let notes = &candidate.manifest.spec.data.release_notes;
    assert_eq!(notes.advisory_type, AdvisoryType::Security);
    assert_eq!(notes.cve_entries.len(), 1);
    assert_eq!(notes.cve_entries[0].component, "wmco");
    assert_eq!(notes.fixed_issues.len(), 2);
    assert_eq!(candidate.manifest.metadata.generate_name, "wmco-prod-");
    assert_eq!(candidate.manifest.spec.snapshot, "snap-c");
}

#[tokio::test]
async fn test_issues_fetched_once_per_key() {
    let server = konflux(releases()).await;
    let client = KonfluxClient::new(&server.uri(), None, false).unwrap();
    let tracker = CountingTracker::new(&[("WINC-1", "x"), ("OCPBUGS-22", "y")]);
    let extractor = IssueReferenceExtractor::new(&["WINC", "OCPBUGS"], tracker).unwrap();

    ReleaseCandidate::build_with(&client, &extractor, &request(), open_fake)
        .await
        .unwrap();
    ReleaseCandidate::build_with(&client, &extractor, &request(), open_fake)
        .await
        .unwrap();

    let tracker = extractor.tracker();
    assert_eq!(tracker.calls_for("WINC-1"), 1);
    assert_eq!(tracker.calls_for("OCPBUGS-22"), 1);
    assert_eq!(tracker.total_calls(), 2);
}

#[tokio::test]
async fn test_no_successful_release() {
    let server = konflux(json!({"items": [
        {"metadata": {"name": "B", "creationTimestamp": "2024-05-04T00:00:00Z"},
         "spec": {"snapshot": "snap-b"},
         "status": {"conditions": [{"type": "Released", "status": "False"}]}}
    ]}))
    .await;
    let client = KonfluxClient::new(&server.uri(), None, false).unwrap();
    let extractor = IssueReferenceExtractor::new(&["WINC"], CountingTracker::default()).unwrap();

    let err = ReleaseCandidate::build_with(&client, &extractor, &request(), open_fake)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CandidateError::Release(ReleaseError::NoSuccessfulRelease)
    ));
}

#[tokio::test]
async fn test_unknown_issue_aborts() {
    let server = konflux(releases()).await;
    let client = KonfluxClient::new(&server.uri(), None, false).unwrap();
    let tracker = CountingTracker::new(&[("WINC-1", "x")]);
    let extractor = IssueReferenceExtractor::new(&["WINC", "OCPBUGS"], tracker).unwrap();

    let err = ReleaseCandidate::build_with(&client, &extractor, &request(), open_fake)
        .await
        .unwrap_err();
    assert!(matches!(err, CandidateError::Issue(_)));
}

#[tokio::test]
async fn test_snapshot_without_component_label() {
    let server = MockServer::start().await;
    mount(
        &server,
        "releaseplans/wmco-prod",
        json!({"metadata": {"name": "wmco-prod"}, "spec": {"application": "wmco"}}),
    )
    .await;
    mount(&server, "releases", releases()).await;
    mount(
        &server,
        "snapshots/snap-c",
        json!({"metadata": {"name": "snap-c"}, "spec": {"components": []}}),
    )
    .await;
    let client = KonfluxClient::new(&server.uri(), None, false).unwrap();
    let extractor = IssueReferenceExtractor::new(&["WINC"], CountingTracker::default()).unwrap();

    let err = ReleaseCandidate::build_with(&client, &extractor, &request(), open_fake)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CandidateError::Konflux(KonfluxError::IncompleteSnapshot { .. })
    ));
}
