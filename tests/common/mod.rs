//! Shared test utilities for integration tests.
//!
//! Not all functions are used by every test file, but they're shared across tests.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use git2::{Oid, Repository, Signature};

use release_ledger::error::{GatewayError, JiraError};
use release_ledger::git::{Commit, CommitFilter, RepositoryGateway, Tag};
use release_ledger::jira::{IssueRecord, IssueTracker};

/// Build a commit value.
pub fn commit(sha: &str, message: &str) -> Commit {
    Commit {
        sha: sha.to_string(),
        message: message.to_string(),
        parent_count: 1,
    }
}

/// In-memory repository following first-parent history.
///
/// Each commit records its parents; refs (branches) and tags name commits.
#[derive(Default)]
pub struct FakeRepository {
    commits: HashMap<String, (Commit, Vec<String>)>,
    refs: HashMap<String, String>,
    tags: Vec<Tag>,
    overrun_until: bool,
    pub list_commits_calls: AtomicUsize,
    pub merge_base_calls: Mutex<Vec<(String, String)>>,
}

impl FakeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a commit with the given parents (first parent first).
    pub fn commit(&mut self, sha: &str, message: &str, parents: &[&str]) -> &mut Self {
        let c = Commit {
            sha: sha.to_string(),
            message: message.to_string(),
            parent_count: parents.len(),
        };
        self.commits.insert(
            sha.to_string(),
            (c, parents.iter().map(|p| p.to_string()).collect()),
        );
        self
    }

    /// Add a linear chain of commits, oldest first, each parented on the previous.
    pub fn chain(&mut self, parent: Option<&str>, shas: &[&str]) -> &mut Self {
        let mut parent = parent.map(str::to_string);
        for sha in shas {
            let parents: Vec<&str> = parent.iter().map(String::as_str).collect();
            self.commit(sha, &format!("commit {}", sha), &parents);
            parent = Some(sha.to_string());
        }
        self
    }

    pub fn branch(&mut self, name: &str, sha: &str) -> &mut Self {
        self.refs.insert(name.to_string(), sha.to_string());
        self
    }

    pub fn tag(&mut self, name: &str, sha: &str) -> &mut Self {
        self.tags.push(Tag {
            name: name.to_string(),
            sha: sha.to_string(),
        });
        self
    }

    /// List the full history regardless of `until`, as a gateway with
    /// unreliable pagination may.
    pub fn overrun_until(&mut self) -> &mut Self {
        self.overrun_until = true;
        self
    }

    fn resolve<'a>(&'a self, reference: &'a str) -> &'a str {
        self.refs
            .get(reference)
            .map(String::as_str)
            .unwrap_or(reference)
    }

    /// First-parent history starting at `from`, newest first.
    fn history(&self, from: &str) -> Vec<&Commit> {
        let mut out = Vec::new();
        let mut current = Some(self.resolve(from).to_string());
        while let Some(sha) = current {
            match self.commits.get(&sha) {
                Some((c, parents)) => {
                    out.push(c);
                    current = parents.first().cloned();
                }
                None => break,
            }
        }
        out
    }
}

#[async_trait]
impl RepositoryGateway for FakeRepository {
    async fn list_tags(&self) -> Result<Vec<Tag>, GatewayError> {
        Ok(self.tags.clone())
    }

    async fn list_commits(
        &self,
        from: &str,
        until: &str,
        exclude: CommitFilter,
    ) -> Result<Vec<Commit>, GatewayError> {
        self.list_commits_calls.fetch_add(1, Ordering::SeqCst);
        let until = self.resolve(until);
        let mut out = Vec::new();
        for c in self.history(from) {
            if c.sha == until && !self.overrun_until {
                break;
            }
            if !exclude(c) {
                out.push(c.clone());
            }
        }
        Ok(out)
    }

    async fn merge_base(&self, a: &str, b: &str) -> Result<String, GatewayError> {
        self.merge_base_calls
            .lock()
            .unwrap()
            .push((a.to_string(), b.to_string()));
        if !self.refs.contains_key(a) && !self.commits.contains_key(a) {
            return Err(GatewayError::ReferenceNotFound(
                a.to_string(),
                git2::Error::from_str("no such ref"),
            ));
        }
        let ancestors: HashSet<&str> = self.history(a).iter().map(|c| c.sha.as_str()).collect();
        self.history(b)
            .into_iter()
            .find(|c| ancestors.contains(c.sha.as_str()))
            .map(|c| c.sha.clone())
            .ok_or_else(|| GatewayError::Git(git2::Error::from_str("no merge base")))
    }
}

/// Issue tracker serving canned summaries and counting lookups per key.
#[derive(Default)]
pub struct CountingTracker {
    summaries: HashMap<String, String>,
    pub calls: Mutex<HashMap<String, usize>>,
}

impl CountingTracker {
    pub fn new(issues: &[(&str, &str)]) -> Self {
        Self {
            summaries: issues
                .iter()
                .map(|(k, s)| (k.to_string(), s.to_string()))
                .collect(),
            calls: Mutex::new(HashMap::new()),
        }
    }

    pub fn calls_for(&self, key: &str) -> usize {
        self.calls.lock().unwrap().get(key).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl IssueTracker for CountingTracker {
    async fn fetch_issue(&self, key: &str) -> Result<IssueRecord, JiraError> {
        *self.calls.lock().unwrap().entry(key.to_string()).or_default() += 1;
        self.summaries
            .get(key)
            .map(|summary| IssueRecord::new(key, summary.as_str()))
            .ok_or_else(|| JiraError::IssueNotFound(key.to_string()))
    }
}

/// Create a temporary directory for test output.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

/// A test git repository builder for integration tests.
pub struct TestRepo {
    pub dir: tempfile::TempDir,
    pub repo: Repository,
}

impl TestRepo {
    /// Create a new empty git repository in a temp directory.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let repo = Repository::init(dir.path()).expect("Failed to init git repo");
        Self { dir, repo }
    }

    /// Get the test signature for commits.
    fn signature(&self) -> Signature<'_> {
        Signature::now("Test User", "test@example.com").expect("Failed to create signature")
    }

    fn tree_with(&self, message: &str) -> Oid {
        let file_path = self.dir.path().join("test.txt");
        std::fs::write(&file_path, message).expect("Failed to write test file");

        let mut index = self.repo.index().expect("Failed to get index");
        index
            .add_path(std::path::Path::new("test.txt"))
            .expect("Failed to add file");
        index.write().expect("Failed to write index");
        index.write_tree().expect("Failed to write tree")
    }

    /// Create a commit on HEAD with the given message. Returns the commit OID.
    pub fn commit(&self, message: &str) -> Oid {
        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<Oid> = parent.iter().map(|c| c.id()).collect();
        self.commit_with_parents(Some("HEAD"), message, &parents)
    }

    /// Create a commit on top of `parent` without moving HEAD.
    pub fn commit_on(&self, parent: Oid, message: &str) -> Oid {
        self.commit_with_parents(None, message, &[parent])
    }

    /// Create a merge commit on HEAD joining HEAD and `other`.
    pub fn merge(&self, other: Oid, message: &str) -> Oid {
        let head = self
            .repo
            .head()
            .and_then(|h| h.peel_to_commit())
            .expect("Failed to read HEAD");
        self.commit_with_parents(Some("HEAD"), message, &[head.id(), other])
    }

    fn commit_with_parents(&self, update_ref: Option<&str>, message: &str, parents: &[Oid]) -> Oid {
        let sig = self.signature();
        let tree_id = self.tree_with(message);
        let tree = self.repo.find_tree(tree_id).expect("Failed to find tree");
        let parents: Vec<git2::Commit> = parents
            .iter()
            .map(|oid| self.repo.find_commit(*oid).expect("Failed to find parent"))
            .collect();
        let parent_refs: Vec<&git2::Commit> = parents.iter().collect();

        self.repo
            .commit(update_ref, &sig, &sig, message, &tree, &parent_refs)
            .expect("Failed to create commit")
    }

    /// Create a lightweight tag pointing to the given OID.
    pub fn tag_lightweight(&self, name: &str, oid: Oid) {
        let obj = self.repo.find_object(oid, None).expect("Failed to find object");
        self.repo
            .tag_lightweight(name, &obj, false)
            .expect("Failed to create lightweight tag");
    }

    /// Create an annotated tag pointing to the given OID.
    pub fn tag_annotated(&self, name: &str, oid: Oid, message: &str) {
        let sig = self.signature();
        let obj = self.repo.find_object(oid, None).expect("Failed to find object");
        self.repo
            .tag(name, &obj, &sig, message, false)
            .expect("Failed to create annotated tag");
    }

    /// Create a branch pointing to the given OID.
    pub fn branch(&self, name: &str, oid: Oid) {
        let commit = self.repo.find_commit(oid).expect("Failed to find commit");
        self.repo
            .branch(name, &commit, false)
            .expect("Failed to create branch");
    }

    pub fn path(&self) -> &std::path::Path {
        self.dir.path()
    }
}
