//! Jira REST v2 client using reqwest.

use reqwest::header::ACCEPT;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;
use url::Url;

use crate::error::JiraError;
use crate::github::auth::read_token_file;
use crate::retry::{RetryPolicy, is_transient_status, retry_with_backoff};

use super::types::{Issue, IssueCreated, IssueSearch, RemoteLink};

/// Jira instance used when none is configured.
pub const DEFAULT_JIRA_URL: &str = "https://issues.redhat.com";

/// Authenticated client for one Jira instance.
#[derive(Debug, Clone)]
pub struct JiraClient {
    http: Client,
    api_base: Url,
    token: String,
    retry: RetryPolicy,
}

impl JiraClient {
    /// Build a client for `base_url` (e.g. `https://issues.redhat.com`).
    pub fn new(base_url: &str, token: impl Into<String>) -> Result<Self, JiraError> {
        let base = format!("{}/", base_url.trim_end_matches('/'));
        let api_base = Url::parse(&base)
            .and_then(|u| u.join("rest/api/2/"))
            .map_err(|e| JiraError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        Ok(Self {
            http: Client::new(),
            api_base,
            token: token.into(),
            retry: RetryPolicy::default(),
        })
    }

    /// Override the retry policy for transient failures.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Browser URL of an issue.
    pub fn browse_url(&self, key: &str) -> String {
        self.api_base
            .join(&format!("../../../browse/{}", key))
            .map(|u| u.to_string())
            .unwrap_or_else(|_| key.to_string())
    }

    fn endpoint(&self, path: &str) -> Result<Url, JiraError> {
        self.api_base
            .join(path)
            .map_err(|e| JiraError::InvalidUrl(format!("{}: {}", path, e)))
    }

    /// Run a JQL search.
    pub async fn search(&self, jql: &str) -> Result<Vec<Issue>, JiraError> {
        let mut url = self.endpoint("search")?;
        url.query_pairs_mut().append_pair("jql", jql);
        let results: IssueSearch = self.send_json(Method::GET, url, None).await?;
        Ok(results.issues)
    }

    /// Fetch a single issue by key.
    ///
    /// Fails when the key matches no issue or more than one.
    pub async fn get_issue(&self, key: &str) -> Result<Issue, JiraError> {
        let mut results = self.search(&format!("key = {}", key)).await?;
        match results.len() {
            0 => Err(JiraError::IssueNotFound(key.to_string())),
            1 => Ok(results.remove(0)),
            count => Err(JiraError::AmbiguousIssue {
                key: key.to_string(),
                count,
            }),
        }
    }

    /// Create an issue, returning its key.
    pub async fn create_issue(&self, issue: &Issue) -> Result<IssueCreated, JiraError> {
        let body = serde_json::to_value(issue)
            .map_err(|e| JiraError::InvalidResponse(e.to_string()))?;
        let created: IssueCreated = self
            .send_json(Method::POST, self.endpoint("issue")?, Some(&body))
            .await?;
        debug!(key = %created.key, "Created issue");
        Ok(created)
    }

    /// Replace the description of an existing issue.
    pub async fn update_description(&self, key: &str, description: &str) -> Result<(), JiraError> {
        let body = json!({ "fields": { "description": description } });
        self.send(
            Method::PUT,
            self.endpoint(&format!("issue/{}", key))?,
            Some(&body),
        )
        .await?;
        Ok(())
    }

    /// Remote links attached to an issue.
    pub async fn remote_links(&self, key: &str) -> Result<Vec<RemoteLink>, JiraError> {
        self.send_json(
            Method::GET,
            self.endpoint(&format!("issue/{}/remotelink", key))?,
            None,
        )
        .await
    }

    /// Attach a remote link to an issue.
    pub async fn add_remote_link(&self, key: &str, url: &str, title: &str) -> Result<(), JiraError> {
        let body = json!({ "object": { "title": title, "url": url } });
        self.send(
            Method::POST,
            self.endpoint(&format!("issue/{}/remotelink", key))?,
            Some(&body),
        )
        .await?;
        Ok(())
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<&serde_json::Value>,
    ) -> Result<T, JiraError> {
        let text = self.send(method, url, body).await?;
        serde_json::from_str(&text).map_err(|e| JiraError::InvalidResponse(e.to_string()))
    }

    /// Make the request and return the response body.
    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<&serde_json::Value>,
    ) -> Result<String, JiraError> {
        debug!(%method, %url, "Jira request");
        retry_with_backoff(
            self.retry,
            || {
                let mut request = self
                    .http
                    .request(method.clone(), url.clone())
                    .bearer_auth(&self.token)
                    .header(ACCEPT, "application/json");
                if let Some(body) = body {
                    request = request.json(body);
                }
                async move {
                    let response = request.send().await.map_err(JiraError::Request)?;
                    let status = response.status();
                    let text = response.text().await.map_err(JiraError::Request)?;
                    if !status.is_success() {
                        return Err(JiraError::Status {
                            status: status.as_u16(),
                            body: text,
                        });
                    }
                    Ok(text)
                }
            },
            is_transient,
        )
        .await
    }
}

fn is_transient(e: &JiraError) -> bool {
    match e {
        JiraError::Request(e) => e.is_connect() || e.is_timeout(),
        JiraError::Status { status, .. } => is_transient_status(*status),
        _ => false,
    }
}

/// Get the Jira API token from `JIRA_API_TOKEN` or `~/.jira/token`.
pub fn get_jira_token() -> Result<String, JiraError> {
    if let Ok(token) = std::env::var("JIRA_API_TOKEN") {
        if !token.is_empty() {
            return Ok(token);
        }
    }

    dirs::home_dir()
        .and_then(|home| read_token_file(&home.join(".jira").join("token")))
        .ok_or(JiraError::MissingToken)
}
