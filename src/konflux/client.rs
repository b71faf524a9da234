//! Kubernetes API client for Konflux resources.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::KonfluxError;
use crate::retry::{RetryPolicy, is_transient_status, retry_with_backoff};

use super::types::{APPLICATION_LABEL, Component, Release, ReleaseList, ReleasePlan, Snapshot};

const APPSTUDIO_API: &str = "apis/appstudio.redhat.com/v1alpha1";

/// Read access to the release service's objects.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReleaseMetadataSource: Send + Sync {
    async fn release_plan(&self, namespace: &str, name: &str) -> Result<ReleasePlan, KonfluxError>;

    /// Releases of an application.
    async fn releases(&self, namespace: &str, application: &str) -> Result<Vec<Release>, KonfluxError>;

    async fn snapshot(&self, namespace: &str, name: &str) -> Result<Snapshot, KonfluxError>;

    async fn component(&self, namespace: &str, name: &str) -> Result<Component, KonfluxError>;
}

#[derive(Debug, Clone)]
pub struct KonfluxClient {
    http: Client,
    server: Url,
    token: Option<String>,
    retry: RetryPolicy,
}

impl KonfluxClient {
    pub fn new(
        server: &str,
        token: Option<String>,
        insecure_skip_tls_verify: bool,
    ) -> Result<Self, KonfluxError> {
        let server = Url::parse(&format!("{}/", server.trim_end_matches('/')))
            .map_err(|e| KonfluxError::InvalidServer(format!("{}: {}", server, e)))?;
        let http = Client::builder()
            .danger_accept_invalid_certs(insecure_skip_tls_verify)
            .build()
            .map_err(KonfluxError::Request)?;

        Ok(Self {
            http,
            server,
            token,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, KonfluxError> {
        let mut url = self
            .server
            .join(path)
            .map_err(|e| KonfluxError::InvalidServer(format!("{}: {}", path, e)))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        debug!(%url, "Konflux request");

        let text = retry_with_backoff(
            self.retry,
            || {
                let mut request = self
                    .http
                    .get(url.clone())
                    .header(ACCEPT, "application/json");
                if let Some(token) = &self.token {
                    request = request.bearer_auth(token);
                }
                async move {
                    let response = request.send().await.map_err(KonfluxError::Request)?;
                    let status = response.status();
                    let body = response.text().await.map_err(KonfluxError::Request)?;
                    if !status.is_success() {
                        return Err(KonfluxError::Status {
                            status: status.as_u16(),
                            path: path.to_string(),
                            body,
                        });
                    }
                    Ok(body)
                }
            },
            is_transient,
        )
        .await?;

        serde_json::from_str(&text)
            .map_err(|e| KonfluxError::InvalidResponse(format!("{}: {}", path, e)))
    }
}

fn resource_path(namespace: &str, plural: &str, name: Option<&str>) -> String {
    match name {
        Some(name) => format!("{}/namespaces/{}/{}/{}", APPSTUDIO_API, namespace, plural, name),
        None => format!("{}/namespaces/{}/{}", APPSTUDIO_API, namespace, plural),
    }
}

fn is_transient(e: &KonfluxError) -> bool {
    match e {
        KonfluxError::Request(e) => e.is_connect() || e.is_timeout(),
        KonfluxError::Status { status, .. } => is_transient_status(*status),
        _ => false,
    }
}

#[async_trait]
impl ReleaseMetadataSource for KonfluxClient {
    async fn release_plan(&self, namespace: &str, name: &str) -> Result<ReleasePlan, KonfluxError> {
        self.get(&resource_path(namespace, "releaseplans", Some(name)), &[])
            .await
    }

    async fn releases(&self, namespace: &str, application: &str) -> Result<Vec<Release>, KonfluxError> {
        let selector = format!("{}={}", APPLICATION_LABEL, application);
        let list: ReleaseList = self
            .get(
                &resource_path(namespace, "releases", None),
                &[("labelSelector", selector.as_str())],
            )
            .await?;
        debug!(count = list.items.len(), application, "Listed releases");
        Ok(list.items)
    }

    async fn snapshot(&self, namespace: &str, name: &str) -> Result<Snapshot, KonfluxError> {
        self.get(&resource_path(namespace, "snapshots", Some(name)), &[])
            .await
    }

    async fn component(&self, namespace: &str, name: &str) -> Result<Component, KonfluxError> {
        self.get(&resource_path(namespace, "components", Some(name)), &[])
            .await
    }
}
