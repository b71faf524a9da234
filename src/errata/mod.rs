//! Pending advisory listing from the Errata Tool.
//!
//! The Errata Tool only accepts Kerberos (SPNEGO) authentication, so requests
//! go through `curl --negotiate` instead of an HTTP client.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;
use url::Url;

use crate::config::ErrataSettings;
use crate::error::ErrataError;

const CURL_TIMEOUT_SECS: u64 = 60;

/// Advisory states still in flight.
const OPEN_STATES: [&str; 5] = ["IN_PUSH", "NEW_FILES", "PUSH_READY", "QE", "REL_PREP"];

/// Fetches a URL and returns the response body.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ErrataFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, ErrataError>;
}

/// Fetcher that shells out to `curl --negotiate --user :`.
#[derive(Debug, Default, Clone, Copy)]
pub struct CurlFetcher;

#[async_trait]
impl ErrataFetcher for CurlFetcher {
    async fn fetch(&self, url: &str) -> Result<String, ErrataError> {
        if which::which("curl").is_err() {
            return Err(ErrataError::CurlNotInstalled);
        }

        debug!(url, "Querying errata");
        let child = Command::new("curl")
            .args(["--silent", "--show-error", "--negotiate", "--user", ":", url])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = timeout(Duration::from_secs(CURL_TIMEOUT_SECS), child)
            .await
            .map_err(|_| ErrataError::Timeout(CURL_TIMEOUT_SECS))?
            .map_err(ErrataError::SpawnFailed)?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ErrataError::CurlFailed {
                output: format!("{}{}", stdout, stderr.trim()),
                code: output.status.code(),
            });
        }
        Ok(stdout)
    }
}

/// One pending advisory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ErrataSummary {
    pub id: u64,
    pub synopsis: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Deserialize)]
struct ErrataSearch {
    #[serde(default)]
    data: Vec<ErrataSummary>,
}

/// Search URL for open advisories of the configured product.
pub fn search_url(settings: &ErrataSettings) -> Result<Url, ErrataError> {
    let base = format!("{}/", settings.url.trim_end_matches('/'));
    let mut url = Url::parse(&base)
        .and_then(|u| u.join("api/v1/erratum/search"))
        .map_err(|e| ErrataError::InvalidUrl(format!("{}: {}", settings.url, e)))?;

    {
        let mut query = url.query_pairs_mut();
        query.append_pair("product[]", &settings.product_id.to_string());
        for state in OPEN_STATES {
            query.append_pair(&format!("show_state_{}", state), "1");
        }
        query.append_pair("synopsis_text", &settings.synopsis);
    }
    Ok(url)
}

/// Browser URL of an advisory.
pub fn advisory_url(settings: &ErrataSettings, id: u64) -> String {
    format!("{}/advisory/{}", settings.url.trim_end_matches('/'), id)
}

pub fn parse_search_response(output: &str) -> Result<Vec<ErrataSummary>, ErrataError> {
    let search: ErrataSearch =
        serde_json::from_str(output).map_err(|e| ErrataError::InvalidJson {
            output: output.to_string(),
            reason: e.to_string(),
        })?;
    Ok(search.data)
}

/// List open advisories.
pub async fn list_errata<F: ErrataFetcher + ?Sized>(
    fetcher: &F,
    settings: &ErrataSettings,
) -> Result<Vec<ErrataSummary>, ErrataError> {
    let url = search_url(settings)?;
    let body = fetcher.fetch(url.as_str()).await?;
    let errata = parse_search_response(&body)?;
    debug!(count = errata.len(), "Open advisories");
    Ok(errata)
}
