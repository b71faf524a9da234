//! Runtime configuration loaded from TOML and the environment.
//!
//! Resolution order, lowest to highest precedence: built-in defaults, the
//! config file, environment variables, then CLI flags applied by the caller.

use std::path::{Path, PathBuf};

use toml_edit::{DocumentMut, Item};
use tracing::debug;

use crate::error::ConfigError;
use crate::jira::DEFAULT_JIRA_URL;

pub const DEFAULT_PROJECT: &str = "WINC";
pub const DEFAULT_EXTRA_PROJECT: &str = "OCPBUGS";
pub const DEFAULT_ERRATA_URL: &str = "https://errata.devel.redhat.com";
pub const DEFAULT_ERRATA_PRODUCT: u32 = 79;
pub const DEFAULT_ERRATA_SYNOPSIS: &str = "Windows Containers";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JiraSettings {
    pub url: String,
    /// Project that owns release tickets.
    pub project: String,
    /// Other projects whose keys are picked up from commit messages.
    pub extra_projects: Vec<String>,
}

impl JiraSettings {
    /// Every project key to search commit messages for.
    pub fn issue_projects(&self) -> Vec<String> {
        let mut projects = vec![self.project.clone()];
        for p in &self.extra_projects {
            if !projects.contains(p) {
                projects.push(p.clone());
            }
        }
        projects
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KonfluxSettings {
    pub server: Option<String>,
    pub namespace: Option<String>,
    pub insecure_skip_tls_verify: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrataSettings {
    pub url: String,
    pub product_id: u32,
    pub synopsis: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub jira: JiraSettings,
    pub konflux: KonfluxSettings,
    pub errata: ErrataSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            jira: JiraSettings {
                url: DEFAULT_JIRA_URL.to_string(),
                project: DEFAULT_PROJECT.to_string(),
                extra_projects: vec![DEFAULT_EXTRA_PROJECT.to_string()],
            },
            konflux: KonfluxSettings::default(),
            errata: ErrataSettings {
                url: DEFAULT_ERRATA_URL.to_string(),
                product_id: DEFAULT_ERRATA_PRODUCT,
                synopsis: DEFAULT_ERRATA_SYNOPSIS.to_string(),
            },
        }
    }
}

/// Default config location, `<config_dir>/release-ledger/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("release-ledger").join("config.toml"))
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one, the default location is
    /// used when present and defaults apply otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => match default_config_path().filter(|p| p.is_file()) {
                Some(p) => Self::from_file(&p)?,
                None => Self::default(),
            },
        };
        config.apply_env()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        debug!(path = %path.display(), "Loading config");
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content).map_err(|e| match e {
            ConfigError::ParseFailed { reason, .. } => ConfigError::ParseFailed {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })
    }

    /// Parse TOML content on top of the defaults.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let doc = content
            .parse::<DocumentMut>()
            .map_err(|e| ConfigError::ParseFailed {
                path: "<inline>".to_string(),
                reason: format!("Invalid TOML: {}", e),
            })?;

        let mut config = Self::default();

        if let Some(url) = string_at(&doc, "jira", "url")? {
            config.jira.url = url;
        }
        if let Some(project) = string_at(&doc, "jira", "project")? {
            config.jira.project = project;
        }
        if let Some(item) = doc.get("jira").and_then(|t| t.get("extra_projects")) {
            config.jira.extra_projects = string_array(item, "jira.extra_projects")?;
        }

        config.konflux.server = string_at(&doc, "konflux", "server")?;
        config.konflux.namespace = string_at(&doc, "konflux", "namespace")?;
        if let Some(item) = doc
            .get("konflux")
            .and_then(|t| t.get("insecure_skip_tls_verify"))
        {
            config.konflux.insecure_skip_tls_verify = item
                .as_bool()
                .ok_or_else(|| invalid("konflux.insecure_skip_tls_verify", "expected a boolean"))?;
        }

        if let Some(url) = string_at(&doc, "errata", "url")? {
            config.errata.url = url;
        }
        if let Some(item) = doc.get("errata").and_then(|t| t.get("product_id")) {
            let id = item
                .as_integer()
                .ok_or_else(|| invalid("errata.product_id", "expected an integer"))?;
            config.errata.product_id =
                u32::try_from(id).map_err(|_| invalid("errata.product_id", "out of range"))?;
        }
        if let Some(synopsis) = string_at(&doc, "errata", "synopsis")? {
            config.errata.synopsis = synopsis;
        }

        Ok(config)
    }

    /// Overlay `JIRA_URL`, `JIRA_PROJECT`, `KONFLUX_SERVER` and `KONFLUX_NAMESPACE`.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Some(url) = env_value("JIRA_URL") {
            self.jira.url = url;
        }
        if let Some(project) = env_value("JIRA_PROJECT") {
            self.jira.project = project;
        }
        if let Some(server) = env_value("KONFLUX_SERVER") {
            self.konflux.server = Some(server);
        }
        if let Some(namespace) = env_value("KONFLUX_NAMESPACE") {
            self.konflux.namespace = Some(namespace);
        }
        if self.jira.project.trim().is_empty() {
            return Err(invalid("jira.project", "must not be empty"));
        }
        Ok(())
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn invalid(key: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn string_at(doc: &DocumentMut, table: &str, key: &str) -> Result<Option<String>, ConfigError> {
    match doc.get(table).and_then(|t| t.get(key)) {
        None => Ok(None),
        Some(item) => item
            .as_str()
            .map(|s| Some(s.to_string()))
            .ok_or_else(|| invalid(&format!("{}.{}", table, key), "expected a string")),
    }
}

fn string_array(item: &Item, key: &str) -> Result<Vec<String>, ConfigError> {
    let array = item
        .as_array()
        .ok_or_else(|| invalid(key, "expected an array of strings"))?;
    array
        .iter()
        .map(|v| {
            v.as_str()
                .map(str::to_string)
                .ok_or_else(|| invalid(key, "expected an array of strings"))
        })
        .collect()
}
