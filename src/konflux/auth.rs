//! Konflux server and token discovery.
//!
//! Order: explicit configuration, `KONFLUX_SERVER` / `KONFLUX_TOKEN`, then the
//! active `oc` login.

use std::env;
use std::process::Command;

use tracing::debug;

/// Server URL from configuration, the environment, or `oc whoami --show-server`.
pub fn discover_server(configured: Option<&str>) -> Option<String> {
    if let Some(server) = configured.filter(|s| !s.is_empty()) {
        return Some(server.to_string());
    }
    if let Some(server) = env_value("KONFLUX_SERVER") {
        return Some(server);
    }
    oc_whoami("--show-server")
}

/// Bearer token from `KONFLUX_TOKEN` or `oc whoami --show-token`.
pub fn discover_token() -> Option<String> {
    env_value("KONFLUX_TOKEN").or_else(|| oc_whoami("--show-token"))
}

fn env_value(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

fn oc_whoami(flag: &str) -> Option<String> {
    if which::which("oc").is_err() {
        return None;
    }
    let output = Command::new("oc").args(["whoami", flag]).output().ok()?;
    if !output.status.success() {
        debug!(flag, "oc whoami failed");
        return None;
    }
    let value = String::from_utf8(output.stdout).ok()?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_server_wins() {
        assert_eq!(
            discover_server(Some("https://api.example.com:6443")).as_deref(),
            Some("https://api.example.com:6443")
        );
    }

    #[test]
    #[serial_test::serial]
    fn test_server_from_env() {
        temp_env::with_var("KONFLUX_SERVER", Some("https://env.example.com"), || {
            assert_eq!(
                discover_server(None).as_deref(),
                Some("https://env.example.com")
            );
            assert_eq!(
                discover_server(Some("")).as_deref(),
                Some("https://env.example.com")
            );
        });
    }

    #[test]
    #[serial_test::serial]
    fn test_token_from_env() {
        temp_env::with_var("KONFLUX_TOKEN", Some("sha256~abc"), || {
            assert_eq!(discover_token().as_deref(), Some("sha256~abc"));
        });
    }
}
