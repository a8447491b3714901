//! Site configuration for URL compilation.
//!
//! Compiled absolute URLs embed a scheme and a server name. Both come from
//! [`SiteConfig`], loaded from a TOML file with environment variable
//! overrides (`PAGETREE_SCHEME`, `PAGETREE_SERVER_NAME`). `server_name` is
//! optional: when unset, callers that handle requests supply the
//! request-derived host via [`SiteConfig::server_name_or`].
//!
//! ```toml
//! scheme = "https"
//! server_name = "example.com"
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

fn default_scheme() -> String {
    "http".to_string()
}

/// Scheme and server name used when compiling absolute page URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteConfig {
    /// URL scheme for absolute slugs.
    #[serde(default = "default_scheme")]
    pub scheme: String,
    /// Canonical host name; `None` defers to a request-derived fallback.
    #[serde(default)]
    pub server_name: Option<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            scheme: default_scheme(),
            server_name: None,
        }
    }
}

impl SiteConfig {
    /// Creates a config with an explicit server name and the default scheme.
    #[must_use]
    pub fn with_server_name(server_name: impl Into<String>) -> Self {
        Self {
            scheme: default_scheme(),
            server_name: Some(server_name.into()),
        }
    }

    /// Loads configuration from a TOML file, then applies environment
    /// variable overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {e}")))?;
        let mut config: Self = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config file: {e}")))?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Saves configuration as pretty TOML, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create config dir: {e}")))?;
        }
        let toml = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {e}")))?;
        fs::write(path, toml)
            .map_err(|e| Error::Config(format!("Failed to write config file: {e}")))?;
        Ok(())
    }

    /// Applies `PAGETREE_SCHEME` and `PAGETREE_SERVER_NAME` when set and
    /// non-empty.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(scheme) = std::env::var("PAGETREE_SCHEME") {
            let trimmed = scheme.trim();
            if !trimmed.is_empty() {
                self.scheme = trimmed.to_string();
            }
        }
        if let Ok(name) = std::env::var("PAGETREE_SERVER_NAME") {
            let trimmed = name.trim();
            if !trimmed.is_empty() {
                self.server_name = Some(trimmed.to_string());
            }
        }
    }

    /// Returns the configured server name, or `fallback` (typically the
    /// host name derived from the current request) when unset.
    #[must_use]
    pub fn server_name_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.server_name.as_deref().unwrap_or(fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_http_and_no_server_name() {
        let config = SiteConfig::default();
        assert_eq!(config.scheme, "http");
        assert!(config.server_name.is_none());
    }

    #[test]
    fn parses_partial_toml() {
        let config: SiteConfig = toml::from_str("server_name = \"example.com\"").unwrap();
        assert_eq!(config.scheme, "http");
        assert_eq!(config.server_name.as_deref(), Some("example.com"));
    }

    #[test]
    fn server_name_fallback() {
        let config = SiteConfig::default();
        assert_eq!(config.server_name_or("req.example.org"), "req.example.org");

        let config = SiteConfig::with_server_name("example.com");
        assert_eq!(config.server_name_or("req.example.org"), "example.com");
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site.toml");

        let config = SiteConfig {
            scheme: "https".to_string(),
            server_name: Some("example.com".to_string()),
        };
        config.save(&path).unwrap();

        let loaded = SiteConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn load_reports_missing_file_as_config_error() {
        let err = SiteConfig::load(Path::new("/nonexistent/site.toml")).unwrap_err();
        assert_eq!(err.category(), "config");
    }
}
