//! Configuration management for Tessera clients.

use crate::{parse_level, CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Default API base URL (can be overridden at compile time via TESSERA_API_BASE_URL env var).
pub const DEFAULT_API_BASE_URL: &str = match option_env!("TESSERA_API_BASE_URL") {
    Some(url) => url,
    None => "http://localhost:3333",
};

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

pub const DEFAULT_CREDENTIAL_TTL_DAYS: i64 = 30;

pub const DEFAULT_AUTHENTICATED_LANDING: &str = "/dashboard";

pub const DEFAULT_ANONYMOUS_LANDING: &str = "/";

pub const DEFAULT_BROADCAST_CHANNEL: &str = "auth";

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL every API path is resolved against.
    pub api_base_url: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Lifetime of both credential cookies.
    pub credential_ttl_days: i64,
    /// Where guards send visitors who are signed in.
    pub authenticated_landing: String,
    /// Where sign-out and guards send anonymous visitors.
    pub anonymous_landing: String,
    /// Name of the cross-tab session channel.
    pub broadcast_channel: String,
    /// Per-request timeout applied by the HTTP transport. None waits indefinitely.
    pub request_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            credential_ttl_days: DEFAULT_CREDENTIAL_TTL_DAYS,
            authenticated_landing: DEFAULT_AUTHENTICATED_LANDING.to_string(),
            anonymous_landing: DEFAULT_ANONYMOUS_LANDING.to_string(),
            broadcast_channel: DEFAULT_BROADCAST_CHANNEL.to_string(),
            request_timeout_secs: None,
        }
    }
}

impl Config {
    /// Create a new Config with default values, then override from environment.
    pub fn new() -> CoreResult<Self> {
        let mut config = Self::default();
        config.load_from_env()?;
        Ok(config)
    }

    /// Load configuration from the config file, falling back to defaults.
    /// Environment variables win over the file.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.load_from_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|source| CoreError::ConfigFile {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save configuration to a file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    fn load_from_env(&mut self) -> CoreResult<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `TESSERA_*` overrides read through `lookup`. Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> CoreResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(value) = get("TESSERA_API_BASE_URL") {
            self.api_base_url = value;
        }
        if let Some(value) = get("TESSERA_LOG_LEVEL") {
            self.log_level = value;
        }
        if let Some(value) = get("TESSERA_CREDENTIAL_TTL_DAYS") {
            self.credential_ttl_days = value.parse().map_err(|_| {
                CoreError::invalid("TESSERA_CREDENTIAL_TTL_DAYS", format!("not a number: {value}"))
            })?;
        }
        if let Some(value) = get("TESSERA_AUTHENTICATED_LANDING") {
            self.authenticated_landing = value;
        }
        if let Some(value) = get("TESSERA_ANONYMOUS_LANDING") {
            self.anonymous_landing = value;
        }
        if let Some(value) = get("TESSERA_BROADCAST_CHANNEL") {
            self.broadcast_channel = value;
        }
        if let Some(value) = get("TESSERA_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = Some(value.parse().map_err(|_| {
                CoreError::invalid("TESSERA_REQUEST_TIMEOUT_SECS", format!("not a number: {value}"))
            })?);
        }
        Ok(())
    }

    pub fn validate(&self) -> CoreResult<()> {
        let url = self.api_base_url()?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(CoreError::invalid(
                "api_base_url",
                format!("unsupported scheme {}", url.scheme()),
            ));
        }
        if parse_level(&self.log_level).is_none() {
            return Err(CoreError::invalid(
                "log_level",
                format!("unknown level {:?}", self.log_level),
            ));
        }
        if self.credential_ttl_days <= 0 {
            return Err(CoreError::invalid(
                "credential_ttl_days",
                format!("must be positive, got {}", self.credential_ttl_days),
            ));
        }
        for (key, path) in [
            ("authenticated_landing", &self.authenticated_landing),
            ("anonymous_landing", &self.anonymous_landing),
        ] {
            if !path.starts_with('/') {
                return Err(CoreError::invalid(key, format!("must start with '/': {path}")));
            }
        }
        if self.broadcast_channel.trim().is_empty() {
            return Err(CoreError::invalid("broadcast_channel", "must not be empty"));
        }
        Ok(())
    }

    /// Get the API base URL as a parsed URL.
    pub fn api_base_url(&self) -> CoreResult<Url> {
        Url::parse(&self.api_base_url).map_err(CoreError::from)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}
