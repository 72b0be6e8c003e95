// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Client configuration with strict validation.
//!
//! Values are layered, lowest precedence first: built-in defaults, an
//! optional YAML file, `SPEEDTIN_*` environment variables, and finally
//! explicit overrides passed by the caller. The merged raw values are then
//! validated into a [`ClientConfig`].

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{SpeedTinError, SpeedTinResult, ValidationError};
use crate::types::{AuthKey, ProjectId};

pub const ENV_AUTHORIZATION_KEY: &str = "SPEEDTIN_AUTHORIZATION_KEY";
pub const ENV_PROJECT_ID: &str = "SPEEDTIN_PROJECT_ID";
pub const ENV_BASE_URL: &str = "SPEEDTIN_BASE_URL";
pub const ENV_CACHE_DIR: &str = "SPEEDTIN_CACHE_DIR";

pub const DEFAULT_BASE_URL: &str = "https://www.speedtin.com";

fn default_timeout_ms() -> u64 {
    30_000
}

/// Raw configuration as parsed from YAML (before validation).
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawClientConfig {
    authorization_key: Option<String>,
    project_id: Option<String>,
    base_url: Option<String>,
    cache_dir: Option<String>,
    timeout_ms: Option<u64>,
}

/// Values supplied explicitly by the caller; they win over every other source.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub authorization_key: Option<String>,
    pub project_id: Option<String>,
    pub base_url: Option<String>,
    pub cache_dir: Option<PathBuf>,
}

/// Validated client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub authorization_key: AuthKey,
    pub project_id: ProjectId,
    /// Service root, never ending in `/`.
    pub base_url: String,
    /// Root of the per-project id cache.
    pub cache_dir: PathBuf,
    /// Request timeout; 0 leaves the transport default in place.
    pub timeout_ms: u64,
}

impl ClientConfig {
    /// Configuration with default service URL, cache location and timeout.
    pub fn new(authorization_key: AuthKey, project_id: ProjectId) -> Self {
        Self {
            authorization_key,
            project_id,
            base_url: DEFAULT_BASE_URL.to_string(),
            cache_dir: default_cache_dir(),
            timeout_ms: default_timeout_ms(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> SpeedTinResult<Self> {
        self.base_url = validate_base_url(base_url.into())?;
        Ok(self)
    }

    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = cache_dir.into();
        self
    }

    /// Directory holding this project's cache files.
    pub fn project_cache_dir(&self) -> PathBuf {
        self.cache_dir.join(self.project_id.as_str())
    }
}

/// `~/.speedtin`, or a directory under the system temp dir when no home
/// directory can be determined.
pub fn default_cache_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".speedtin"))
        .unwrap_or_else(|| std::env::temp_dir().join("speedtin"))
}

/// Configuration loader with strict validation.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from a YAML file, then apply the process environment.
    pub fn load_file(path: impl AsRef<Path>) -> SpeedTinResult<ClientConfig> {
        Self::resolve(Some(path.as_ref()), ConfigOverrides::default())
    }

    /// Load from a YAML string, then apply the process environment.
    pub fn load_string(content: &str) -> SpeedTinResult<ClientConfig> {
        let raw = Self::parse(content)?;
        Self::merge(raw, ConfigOverrides::default(), |name| std::env::var(name).ok())
    }

    /// Load from the process environment only.
    pub fn from_env() -> SpeedTinResult<ClientConfig> {
        Self::resolve(None, ConfigOverrides::default())
    }

    /// Full layering: optional file, process environment, explicit overrides.
    pub fn resolve(
        file: Option<&Path>,
        overrides: ConfigOverrides,
    ) -> SpeedTinResult<ClientConfig> {
        let raw = match file {
            Some(path) => Self::read_file(path)?,
            None => RawClientConfig::default(),
        };
        Self::merge(raw, overrides, |name| std::env::var(name).ok())
    }

    /// Validate a YAML file on its own, without environment or overrides.
    /// Missing credentials are not reported; they may come from elsewhere.
    pub fn check_file(path: impl AsRef<Path>) -> SpeedTinResult<()> {
        let raw = Self::read_file(path.as_ref())?;
        if let Some(key) = raw.authorization_key {
            AuthKey::new(key)?;
        }
        if let Some(id) = raw.project_id {
            ProjectId::new(id)?;
        }
        if let Some(url) = raw.base_url {
            validate_base_url(url)?;
        }
        Ok(())
    }

    fn read_file(path: &Path) -> SpeedTinResult<RawClientConfig> {
        if !path.exists() {
            return Err(SpeedTinError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| SpeedTinError::Io {
            context: "reading config file",
            source: e,
        })?;

        Self::parse(&content)
    }

    fn parse(content: &str) -> SpeedTinResult<RawClientConfig> {
        // An empty document is a valid, empty configuration.
        if content.trim().is_empty() {
            return Ok(RawClientConfig::default());
        }
        serde_yaml::from_str(content).map_err(|e| SpeedTinError::ConfigParse {
            message: format!("YAML parse error: {}", e),
        })
    }

    fn merge(
        mut raw: RawClientConfig,
        overrides: ConfigOverrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> SpeedTinResult<ClientConfig> {
        if let Some(v) = env(ENV_AUTHORIZATION_KEY) {
            raw.authorization_key = Some(v);
        }
        if let Some(v) = env(ENV_PROJECT_ID) {
            raw.project_id = Some(v);
        }
        if let Some(v) = env(ENV_BASE_URL) {
            raw.base_url = Some(v);
        }
        if let Some(v) = env(ENV_CACHE_DIR) {
            raw.cache_dir = Some(v);
        }

        if overrides.authorization_key.is_some() {
            raw.authorization_key = overrides.authorization_key;
        }
        if overrides.project_id.is_some() {
            raw.project_id = overrides.project_id;
        }
        if overrides.base_url.is_some() {
            raw.base_url = overrides.base_url;
        }
        if let Some(dir) = overrides.cache_dir {
            raw.cache_dir = Some(dir.to_string_lossy().into_owned());
        }

        Self::validate(raw)
    }

    fn validate(raw: RawClientConfig) -> SpeedTinResult<ClientConfig> {
        let authorization_key = raw
            .authorization_key
            .ok_or(ValidationError::MissingRequiredField {
                field: "authorization_key",
                env_var: ENV_AUTHORIZATION_KEY,
            })
            .and_then(AuthKey::new)?;

        let project_id = raw
            .project_id
            .ok_or(ValidationError::MissingRequiredField {
                field: "project_id",
                env_var: ENV_PROJECT_ID,
            })
            .and_then(ProjectId::new)?;

        let base_url = validate_base_url(
            raw.base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        )?;

        let cache_dir = match raw.cache_dir {
            Some(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => default_cache_dir(),
        };

        Ok(ClientConfig {
            authorization_key,
            project_id,
            base_url,
            cache_dir,
            timeout_ms: raw.timeout_ms.unwrap_or_else(default_timeout_ms),
        })
    }
}

fn validate_base_url(url: String) -> Result<String, ValidationError> {
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ValidationError::InvalidFieldValue {
            field: "base_url",
            value: url,
            reason: "Must start with http:// or https://".to_string(),
        });
    }
    if url.ends_with('/') {
        return Err(ValidationError::InvalidFieldValue {
            field: "base_url",
            value: url,
            reason: "The base url must not end with a slash".to_string(),
        });
    }
    Ok(url)
}
