//! Client configuration (layered: explicit > env > config file).

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::AgentError;

const ENV_API_KEY: &str = "OPENAI_API_KEY";
const ENV_BASE_URL: &str = "OPENAI_BASE_URL";
const ENV_ORG_ID: &str = "OPENAI_ORG_ID";

/// Connection settings for the OpenAI-compatible provider.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| ".."))
            .field("base_url", &self.base_url)
            .field("org_id", &self.org_id)
            .finish()
    }
}

impl ClientConfig {
    /// Load from environment variables, reading `.env` if present.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        Self {
            api_key: get(ENV_API_KEY),
            base_url: get(ENV_BASE_URL),
            org_id: get(ENV_ORG_ID),
        }
    }

    /// Read a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self, AgentError> {
        let raw = fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| {
            AgentError::Configuration(format!("invalid config file {}: {e}", path.display()))
        })
    }

    /// Config file (when it exists) overlaid with the environment.
    ///
    /// With no explicit path the default location is used.
    pub fn load(path: Option<&Path>) -> Result<Self, AgentError> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
        let file = match Self::from_file(&path) {
            Ok(config) => config,
            Err(AgentError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                Self::default()
            }
            Err(err) => return Err(err),
        };
        Ok(file.merge(Self::from_env()))
    }

    /// Fields set in `other` win.
    pub fn merge(self, other: Self) -> Self {
        Self {
            api_key: other.api_key.or(self.api_key),
            base_url: other.base_url.or(self.base_url),
            org_id: other.org_id.or(self.org_id),
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// The API key, or an authentication error naming the variable to set.
    pub fn api_key(&self) -> Result<String, AgentError> {
        self.api_key
            .clone()
            .ok_or_else(|| AgentError::Authentication(format!("Missing {ENV_API_KEY}")))
    }
}

/// `~/.toolloop/config.toml`, or a relative `.toolloop` directory without a home.
pub fn default_config_path() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".toolloop"))
        .unwrap_or_else(|| PathBuf::from(".toolloop"))
        .join("config.toml")
}
