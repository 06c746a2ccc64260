use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::fs as async_fs;

use crate::domain::value_objects::{ProviderKind, RepositoryCoordinate};
use crate::infrastructure::http::TransportSettings;

/// File looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "scm-bridge.yaml";

pub const ENV_PROVIDER: &str = "SCM_PROVIDER";
pub const ENV_SERVER: &str = "SCM_SERVER";
pub const ENV_TOKEN: &str = "SCM_TOKEN";
pub const ENV_REPOSITORY: &str = "SCM_REPOSITORY";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration store related errors
#[derive(Debug, Error)]
pub enum ConfigStoreError {
    #[error("Config file not found at path: {0}")]
    ConfigFileNotFound(String),

    #[error("Missing required setting: {0}")]
    MissingSetting(&'static str),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

/// Connection profile as written in `scm-bridge.yaml`.
///
/// Every field is optional in the file; [`ClientConfig::resolve`] enforces
/// what a connection needs.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,

    /// Inline token. Prefer `token_env` for files that get committed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Name of the environment variable holding the token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("provider", &self.provider)
            .field("server", &self.server)
            .field("repository", &self.repository)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("token_env", &self.token_env)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ClientConfig {
    /// Overlay `SCM_*` variables from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|name| std::env::var(name).ok());
    }

    /// Overlay `SCM_*` variables read through `lookup`. Empty values are
    /// ignored.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(provider) = read(ENV_PROVIDER) {
            self.provider = Some(provider);
        }
        if let Some(server) = read(ENV_SERVER) {
            self.server = Some(server);
        }
        if let Some(token) = read(ENV_TOKEN) {
            self.token = Some(token);
        }
        if let Some(repository) = read(ENV_REPOSITORY) {
            self.repository = Some(repository);
        }
    }

    /// Validate and turn into a connection profile, reading `token_env`
    /// from the process environment.
    pub fn resolve(&self) -> Result<ConnectionProfile, ConfigStoreError> {
        self.resolve_with(|name| std::env::var(name).ok())
    }

    pub fn resolve_with<F>(&self, lookup: F) -> Result<ConnectionProfile, ConfigStoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let provider = self
            .provider
            .as_deref()
            .ok_or(ConfigStoreError::MissingSetting("provider"))?
            .parse::<ProviderKind>()
            .map_err(|e| ConfigStoreError::InvalidValue {
                field: "provider",
                reason: e.to_string(),
            })?;

        let repository = self
            .repository
            .as_deref()
            .ok_or(ConfigStoreError::MissingSetting("repository"))?
            .parse::<RepositoryCoordinate>()
            .map_err(|e| ConfigStoreError::InvalidValue {
                field: "repository",
                reason: e.to_string(),
            })?;

        // An inline token wins over `token_env`; neither means anonymous.
        let token = match (&self.token, &self.token_env) {
            (Some(token), _) => token.clone(),
            (None, Some(var)) => lookup(var).unwrap_or_default(),
            (None, None) => String::new(),
        };

        let timeout_secs = self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(ConfigStoreError::InvalidValue {
                field: "timeout_secs",
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(ConnectionProfile {
            provider,
            server: self.server.clone().unwrap_or_default(),
            repository,
            token,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// Fully resolved settings for one client connection
#[derive(Clone)]
pub struct ConnectionProfile {
    pub provider: ProviderKind,
    /// Empty means the provider's public server
    pub server: String,
    pub repository: RepositoryCoordinate,
    pub token: String,
    pub timeout: Duration,
}

impl fmt::Debug for ConnectionProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionProfile")
            .field("provider", &self.provider)
            .field("server", &self.server)
            .field("repository", &self.repository)
            .field("token", &if self.token.is_empty() { "<none>" } else { "<redacted>" })
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ConnectionProfile {
    pub fn transport_settings(&self) -> TransportSettings {
        TransportSettings {
            timeout: self.timeout,
            ..TransportSettings::default()
        }
    }
}

/// Loads connection profiles from YAML files
#[derive(Debug, Default)]
pub struct ConfigStore;

impl ConfigStore {
    pub fn new() -> Self {
        Self
    }

    /// Read and parse a config file
    pub async fn read_config<P: AsRef<Path>>(
        &self,
        config_path: P,
    ) -> Result<ClientConfig, ConfigStoreError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Err(ConfigStoreError::ConfigFileNotFound(
                config_path.display().to_string(),
            ));
        }

        let content = async_fs::read_to_string(config_path).await?;
        self.parse_config(&content)
    }

    pub fn parse_config(&self, content: &str) -> Result<ClientConfig, ConfigStoreError> {
        if content.trim().is_empty() {
            return Ok(ClientConfig::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Load the explicit file if given, else `scm-bridge.yaml` from `dir`
    /// when present, else an empty config. Environment overrides are
    /// applied last.
    pub async fn load(
        &self,
        explicit: Option<&Path>,
        dir: &Path,
    ) -> Result<ClientConfig, ConfigStoreError> {
        let mut config = match explicit {
            Some(path) => self.read_config(path).await?,
            None => {
                let candidate: PathBuf = dir.join(DEFAULT_CONFIG_FILE);
                if candidate.exists() {
                    self.read_config(&candidate).await?
                } else {
                    ClientConfig::default()
                }
            }
        };
        config.apply_env();
        tracing::debug!("Loaded client config: {:?}", config);
        Ok(config)
    }
}
