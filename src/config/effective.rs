//! Effective configuration
//!
//! Built once at process start from built-in defaults, an optional TOML file
//! and the environment, then handed to the catalog builder. Nothing below
//! this module reads the environment.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::defaults::{
    BuiltinDefaults, ENV_BRANCH, ENV_DEV_SERVER_HOST, ENV_DEV_SERVER_PORT, ENV_REPOSITORY,
};
use super::url::{DevServer, Repository, UrlRule};

/// Errors building the configuration. These abort the run.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid repository '{0}': expected 'owner/name'")]
    InvalidRepository(String),

    #[error("Invalid dev server port '{0}'")]
    InvalidPort(String),
}

/// Origin of a configuration layer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOrigin {
    Builtin,
    File,
    Env,
    Cli,
}

/// A contributing config layer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfigSource {
    pub origin: ConfigOrigin,

    /// File path (file layer only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Optional settings read from a TOML file (layer 2)
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub upload_dir: Option<PathBuf>,
    pub registry_path: Option<PathBuf>,
    pub publish_path: Option<String>,
    pub repository: Option<String>,
    pub branch: Option<String>,
    pub dev_server_host: Option<String>,
    pub dev_server_port: Option<u16>,
    pub prune: Option<bool>,
    pub backup_corrupt: Option<bool>,
}

impl FileConfig {
    /// Load from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parse from a TOML string
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}

/// Settings taken from environment variables (layer 3)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvOverrides {
    pub repository: Option<String>,
    pub branch: Option<String>,
    pub dev_server_host: Option<String>,
    pub dev_server_port: Option<String>,
}

impl EnvOverrides {
    /// Read overrides from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read overrides through `lookup`. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            repository: get(ENV_REPOSITORY),
            branch: get(ENV_BRANCH),
            dev_server_host: get(ENV_DEV_SERVER_HOST),
            dev_server_port: get(ENV_DEV_SERVER_PORT),
        }
    }

    fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Fully resolved configuration for one run
#[derive(Debug, Clone, Serialize)]
pub struct RegistryConfig {
    /// Directory scanned for artifacts
    pub upload_dir: PathBuf,

    /// Registry file to merge into
    pub registry_path: PathBuf,

    /// Download URL construction
    pub urls: UrlRule,

    /// Remove entries not produced by this scan
    pub prune: bool,

    /// Keep a copy of a corrupt registry file before overwriting it
    pub backup_corrupt: bool,

    /// Contributing layers in precedence order
    pub sources: Vec<ConfigSource>,
}

impl RegistryConfig {
    /// Merge defaults, an optional file layer and environment overrides.
    pub fn resolve(
        file: Option<FileConfig>,
        file_path: Option<&Path>,
        env: EnvOverrides,
    ) -> Result<Self, ConfigError> {
        let defaults = BuiltinDefaults::default();
        let mut sources = vec![ConfigSource {
            origin: ConfigOrigin::Builtin,
            path: None,
        }];

        let file = match file {
            Some(file) => {
                sources.push(ConfigSource {
                    origin: ConfigOrigin::File,
                    path: file_path.map(|p| p.display().to_string()),
                });
                file
            }
            None => FileConfig::default(),
        };
        if !env.is_empty() {
            sources.push(ConfigSource {
                origin: ConfigOrigin::Env,
                path: None,
            });
        }

        let repository = env
            .repository
            .or(file.repository)
            .unwrap_or(defaults.repository);
        let branch = env.branch.or(file.branch).unwrap_or(defaults.branch);

        let dev_host = env.dev_server_host.or(file.dev_server_host);
        let dev_port = match env.dev_server_port {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw.clone()))?,
            None => file.dev_server_port.unwrap_or(defaults.dev_server_port),
        };

        Ok(Self {
            upload_dir: file
                .upload_dir
                .unwrap_or_else(|| PathBuf::from(&defaults.upload_dir)),
            registry_path: file
                .registry_path
                .unwrap_or_else(|| PathBuf::from(&defaults.registry_path)),
            urls: UrlRule {
                repository: Repository::parse(&repository)?,
                branch,
                dev_server: dev_host.map(|host| DevServer {
                    host,
                    port: dev_port,
                }),
                publish_path: file.publish_path.unwrap_or(defaults.publish_path),
            },
            prune: file.prune.unwrap_or(false),
            backup_corrupt: file.backup_corrupt.unwrap_or(false),
            sources,
        })
    }

    /// Load the file layer (if any) and the process environment.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match config_path {
            Some(path) => Some(FileConfig::from_file(path)?),
            None => None,
        };
        Self::resolve(file, config_path, EnvOverrides::from_env())
    }

    /// Record that command-line flags overrode some values
    pub fn mark_cli_override(&mut self) {
        if !self.sources.iter().any(|s| s.origin == ConfigOrigin::Cli) {
            self.sources.push(ConfigSource {
                origin: ConfigOrigin::Cli,
                path: None,
            });
        }
    }
}
