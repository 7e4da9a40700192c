//! Download URL construction
//!
//! Artifacts are served either from a development server
//! (`http://<host>:<port>/<path>/<file>`) or from the repository's raw
//! content host (`https://raw.githubusercontent.com/<owner>/<repo>/<branch>/<path>/<file>`).

use serde::Serialize;
use std::fmt;

use super::ConfigError;

/// Raw content host for published artifacts
pub const RAW_CONTENT_BASE: &str = "https://raw.githubusercontent.com";

/// `owner/name` identity of the hosting repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Repository {
    pub owner: String,
    pub name: String,
}

impl Repository {
    /// Parse `owner/name`. Segments after the second are ignored.
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        let mut parts = value.split('/');
        match (parts.next(), parts.next()) {
            (Some(owner), Some(name)) if !owner.is_empty() && !name.is_empty() => Ok(Self {
                owner: owner.to_string(),
                name: name.to_string(),
            }),
            _ => Err(ConfigError::InvalidRepository(value.to_string())),
        }
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Local development server serving the upload directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DevServer {
    pub host: String,
    pub port: u16,
}

/// Rule producing the `download_url` of a registry entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrlRule {
    pub repository: Repository,
    pub branch: String,

    /// Takes precedence over the repository when set
    pub dev_server: Option<DevServer>,

    /// Path of the upload directory relative to the served root
    pub publish_path: String,
}

impl UrlRule {
    /// URL under which `file_name` is downloadable
    pub fn download_url(&self, file_name: &str) -> String {
        let path = self.publish_path.trim_matches('/');
        match &self.dev_server {
            Some(dev) => format!("http://{}:{}/{}/{}", dev.host, dev.port, path, file_name),
            None => format!(
                "{}/{}/{}/{}/{}/{}",
                RAW_CONTENT_BASE,
                self.repository.owner,
                self.repository.name,
                self.branch,
                path,
                file_name
            ),
        }
    }
}
