//! Built-in defaults (layer 1)
//!
//! Hardcoded defaults for all configuration values.

use serde::{Deserialize, Serialize};

/// Environment variable holding `owner/name` of the hosting repository
pub const ENV_REPOSITORY: &str = "GITHUB_REPOSITORY";

/// Environment variable holding the branch artifacts are served from
pub const ENV_BRANCH: &str = "DEFAULT_BRANCH";

/// Environment variable enabling the development server URL rule
pub const ENV_DEV_SERVER_HOST: &str = "DEV_SERVER_IP";

/// Environment variable overriding the development server port
pub const ENV_DEV_SERVER_PORT: &str = "DEV_SERVER_PORT";

/// Config file picked up from the working directory when present
pub const DEFAULT_CONFIG_FILE: &str = "magic-registry.toml";

/// Built-in default configuration values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinDefaults {
    /// Directory scanned for artifacts (default: "magic/upload")
    pub upload_dir: String,

    /// Registry file (default: "magic/manifest.json")
    pub registry_path: String,

    /// Path of the upload directory in download URLs (default: "magic/upload")
    pub publish_path: String,

    /// Repository identity (default: "owner/repo")
    pub repository: String,

    /// Branch served by the raw content host (default: "main")
    pub branch: String,

    /// Development server port (default: 8000)
    pub dev_server_port: u16,
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self {
            upload_dir: "magic/upload".to_string(),
            registry_path: "magic/manifest.json".to_string(),
            publish_path: "magic/upload".to_string(),
            repository: "owner/repo".to_string(),
            branch: "main".to_string(),
            dev_server_port: 8000,
        }
    }
}
