//! Run configuration
//!
//! Layers, later wins:
//! 1. Built-in defaults
//! 2. Optional TOML file (`magic-registry.toml` or `--config`)
//! 3. Environment (`GITHUB_REPOSITORY`, `DEFAULT_BRANCH`, `DEV_SERVER_IP`, `DEV_SERVER_PORT`)
//! 4. CLI flags

mod defaults;
mod effective;
mod url;

pub use defaults::{
    BuiltinDefaults, DEFAULT_CONFIG_FILE, ENV_BRANCH, ENV_DEV_SERVER_HOST, ENV_DEV_SERVER_PORT,
    ENV_REPOSITORY,
};
pub use effective::{
    ConfigError, ConfigOrigin, ConfigSource, EnvOverrides, FileConfig, RegistryConfig,
};
pub use url::{DevServer, Repository, UrlRule, RAW_CONTENT_BASE};
