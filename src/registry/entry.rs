//! Registry entry (one element of `models` in manifest.json)

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default for author and version when metadata does not provide them.
pub const UNKNOWN: &str = "unknown";

/// Identity key of a registry entry: `(name, version)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EntryKey {
    pub name: String,
    pub version: String,
}

impl EntryKey {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// A single published artifact version.
///
/// Entries are replaced wholesale on upsert; fields are never merged.
/// Keys unknown to this tool (added by hand to the manifest) are kept in
/// `extra` so that a load/save cycle does not drop them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryEntry {
    /// Model name (metadata `name`, else the file name's logical name)
    #[serde(default)]
    pub name: String,

    /// Model version (metadata `version`, else "unknown")
    #[serde(default)]
    pub version: String,

    #[serde(default = "default_unknown")]
    pub author: String,

    /// ISO date (YYYY-MM-DD)
    #[serde(default)]
    pub date_created: String,

    #[serde(default)]
    pub parameters: Map<String, Value>,

    #[serde(default)]
    pub compatible_versions: Vec<String>,

    /// Exact size of the artifact file
    #[serde(default)]
    pub size_bytes: u64,

    /// Hex SHA-256 of the artifact file
    #[serde(default)]
    pub sha256: String,

    #[serde(default)]
    pub download_url: String,

    #[serde(default)]
    pub build_id: String,

    /// Release channel label (stable, rc, beta, alpha, debug, unknown)
    #[serde(default = "default_unknown")]
    pub build_type: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_unknown() -> String {
    UNKNOWN.to_string()
}

impl RegistryEntry {
    /// Identity key of this entry.
    pub fn key(&self) -> EntryKey {
        EntryKey::new(self.name.clone(), self.version.clone())
    }

    /// Whether this entry has the given identity.
    pub fn has_key(&self, name: &str, version: &str) -> bool {
        self.name == name && self.version == version
    }
}
