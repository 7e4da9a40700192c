//! Registry persistence (manifest.json)
//!
//! Loading never fails: a missing, empty, corrupt or unreadable file yields
//! an empty registry plus a [`Recovery`] describing what was discarded.
//! Saving re-sorts every entry and replaces the file through a rename.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::entry::{EntryKey, RegistryEntry};

/// Suffix appended to the registry path when backing up a corrupt file.
pub const CORRUPT_BACKUP_SUFFIX: &str = "corrupt";

/// Errors from saving the registry. These are fatal for a run.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why a load fell back to an empty registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum Recovery {
    /// File exists but holds only whitespace
    Empty,

    /// File content is not a valid registry document
    Corrupt(String),

    /// File could not be read
    Unreadable(String),
}

/// Result of [`RegistryStore::load`].
#[derive(Debug, Clone, Default)]
pub struct Loaded {
    pub registry: Registry,

    /// Set when prior content was discarded
    pub recovery: Option<Recovery>,

    /// Entries dropped because they could not be interpreted
    pub dropped_entries: usize,
}

/// Outcome of [`Registry::upsert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Upsert {
    Added,
    Updated,
}

/// In-memory catalog: at most one entry per `(name, version)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Registry {
    models: Vec<RegistryEntry>,
}

#[derive(Serialize)]
struct RegistryDocumentRef<'a> {
    models: &'a [RegistryEntry],
}

#[derive(Deserialize)]
struct RawRegistryDocument {
    models: Vec<Value>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries in their current order
    pub fn entries(&self) -> &[RegistryEntry] {
        &self.models
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Look up an entry by identity key
    pub fn get(&self, name: &str, version: &str) -> Option<&RegistryEntry> {
        self.models.iter().find(|m| m.has_key(name, version))
    }

    /// Insert `entry`, replacing any entry with the same `(name, version)`
    /// in place.
    pub fn upsert(&mut self, entry: RegistryEntry) -> Upsert {
        match self
            .models
            .iter_mut()
            .find(|m| m.has_key(&entry.name, &entry.version))
        {
            Some(existing) => {
                *existing = entry;
                Upsert::Updated
            }
            None => {
                self.models.push(entry);
                Upsert::Added
            }
        }
    }

    /// Drop every entry whose key is not in `keep`. Returns the removed keys.
    pub fn retain_keys(&mut self, keep: &HashSet<EntryKey>) -> Vec<EntryKey> {
        let mut removed = Vec::new();
        self.models.retain(|m| {
            let key = m.key();
            if keep.contains(&key) {
                true
            } else {
                removed.push(key);
                false
            }
        });
        removed
    }

    /// Sort ascending by `(name, version)`
    pub fn sort(&mut self) {
        self.models.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then_with(|| a.version.cmp(&b.version))
        });
    }

    /// Serialize as `{"models": [...]}` with two-space indentation
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&RegistryDocumentRef {
            models: &self.models,
        })
    }

    /// Parse a registry document.
    ///
    /// Entries that cannot be interpreted are dropped; their count is
    /// returned alongside the registry. Repeated `(name, version)` keys
    /// collapse to the last occurrence.
    pub fn from_json(json: &str) -> Result<(Self, usize), serde_json::Error> {
        let raw: RawRegistryDocument = serde_json::from_str(json)?;
        let mut registry = Self {
            models: Vec::with_capacity(raw.models.len()),
        };
        let mut dropped = 0;

        for (index, value) in raw.models.into_iter().enumerate() {
            match serde_json::from_value::<RegistryEntry>(value) {
                Ok(entry) => {
                    let (name, version) = (entry.name.clone(), entry.version.clone());
                    if registry.upsert(entry) == Upsert::Updated {
                        tracing::warn!(
                            index,
                            name = %name,
                            version = %version,
                            "Duplicate registry entry, keeping the last one"
                        );
                    }
                }
                Err(e) => {
                    tracing::warn!(index, error = %e, "Dropping unreadable registry entry");
                    dropped += 1;
                }
            }
        }

        Ok((registry, dropped))
    }
}

/// Loads and saves the registry file.
#[derive(Debug, Clone)]
pub struct RegistryStore {
    path: PathBuf,
}

impl RegistryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Registry file location
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Location used by [`RegistryStore::backup_corrupt`]
    pub fn backup_path(&self) -> PathBuf {
        sibling_with_suffix(&self.path, CORRUPT_BACKUP_SUFFIX)
    }

    /// Load the registry, degrading to an empty one on any problem.
    pub fn load(&self) -> Loaded {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Loaded::default(),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Cannot read registry, starting from an empty one"
                );
                return recovered(Recovery::Unreadable(e.to_string()));
            }
        };

        let content = match String::from_utf8(bytes) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Registry file is not UTF-8, starting from an empty one"
                );
                return recovered(Recovery::Corrupt(e.to_string()));
            }
        };

        if content.trim().is_empty() {
            tracing::warn!(
                path = %self.path.display(),
                "Registry file is empty, starting from an empty one"
            );
            return recovered(Recovery::Empty);
        }

        match Registry::from_json(&content) {
            Ok((registry, dropped_entries)) => Loaded {
                registry,
                recovery: None,
                dropped_entries,
            },
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Registry file is not a valid registry, starting from an empty one"
                );
                recovered(Recovery::Corrupt(e.to_string()))
            }
        }
    }

    /// Sort `registry` and write it, creating parent directories as needed.
    ///
    /// Content goes to a sibling temporary file first and is renamed over the
    /// destination, so a crash mid-write leaves the previous file intact.
    pub fn save(&self, registry: &mut Registry) -> Result<(), RegistryError> {
        registry.sort();
        let json = registry.to_json()?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp_path = sibling_with_suffix(&self.path, "tmp");
        let written = fs::write(&tmp_path, json).and_then(|_| fs::rename(&tmp_path, &self.path));
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }
        Ok(())
    }

    /// Copy the current (corrupt) registry file next to itself.
    pub fn backup_corrupt(&self) -> Result<PathBuf, RegistryError> {
        let backup = self.backup_path();
        fs::copy(&self.path, &backup)?;
        Ok(backup)
    }
}

fn recovered(recovery: Recovery) -> Loaded {
    Loaded {
        registry: Registry::new(),
        recovery: Some(recovery),
        dropped_entries: 0,
    }
}

fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};
    use tempfile::TempDir;

    fn entry(name: &str, version: &str, author: &str) -> RegistryEntry {
        RegistryEntry {
            name: name.to_string(),
            version: version.to_string(),
            author: author.to_string(),
            date_created: "2024-01-01".to_string(),
            parameters: Map::new(),
            compatible_versions: Vec::new(),
            size_bytes: 1,
            sha256: "00".repeat(32),
            download_url: String::new(),
            build_id: "1A".to_string(),
            build_type: "stable".to_string(),
            extra: Map::new(),
        }
    }

    #[test]
    fn test_upsert_appends_new_keys() {
        let mut registry = Registry::new();
        assert_eq!(registry.upsert(entry("a", "1", "x")), Upsert::Added);
        assert_eq!(registry.upsert(entry("a", "2", "x")), Upsert::Added);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_upsert_replaces_whole_entry() {
        let mut registry = Registry::new();
        let mut first = entry("a", "1", "old-author");
        first.compatible_versions = vec!["0.9".to_string()];
        first.extra.insert("note".to_string(), json!("hand-written"));
        registry.upsert(first);

        let replacement = entry("a", "1", "new-author");
        assert_eq!(registry.upsert(replacement.clone()), Upsert::Updated);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("a", "1"), Some(&replacement));
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let mut registry = Registry::new();
        registry.upsert(entry("b", "1", "x"));
        registry.upsert(entry("a", "1", "x"));
        registry.upsert(entry("b", "1", "y"));

        let names: Vec<_> = registry.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn test_sort_by_name_then_version() {
        let mut registry = Registry::new();
        registry.upsert(entry("beta", "1.0", "x"));
        registry.upsert(entry("alpha", "2.0", "x"));
        registry.upsert(entry("alpha", "10.0", "x"));
        registry.sort();

        let keys: Vec<_> = registry
            .entries()
            .iter()
            .map(|e| (e.name.as_str(), e.version.as_str()))
            .collect();
        // Lexicographic, not semantic: "10.0" < "2.0"
        assert_eq!(keys, vec![("alpha", "10.0"), ("alpha", "2.0"), ("beta", "1.0")]);
    }

    #[test]
    fn test_retain_keys() {
        let mut registry = Registry::new();
        registry.upsert(entry("a", "1", "x"));
        registry.upsert(entry("b", "1", "x"));

        let keep: HashSet<_> = [EntryKey::new("a", "1")].into_iter().collect();
        let removed = registry.retain_keys(&keep);

        assert_eq!(removed, vec![EntryKey::new("b", "1")]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let loaded = RegistryStore::new(dir.path().join("manifest.json")).load();
        assert!(loaded.registry.is_empty());
        assert_eq!(loaded.recovery, None);
    }

    #[test]
    fn test_load_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("manifest.json");
        fs::write(&path, "  \n\t").unwrap();

        let loaded = RegistryStore::new(&path).load();
        assert!(loaded.registry.is_empty());
        assert_eq!(loaded.recovery, Some(Recovery::Empty));
    }

    #[test]
    fn test_load_truly_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("manifest.json");
        fs::write(&path, "").unwrap();

        let loaded = RegistryStore::new(&path).load();
        assert!(loaded.registry.is_empty());
        assert_eq!(loaded.recovery, Some(Recovery::Empty));
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("manifest.json");
        fs::write(&path, "{not json").unwrap();

        let loaded = RegistryStore::new(&path).load();
        assert!(loaded.registry.is_empty());
        assert!(matches!(loaded.recovery, Some(Recovery::Corrupt(_))));
    }

    #[test]
    fn test_load_wrong_shape() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("manifest.json");
        fs::write(&path, "[1, 2, 3]").unwrap();

        let loaded = RegistryStore::new(&path).load();
        assert!(loaded.registry.is_empty());
        assert!(matches!(loaded.recovery, Some(Recovery::Corrupt(_))));
    }

    #[test]
    fn test_load_non_utf8_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("manifest.json");
        fs::write(&path, b"{\"models\": [\xff\xfe]}").unwrap();

        let loaded = RegistryStore::new(&path).load();
        assert!(loaded.registry.is_empty());
        assert!(matches!(loaded.recovery, Some(Recovery::Corrupt(_))));
    }

    #[test]
    fn test_load_duplicate_keys_keep_last() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("manifest.json");
        fs::write(
            &path,
            r#"{"models": [
                {"name": "a", "version": "1", "author": "first"},
                {"name": "b", "version": "1"},
                {"name": "a", "version": "1", "author": "second"}
            ]}"#,
        )
        .unwrap();

        let loaded = RegistryStore::new(&path).load();
        assert_eq!(loaded.registry.len(), 2);
        assert_eq!(loaded.registry.get("a", "1").unwrap().author, "second");
        assert_eq!(loaded.dropped_entries, 0);
    }

    #[test]
    fn test_load_directory_is_unreadable() {
        let dir = TempDir::new().unwrap();
        let loaded = RegistryStore::new(dir.path()).load();
        assert!(loaded.registry.is_empty());
        assert!(matches!(loaded.recovery, Some(Recovery::Unreadable(_))));
    }

    #[test]
    fn test_load_drops_bad_entries_only() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("manifest.json");
        fs::write(
            &path,
            r#"{"models": [{"name": "a", "version": "1"}, {"name": "b", "size_bytes": -4}]}"#,
        )
        .unwrap();

        let loaded = RegistryStore::new(&path).load();
        assert_eq!(loaded.registry.len(), 1);
        assert_eq!(loaded.dropped_entries, 1);
        assert_eq!(loaded.recovery, None);
    }

    #[test]
    fn test_save_creates_parent_and_sorts() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("magic/manifest.json");
        let store = RegistryStore::new(&path);

        let mut registry = Registry::new();
        registry.upsert(entry("b", "1", "x"));
        registry.upsert(entry("a", "1", "x"));
        store.save(&mut registry).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("{\n  \"models\": [\n    {"));

        let loaded = store.load();
        let names: Vec<_> = loaded.registry.entries().iter().map(|e| e.name.clone()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(!dir.path().join("magic/manifest.json.tmp").exists());
    }

    #[test]
    fn test_save_is_byte_stable() {
        let dir = TempDir::new().unwrap();
        let store = RegistryStore::new(dir.path().join("manifest.json"));

        let mut registry = Registry::new();
        registry.upsert(entry("a", "1", "Zoë"));
        store.save(&mut registry).unwrap();
        let first = fs::read(store.path()).unwrap();

        let mut reloaded = store.load().registry;
        store.save(&mut reloaded).unwrap();
        let second = fs::read(store.path()).unwrap();

        assert_eq!(first, second);
        // Non-ASCII is written verbatim, not escaped
        assert!(String::from_utf8(second).unwrap().contains("Zoë"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_save_failure_removes_tmp() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("manifest.json");
        fs::write(&path, "previous").unwrap();

        // Writes through this link fail with ENOSPC after the file is opened
        let tmp = dir.path().join("manifest.json.tmp");
        std::os::unix::fs::symlink("/dev/full", &tmp).unwrap();

        let mut registry = Registry::new();
        registry.upsert(entry("a", "1", "x"));
        assert!(RegistryStore::new(&path).save(&mut registry).is_err());

        assert!(fs::symlink_metadata(&tmp).is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "previous");
    }

    #[test]
    fn test_backup_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("manifest.json");
        fs::write(&path, "{not json").unwrap();

        let store = RegistryStore::new(&path);
        let backup = store.backup_corrupt().unwrap();

        assert_eq!(backup, dir.path().join("manifest.json.corrupt"));
        assert_eq!(fs::read_to_string(backup).unwrap(), "{not json");
    }
}
