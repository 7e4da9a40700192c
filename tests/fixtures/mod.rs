//! Shared helpers for building upload directories of `.magic` archives.

#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use magic_registry::config::{EnvOverrides, RegistryConfig};
use magic_registry::CatalogBuilder;
use serde_json::Value;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Write a zip archive with the given `(entry name, content)` pairs.
pub fn write_archive(path: &Path, entries: &[(&str, &[u8])]) {
    let file = File::create(path).unwrap();
    let mut zip = ZipWriter::new(file);
    for (name, data) in entries {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap();
}

/// A temporary workspace with `magic/upload/` and `magic/manifest.json`.
pub struct Workspace {
    pub root: TempDir,
}

impl Workspace {
    /// New workspace with an existing, empty upload directory
    pub fn new() -> Self {
        let ws = Self::without_upload_dir();
        fs::create_dir_all(ws.upload_dir()).unwrap();
        ws
    }

    /// New workspace where the upload directory does not exist
    pub fn without_upload_dir() -> Self {
        Self {
            root: TempDir::new().unwrap(),
        }
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.root.path().join("magic/upload")
    }

    pub fn registry_path(&self) -> PathBuf {
        self.root.path().join("magic/manifest.json")
    }

    /// Add an artifact whose archive holds `metadata.json` with `metadata`
    /// plus a payload entry.
    pub fn add_artifact(&self, file_name: &str, metadata: &Value) -> PathBuf {
        let path = self.upload_dir().join(file_name);
        let json = serde_json::to_vec(metadata).unwrap();
        write_archive(
            &path,
            &[
                ("model/weights.bin", b"\x00\x01\x02\x03"),
                ("model/metadata.json", &json),
            ],
        );
        path
    }

    /// Add a file with raw bytes in the upload directory
    pub fn add_raw(&self, file_name: &str, data: &[u8]) -> PathBuf {
        let path = self.upload_dir().join(file_name);
        fs::write(&path, data).unwrap();
        path
    }

    pub fn config(&self) -> RegistryConfig {
        let mut config = RegistryConfig::resolve(None, None, EnvOverrides::default()).unwrap();
        config.upload_dir = self.upload_dir();
        config.registry_path = self.registry_path();
        config
    }

    /// Builder over this workspace with a fixed "today"
    pub fn builder(&self) -> CatalogBuilder {
        self.builder_with(self.config())
    }

    pub fn builder_with(&self, config: RegistryConfig) -> CatalogBuilder {
        CatalogBuilder::new(config).with_today(NaiveDate::from_ymd_opt(2024, 5, 17).unwrap())
    }

    /// Parsed registry file
    pub fn registry_json(&self) -> Value {
        let content = fs::read_to_string(self.registry_path()).unwrap();
        serde_json::from_str(&content).unwrap()
    }

    /// `models` array of the registry file
    pub fn models(&self) -> Vec<Value> {
        self.registry_json()["models"].as_array().unwrap().clone()
    }
}
