//! Catalog builder
//!
//! Drives one scan: discover candidates, turn each into a registry entry,
//! upsert, save once.

use chrono::{NaiveDate, Utc};
use magic_classifier::{classify_build_id, parse_filename, BuildType, FilenameToken};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use super::discover::discover_candidates;
use super::report::{IdleReason, ProcessedArtifact, ScanReport, SkipReason, SkippedFile};
use super::CatalogError;
use crate::artifact::{read_metadata, sha256_file, EmbeddedMetadata};
use crate::config::RegistryConfig;
use crate::registry::{Recovery, RegistryEntry, RegistryStore, UNKNOWN};

/// Metadata keys consulted for each entry field, in priority order.
const NAME_KEYS: &[&str] = &["name"];
const VERSION_KEYS: &[&str] = &["version"];
const AUTHOR_KEYS: &[&str] = &["author"];
const DATE_KEYS: &[&str] = &["date_created"];
const COMPAT_KEYS: &[&str] = &["compatible_versions", "compat"];
const PARAMETERS_KEY: &str = "parameters";

/// Builds registry entries from an upload directory and merges them into the
/// registry file.
#[derive(Debug, Clone)]
pub struct CatalogBuilder {
    config: RegistryConfig,

    /// Date used when metadata has no `date_created`
    today: NaiveDate,
}

impl CatalogBuilder {
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            config,
            today: Utc::now().date_naive(),
        }
    }

    /// Fix the date used for defaulted `date_created` values
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Run one scan over the upload directory.
    ///
    /// Per-file problems are recorded in the report and never abort the run.
    /// The registry is written exactly once, and only when at least one
    /// candidate file exists.
    pub fn run(&self) -> Result<ScanReport, CatalogError> {
        let upload_dir = &self.config.upload_dir;
        let store = RegistryStore::new(&self.config.registry_path);
        let mut report = ScanReport::new(
            upload_dir.display().to_string(),
            store.path().display().to_string(),
        );
        report.config_sources = self.config.sources.clone();

        if !upload_dir.is_dir() {
            tracing::info!(dir = %upload_dir.display(), "Upload directory missing, nothing to do");
            report.idle = Some(IdleReason::MissingDirectory);
            return Ok(report);
        }

        let candidates = discover_candidates(upload_dir)?;
        if candidates.is_empty() {
            tracing::info!(dir = %upload_dir.display(), "No candidate artifacts, nothing to do");
            report.idle = Some(IdleReason::NoCandidates);
            return Ok(report);
        }

        let loaded = store.load();
        let mut registry = loaded.registry;
        report.recovery = loaded.recovery;

        let mut seen = HashSet::new();
        for path in &candidates {
            let file = display_name(path);
            match self.process_file(path) {
                Ok((entry, build_type)) => {
                    tracing::info!(
                        name = %entry.name,
                        version = %entry.version,
                        build_type = %build_type,
                        "Added/updated registry entry"
                    );
                    seen.insert(entry.key());
                    let processed = ProcessedArtifact {
                        file,
                        name: entry.name.clone(),
                        version: entry.version.clone(),
                        build_type: build_type.to_string(),
                        action: registry.upsert(entry),
                    };
                    report.processed.push(processed);
                }
                Err(reason) => {
                    tracing::warn!(file = %file, reason = %reason, "Skipping artifact");
                    report.skipped.push(SkippedFile { file, reason });
                }
            }
        }

        if self.config.prune {
            report.pruned = registry.retain_keys(&seen);
            for key in &report.pruned {
                tracing::info!(name = %key.name, version = %key.version, "Pruned stale entry");
            }
        }

        if self.config.backup_corrupt && matches!(report.recovery, Some(Recovery::Corrupt(_))) {
            let backup = store.backup_corrupt()?;
            tracing::warn!(backup = %backup.display(), "Saved corrupt registry before overwriting");
            report.backup_path = Some(backup.display().to_string());
        }

        store.save(&mut registry)?;
        report.total_entries = registry.len();
        tracing::info!(
            path = %store.path().display(),
            entries = registry.len(),
            "Registry written"
        );

        Ok(report)
    }

    /// Produce the registry entry for one candidate file.
    pub fn process_file(&self, path: &Path) -> Result<(RegistryEntry, BuildType), SkipReason> {
        let token = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(parse_filename)
            .ok_or(SkipReason::UnexpectedName)?;
        tracing::debug!(
            file = %path.display(),
            name = %token.logical_name,
            build_id = %token.build_id,
            "Parsed artifact file name"
        );

        let metadata = read_metadata(path).map_err(|e| SkipReason::Metadata(e.to_string()))?;

        let size_bytes = fs::metadata(path)
            .map_err(|e| SkipReason::Io(e.to_string()))?
            .len();
        let sha256 = sha256_file(path).map_err(|e| SkipReason::Io(e.to_string()))?;

        let file_name = display_name(path);
        Ok(self.assemble_entry(&file_name, &token, &metadata, size_bytes, sha256))
    }

    /// Combine file name tokens, metadata and file facts into an entry.
    ///
    /// Empty metadata strings count as absent, so `"author": ""` yields
    /// `"unknown"` and an empty `date_created` yields today's date.
    pub fn assemble_entry(
        &self,
        file_name: &str,
        token: &FilenameToken,
        metadata: &EmbeddedMetadata,
        size_bytes: u64,
        sha256: String,
    ) -> (RegistryEntry, BuildType) {
        let name = metadata
            .text(NAME_KEYS)
            .unwrap_or_else(|| token.logical_name.clone());
        if name != token.logical_name {
            tracing::warn!(
                file = %file_name,
                filename = %token.logical_name,
                metadata = %name,
                "Name mismatch between file name and metadata"
            );
        }

        let build_type = classify_build_id(&token.build_id);

        let entry = RegistryEntry {
            name,
            version: metadata
                .text(VERSION_KEYS)
                .unwrap_or_else(|| UNKNOWN.to_string()),
            author: metadata
                .text(AUTHOR_KEYS)
                .unwrap_or_else(|| UNKNOWN.to_string()),
            date_created: metadata
                .text(DATE_KEYS)
                .unwrap_or_else(|| self.today.format("%Y-%m-%d").to_string()),
            parameters: metadata.mapping(PARAMETERS_KEY),
            compatible_versions: metadata.string_list(COMPAT_KEYS),
            size_bytes,
            sha256,
            download_url: self.config.urls.download_url(file_name),
            build_id: token.build_id.clone(),
            build_type: build_type.to_string(),
            extra: Default::default(),
        };

        (entry, build_type)
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
