//! Scan report
//!
//! Summarizes one catalog run: what was added or updated, what was skipped
//! and why, and where the registry was written.

use serde::Serialize;
use std::fmt;

use crate::config::ConfigSource;
use crate::registry::{EntryKey, Recovery, Upsert};

/// Why a candidate file produced no entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// Name does not follow `<name>_<build_id>.magic`
    UnexpectedName,

    /// Archive or embedded metadata could not be read
    Metadata(String),

    /// File could not be sized or hashed
    Io(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::UnexpectedName => f.write_str("unexpected file name"),
            SkipReason::Metadata(e) => write!(f, "{}", e),
            SkipReason::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

/// A candidate file that was skipped
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub file: String,
    pub reason: SkipReason,
}

/// A candidate file that produced a registry entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessedArtifact {
    pub file: String,
    pub name: String,
    pub version: String,
    pub build_type: String,
    pub action: Upsert,
}

/// Why a run finished without touching the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdleReason {
    /// The upload directory does not exist
    MissingDirectory,

    /// The upload directory holds no candidate files
    NoCandidates,
}

/// Result of a catalog run
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    /// Directory that was scanned
    pub upload_dir: String,

    /// Registry file location
    pub registry_path: String,

    /// Set when the registry was left untouched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idle: Option<IdleReason>,

    pub processed: Vec<ProcessedArtifact>,

    pub skipped: Vec<SkippedFile>,

    /// Entries removed by pruning
    pub pruned: Vec<EntryKey>,

    /// Set when previous registry content was discarded on load
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovery: Option<Recovery>,

    /// Copy of the discarded registry file, if one was made
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_path: Option<String>,

    /// Entries in the registry after the run
    pub total_entries: usize,

    /// Configuration layers that produced the settings for this run
    pub config_sources: Vec<ConfigSource>,
}

impl ScanReport {
    pub(crate) fn new(upload_dir: String, registry_path: String) -> Self {
        Self {
            upload_dir,
            registry_path,
            idle: None,
            processed: Vec::new(),
            skipped: Vec::new(),
            pruned: Vec::new(),
            recovery: None,
            backup_path: None,
            total_entries: 0,
            config_sources: Vec::new(),
        }
    }

    /// Whether the registry file was written
    pub fn registry_written(&self) -> bool {
        self.idle.is_none()
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Format for terminal output
    pub fn to_human(&self) -> String {
        let mut lines = Vec::new();

        match self.idle {
            Some(IdleReason::MissingDirectory) => {
                lines.push(format!("{} does not exist, nothing to do.", self.upload_dir));
                return lines.join("\n");
            }
            Some(IdleReason::NoCandidates) => {
                lines.push(format!("No artifacts in {}, nothing to do.", self.upload_dir));
                return lines.join("\n");
            }
            None => {}
        }

        if let Some(ref recovery) = self.recovery {
            let detail = match recovery {
                Recovery::Empty => "file was empty".to_string(),
                Recovery::Corrupt(e) => format!("invalid JSON: {}", e),
                Recovery::Unreadable(e) => format!("unreadable: {}", e),
            };
            lines.push(format!("Warning: started a new registry ({})", detail));
        }
        if let Some(ref backup) = self.backup_path {
            lines.push(format!("  Previous registry saved to {}", backup));
        }

        for skipped in &self.skipped {
            lines.push(format!("Skipped {}: {}", skipped.file, skipped.reason));
        }
        for p in &self.processed {
            let verb = match p.action {
                Upsert::Added => "Added",
                Upsert::Updated => "Updated",
            };
            lines.push(format!("{}: {} {} ({})", verb, p.name, p.version, p.build_type));
        }
        for key in &self.pruned {
            lines.push(format!("Pruned: {} {}", key.name, key.version));
        }

        lines.push(format!(
            "Wrote {} ({} processed, {} skipped, {} entries)",
            self.registry_path,
            self.processed.len(),
            self.skipped.len(),
            self.total_entries
        ));

        lines.join("\n")
    }
}
