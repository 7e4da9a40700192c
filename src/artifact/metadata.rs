//! Embedded metadata extraction from `.magic` archives.
//!
//! An artifact is a zip container. Somewhere inside it sits an entry whose
//! name ends with `metadata.json` (any directory, any case); its content is a
//! JSON object describing the artifact.

use serde_json::{Map, Value};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use zip::result::ZipError;
use zip::ZipArchive;

/// Suffix identifying the metadata entry (compared case-insensitively).
pub const METADATA_SUFFIX: &str = "metadata.json";

/// Largest metadata entry we are willing to parse (16 MiB).
pub const MAX_METADATA_BYTES: u64 = 16 * 1024 * 1024;

/// Errors reading embedded metadata. All of them are per-file and skippable.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("malformed archive: {0}")]
    MalformedArchive(#[from] ZipError),

    #[error("no entry ending in metadata.json found in archive")]
    NotFound,

    #[error("malformed metadata in '{entry}': {reason}")]
    MalformedMetadata { entry: String, reason: String },

    #[error("metadata entry '{entry}' is {size} bytes, limit is {limit}")]
    TooLarge { entry: String, size: u64, limit: u64 },
}

/// Metadata document found inside an artifact.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbeddedMetadata {
    /// Archive entry the document was read from
    pub entry_name: String,

    fields: Map<String, Value>,
}

impl EmbeddedMetadata {
    /// Wrap an already-parsed JSON object.
    pub fn from_map(entry_name: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            entry_name: entry_name.into(),
            fields,
        }
    }

    /// Raw value for a key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// First non-empty textual value among `keys`, in order.
    ///
    /// Numbers and booleans are rendered as text (`"version": 2.1` becomes
    /// `"2.1"`). Nulls, empty strings, arrays and objects are skipped.
    pub fn text(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| match self.fields.get(*key)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            v @ (Value::Number(_) | Value::Bool(_)) => {
                tracing::warn!(
                    entry = %self.entry_name,
                    key = *key,
                    value = %v,
                    "Non-string metadata value rendered as text"
                );
                Some(v.to_string())
            }
            _ => None,
        })
    }

    /// First non-empty string-or-sequence value among `keys`, normalized to a
    /// list of strings.
    ///
    /// A bare string becomes a one-element list. In a sequence, strings are
    /// kept, numbers and booleans are rendered as text and anything else is
    /// dropped. Returns an empty list when no key holds a usable value.
    pub fn string_list(&self, keys: &[&str]) -> Vec<String> {
        for key in keys {
            match self.fields.get(*key) {
                Some(Value::String(s)) if !s.is_empty() => return vec![s.clone()],
                Some(Value::Array(items)) if !items.is_empty() => {
                    return items
                        .iter()
                        .filter_map(|item| match item {
                            Value::String(s) => Some(s.clone()),
                            Value::Number(_) | Value::Bool(_) => Some(item.to_string()),
                            _ => None,
                        })
                        .collect();
                }
                _ => continue,
            }
        }
        Vec::new()
    }

    /// Object value for `key`, or an empty mapping.
    pub fn mapping(&self, key: &str) -> Map<String, Value> {
        match self.fields.get(key) {
            Some(Value::Object(map)) => map.clone(),
            _ => Map::new(),
        }
    }
}

/// Open an artifact archive and parse its embedded metadata document.
///
/// Only the first entry (in central-directory order) whose name ends with
/// [`METADATA_SUFFIX`] is read.
pub fn read_metadata(archive_path: &Path) -> Result<EmbeddedMetadata, MetadataError> {
    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(file)?;

    let index = find_metadata_entry(&archive).ok_or(MetadataError::NotFound)?;

    let entry = archive.by_index(index)?;
    let entry_name = entry.name().to_string();
    if entry.size() > MAX_METADATA_BYTES {
        return Err(MetadataError::TooLarge {
            entry: entry_name,
            size: entry.size(),
            limit: MAX_METADATA_BYTES,
        });
    }

    let mut bytes = Vec::new();
    entry
        .take(MAX_METADATA_BYTES + 1)
        .read_to_end(&mut bytes)
        .map_err(|e| MetadataError::MalformedArchive(ZipError::Io(e)))?;
    if bytes.len() as u64 > MAX_METADATA_BYTES {
        return Err(MetadataError::TooLarge {
            entry: entry_name,
            size: bytes.len() as u64,
            limit: MAX_METADATA_BYTES,
        });
    }

    parse_metadata(entry_name, &bytes)
}

/// Index of the first entry named `*metadata.json`.
///
/// Only names are inspected; other entries are never opened, so payloads
/// using compression methods this build cannot decode do not matter.
fn find_metadata_entry(archive: &ZipArchive<File>) -> Option<usize> {
    (0..archive.len()).find(|&i| {
        archive
            .name_for_index(i)
            .map(|name| !name.ends_with('/') && name.to_lowercase().ends_with(METADATA_SUFFIX))
            .unwrap_or(false)
    })
}

/// Parse a metadata document; it must be a JSON object.
pub fn parse_metadata(entry_name: String, bytes: &[u8]) -> Result<EmbeddedMetadata, MetadataError> {
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| MetadataError::MalformedMetadata {
            entry: entry_name.clone(),
            reason: e.to_string(),
        })?;

    match value {
        Value::Object(fields) => Ok(EmbeddedMetadata::from_map(entry_name, fields)),
        other => Err(MetadataError::MalformedMetadata {
            entry: entry_name,
            reason: format!("expected a JSON object, found {}", json_kind(&other)),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
