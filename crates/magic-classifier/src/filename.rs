//! Artifact file name parsing.

use std::sync::OnceLock;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};

/// Extension carried by every artifact file (without the dot).
pub const ARTIFACT_EXTENSION: &str = "magic";

/// Tokens extracted from an artifact file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilenameToken {
    /// Logical artifact name (never contains an underscore).
    pub logical_name: String,

    /// Opaque alphanumeric build identifier.
    pub build_id: String,
}

fn filename_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let pattern = format!(
            r"^(?P<name>[^_]+)_(?P<build_id>[A-Za-z0-9]+)\.{}$",
            regex_lite::escape(ARTIFACT_EXTENSION)
        );
        Regex::new(&pattern).expect("artifact filename pattern is valid")
    })
}

/// Split `<logical_name>_<build_id>.magic` into its tokens.
///
/// Returns `None` when the name does not follow the pattern. Matching is
/// case-sensitive, so `model_A1.MAGIC` is not an artifact.
pub fn parse_filename(file_name: &str) -> Option<FilenameToken> {
    let caps = filename_regex().captures(file_name)?;
    Some(FilenameToken {
        logical_name: caps.name("name")?.as_str().to_string(),
        build_id: caps.name("build_id")?.as_str().to_string(),
    })
}
