//! Release channel classification from build identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Release channel encoded by the last character of a build identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildType {
    Stable,
    Rc,
    Beta,
    Alpha,
    Debug,
    Unknown,
}

impl BuildType {
    /// Channel label as written to the registry.
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildType::Stable => "stable",
            BuildType::Rc => "rc",
            BuildType::Beta => "beta",
            BuildType::Alpha => "alpha",
            BuildType::Debug => "debug",
            BuildType::Unknown => "unknown",
        }
    }

    fn from_code(code: char) -> Self {
        match code {
            'A' => BuildType::Stable,
            'B' => BuildType::Rc,
            'C' => BuildType::Beta,
            'D' => BuildType::Alpha,
            'F' => BuildType::Debug,
            _ => BuildType::Unknown,
        }
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a build identifier by its final character (case-insensitive).
///
/// Never fails: an empty identifier or an unmapped letter yields
/// [`BuildType::Unknown`].
pub fn classify_build_id(build_id: &str) -> BuildType {
    build_id
        .chars()
        .last()
        .map(|c| BuildType::from_code(c.to_ascii_uppercase()))
        .unwrap_or(BuildType::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_table() {
        assert_eq!(classify_build_id("1A"), BuildType::Stable);
        assert_eq!(classify_build_id("X7B"), BuildType::Rc);
        assert_eq!(classify_build_id("9C"), BuildType::Beta);
        assert_eq!(classify_build_id("9D"), BuildType::Alpha);
        assert_eq!(classify_build_id("0F"), BuildType::Debug);
    }

    #[test]
    fn test_lowercase_suffix() {
        assert_eq!(classify_build_id("12b"), BuildType::Rc);
        assert_eq!(classify_build_id("12f"), BuildType::Debug);
    }

    #[test]
    fn test_unmapped_and_empty() {
        assert_eq!(classify_build_id("12E"), BuildType::Unknown);
        assert_eq!(classify_build_id("123"), BuildType::Unknown);
        assert_eq!(classify_build_id(""), BuildType::Unknown);
    }

    #[test]
    fn test_serialized_label() {
        let json = serde_json::to_string(&BuildType::Rc).unwrap();
        assert_eq!(json, "\"rc\"");
        assert_eq!(BuildType::Unknown.to_string(), "unknown");
    }
}
