//! Naming rules for `.magic` artifacts.
//!
//! Artifacts are published as `<logical_name>_<build_id>.magic`. This crate
//! splits such a file name into its two tokens and maps the last character of
//! the build identifier to a release channel. Both operations are total: a
//! name that does not follow the pattern is simply not an artifact.

mod build_type;
mod filename;

pub use build_type::{classify_build_id, BuildType};
pub use filename::{parse_filename, FilenameToken, ARTIFACT_EXTENSION};
