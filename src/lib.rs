//! Magic Registry - model registry maintenance for `.magic` artifacts
//!
//! Scans an upload directory of `.magic` archives, reads the metadata each
//! one embeds, hashes it, and merges one entry per `(name, version)` into a
//! sorted JSON registry (`{"models": [...]}`).

pub mod artifact;
pub mod catalog;
pub mod config;
pub mod registry;

pub use artifact::{read_metadata, sha256_file, EmbeddedMetadata, MetadataError};
pub use catalog::{CatalogBuilder, CatalogError, ScanReport};
pub use config::{ConfigError, RegistryConfig};
pub use magic_classifier::{classify_build_id, parse_filename, BuildType, FilenameToken};
pub use registry::{Registry, RegistryEntry, RegistryStore};
