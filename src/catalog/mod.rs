//! Catalog building
//!
//! ```text
//! upload dir ──► discover ──► parse file name ──► read metadata
//!                                                      │
//!         registry ◄── upsert ◄── assemble entry ◄── size + sha256
//!            │
//!            ▼
//!      manifest.json (saved once)
//! ```

mod builder;
mod discover;
mod report;

pub use builder::CatalogBuilder;
pub use discover::discover_candidates;
pub use report::{IdleReason, ProcessedArtifact, ScanReport, SkipReason, SkippedFile};

use crate::registry::RegistryError;

/// Errors that abort a catalog run
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to list upload directory: {0}")]
    Discovery(#[from] walkdir::Error),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
}
