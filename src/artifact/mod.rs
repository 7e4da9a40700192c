//! Artifact inspection
//!
//! Content checksums and embedded metadata for `.magic` archives.

mod checksum;
mod metadata;

pub use checksum::{sha256_bytes, sha256_file, CHUNK_SIZE};
pub use metadata::{
    parse_metadata, read_metadata, EmbeddedMetadata, MetadataError, MAX_METADATA_BYTES,
    METADATA_SUFFIX,
};
