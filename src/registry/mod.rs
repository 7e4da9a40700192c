//! Model registry
//!
//! The registry is a single JSON document, `{"models": [...]}`, holding one
//! entry per `(name, version)`, sorted by that key on every save.

mod entry;
mod store;

pub use entry::{EntryKey, RegistryEntry, UNKNOWN};
pub use store::{
    Loaded, Recovery, Registry, RegistryError, RegistryStore, Upsert, CORRUPT_BACKUP_SUFFIX,
};
