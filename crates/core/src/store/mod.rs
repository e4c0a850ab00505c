//! Feature archive: frozen features persisted per sample.
//!
//! - `ArchiveConfig` / `ArchiveLayout`: where an archive lives and how it
//!   treats records it cannot read.
//! - `ArchiveContext`: an archive opened from its root directory.
//! - `FeatureStore`: SQLite-backed storage with versioned schema.
//! - `SampleRecord`, `StoredFeature`, `Scope`: what lives in the database.

pub mod archive;
pub mod config;
pub mod feature_store;
pub mod layout;
pub mod models;

pub use archive::{load_archive_config, ArchiveContext};
pub use config::{ArchiveConfig, DbConfig, UnknownFeaturePolicy};
pub use feature_store::{FeatureStore, StoreError, StoreResult, CURRENT_SCHEMA_VERSION};
pub use layout::ArchiveLayout;
pub use models::{
    sample_key, LoadedFeatures, SampleRecord, Scope, SkippedRecord, StoredFeature,
};
