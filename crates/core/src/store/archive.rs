//! Opening and creating an archive rooted at a directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::store::{ArchiveConfig, ArchiveLayout, FeatureStore, UnknownFeaturePolicy};

/// An archive whose config has been read and whose database is open.
#[derive(Debug)]
pub struct ArchiveContext {
    pub layout: ArchiveLayout,
    pub config: ArchiveConfig,
    /// Database path after resolving `config.db.path` against the root.
    pub db_path: PathBuf,
    pub store: FeatureStore,
}

impl ArchiveContext {
    /// Read `.facts/archive.json` under `root` and open the database it names.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let layout = ArchiveLayout::new(root);
        let config = load_archive_config(&layout)?;
        let db_path = resolve_db_path(&layout, &config);
        let store = FeatureStore::open(&db_path)
            .with_context(|| format!("Failed to open feature archive at {}", db_path.display()))?;
        debug!(root = %layout.root.display(), db = %db_path.display(), "opened archive");
        Ok(Self { layout, config, db_path, store })
    }

    /// Write a fresh config under `root` and create its database.
    ///
    /// An existing config is overwritten; an existing database is migrated,
    /// never truncated.
    pub fn create(root: impl AsRef<Path>, name: &str) -> Result<Self> {
        let layout = ArchiveLayout::new(root);
        fs::create_dir_all(&layout.meta_dir)
            .with_context(|| format!("Failed to create meta dir: {}", layout.meta_dir.display()))?;

        let config = ArchiveConfig::new(name, layout.db_path_relative_string());
        let json = serde_json::to_string_pretty(&config)?;
        fs::write(&layout.config_path, json).with_context(|| {
            format!("Failed to write archive config: {}", layout.config_path.display())
        })?;

        let db_path = resolve_db_path(&layout, &config);
        let store = FeatureStore::open(&db_path).with_context(|| {
            format!("Failed to initialize feature archive at {}", db_path.display())
        })?;
        Ok(Self { layout, config, db_path, store })
    }

    pub fn unknown_features(&self) -> UnknownFeaturePolicy {
        self.config.unknown_features
    }
}

/// Read and parse the config file for `layout`.
pub fn load_archive_config(layout: &ArchiveLayout) -> Result<ArchiveConfig> {
    let config_json = fs::read_to_string(&layout.config_path).with_context(|| {
        format!("Failed to read archive config at {}", layout.config_path.display())
    })?;
    serde_json::from_str(&config_json).context("Failed to parse archive config JSON")
}

/// Relative `db.path` values are taken from the archive root.
fn resolve_db_path(layout: &ArchiveLayout, config: &ArchiveConfig) -> PathBuf {
    let configured = Path::new(&config.db.path);
    if configured.is_absolute() {
        configured.to_path_buf()
    } else {
        layout.root.join(configured)
    }
}
