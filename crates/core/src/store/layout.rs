use std::path::{Path, PathBuf};

/// Logical layout of an archive on disk.
///
/// This is derived from a chosen root path. It does *not* perform any IO itself.
#[derive(Debug, Clone)]
pub struct ArchiveLayout {
    /// Root directory of the archive.
    pub root: PathBuf,
    /// Directory for archive metadata (.facts).
    pub meta_dir: PathBuf,
    /// Path to the archive config file (JSON).
    pub config_path: PathBuf,
    /// Path to the feature database file.
    pub db_path: PathBuf,
}

impl ArchiveLayout {
    /// Compute the default layout for an archive rooted at `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        let meta_dir = root.join(".facts");
        let config_path = meta_dir.join("archive.json");
        let db_path = meta_dir.join("features.db");
        Self { root, meta_dir, config_path, db_path }
    }

    /// Database path suitable for storing in `ArchiveConfig`, relative to `root`
    /// when possible.
    pub fn db_path_relative_string(&self) -> String {
        match self.db_path.strip_prefix(&self.root) {
            Ok(rel) => rel.to_string_lossy().to_string(),
            Err(_) => self.db_path.to_string_lossy().to_string(),
        }
    }
}
