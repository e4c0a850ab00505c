use serde::{Deserialize, Serialize};

/// Location of the archive database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbConfig {
    /// Path to the database file (typically relative to the archive root).
    pub path: String,
}

impl DbConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// What to do with a stored record whose feature type this build does not know.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownFeaturePolicy {
    /// Log it, report it in `LoadedFeatures::skipped`, keep going.
    #[default]
    Skip,
    /// Abort the load.
    Fail,
}

/// Serializable configuration describing a feature archive.
///
/// This lives at `.facts/archive.json` in the archive root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Human-friendly archive name.
    pub name: String,
    /// Optional description / notes.
    pub description: Option<String>,
    /// Config format version, not the codec version.
    pub config_version: String,
    /// Database configuration (path is typically relative to archive root).
    pub db: DbConfig,
    #[serde(default)]
    pub unknown_features: UnknownFeaturePolicy,
}

impl ArchiveConfig {
    /// Create a new archive configuration using the given name and db path.
    pub fn new(name: impl Into<String>, db_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            config_version: "0.1.0".to_string(),
            db: DbConfig::new(db_path),
            unknown_features: UnknownFeaturePolicy::default(),
        }
    }
}
