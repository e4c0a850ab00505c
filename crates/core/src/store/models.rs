use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::features::Feature;
use crate::report::Report;

/// Archive key for a SHA-256 digest. Hex case never distinguishes samples.
pub fn sample_key(sha256: &str) -> String {
    sha256.to_ascii_lowercase()
}

/// A sample known to the archive, identified by its lowercase SHA-256.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SampleRecord {
    pub sha256: String,
    pub md5: String,
    pub sha1: String,
    /// Format label as reported by the sandbox.
    pub format: String,
    /// Where the sample's identity came from (e.g. a report path).
    pub source: Option<String>,
    /// RFC 3339 timestamp of first registration.
    pub added_at: String,
}

impl SampleRecord {
    /// Take identity from the report's target file.
    pub fn from_report(report: &Report, source: Option<String>) -> Self {
        let file = &report.target.file;
        Self {
            sha256: sample_key(&file.sha256),
            md5: file.md5.clone(),
            sha1: file.sha1.clone(),
            format: file.file_type.clone(),
            source,
            added_at: Utc::now().to_rfc3339(),
        }
    }
}

/// Where in the sample a feature was observed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Global,
    File,
    Process,
    Thread,
    Call,
    Function,
    #[serde(rename = "basic block")]
    BasicBlock,
    Instruction,
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Global => "global",
            Scope::File => "file",
            Scope::Process => "process",
            Scope::Thread => "thread",
            Scope::Call => "call",
            Scope::Function => "function",
            Scope::BasicBlock => "basic block",
            Scope::Instruction => "instruction",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "global" => Ok(Scope::Global),
            "file" => Ok(Scope::File),
            "process" => Ok(Scope::Process),
            "thread" => Ok(Scope::Thread),
            "call" => Ok(Scope::Call),
            "function" => Ok(Scope::Function),
            "basic block" => Ok(Scope::BasicBlock),
            "instruction" => Ok(Scope::Instruction),
            other => Err(format!("unknown scope {other:?}")),
        }
    }
}

/// A feature with the place it was observed.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredFeature {
    pub scope: Scope,
    /// Virtual address, process id, or similar; `None` for global/file scope.
    pub address: Option<u64>,
    pub feature: Feature,
}

impl StoredFeature {
    pub fn new(scope: Scope, address: Option<u64>, feature: Feature) -> Self {
        Self { scope, address, feature }
    }
}

/// A stored row that was not thawed because its type is unknown to this build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRecord {
    pub row_id: i64,
    pub feature_type: String,
}

/// Result of loading a sample's features.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedFeatures {
    pub features: Vec<StoredFeature>,
    pub skipped: Vec<SkippedRecord>,
}
