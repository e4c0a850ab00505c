//! Sandbox execution reports.
//!
//! `schema` holds the validation engine (policies, path-qualified issues),
//! `model` holds the report entities built on it.

pub mod model;
pub mod schema;

use tracing::debug;

pub use model::{
    Argument, ArgumentValue, Behavior, Call, ExportedSymbol, File, ImportedDll, ImportedSymbol,
    Info, Pe, Process, Report, Section, Static, Summary, Target,
};
pub use schema::{Audited, FieldIssue, IssueKind, Policy, ReportValidationError};

/// A parsed report plus the undeclared vendor fields that were dropped.
pub type AuditedReport = Audited<Report>;

impl Report {
    /// Parse a JSON report. All-or-nothing: any issue anywhere fails the whole parse.
    pub fn parse(buf: &[u8]) -> Result<Report, ReportValidationError> {
        Self::parse_audited(buf).map(|audited| audited.value)
    }

    /// Like [`Report::parse`], also returning the paths of dropped fields so
    /// schema drift can be watched without failing ingestion.
    pub fn parse_audited(buf: &[u8]) -> Result<AuditedReport, ReportValidationError> {
        let audited = schema::parse_audited::<Report>(buf)?;
        debug!(
            sha256 = %audited.value.target.file.sha256,
            processes = audited.value.behavior.processes.len(),
            calls = audited.value.behavior.call_count(),
            ignored = audited.ignored_fields.len(),
            "parsed sandbox report"
        );
        Ok(audited)
    }

    /// PE facts from static analysis, falling back to the target file's own view.
    pub fn pe(&self) -> Option<&Pe> {
        self.static_
            .as_ref()
            .and_then(|stat| stat.pe.as_ref())
            .or(self.target.file.pe.as_ref())
    }
}
