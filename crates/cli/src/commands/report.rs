use anyhow::{bail, Context, Result};
use facts_core::report::{AuditedReport, Report};
use serde::Serialize;

use crate::commands::util::{read_input, resolve_input};
use crate::sha256_file;

/// What `report-info` prints about a report.
#[derive(Debug, Serialize)]
pub struct ReportSummary {
    pub sha256: String,
    pub md5: String,
    pub sha1: String,
    pub format: String,
    pub analysis_version: String,
    pub processes: usize,
    pub threads: usize,
    pub calls: usize,
    pub import_groups: usize,
    pub imported_symbols: usize,
    pub exports: usize,
    pub sections: usize,
    pub strings: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignored_fields: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_verified: Option<bool>,
}

/// Build a summary from a parsed report. Ignored fields are only included
/// when `audit` is set.
pub fn summarize_report(audited: &AuditedReport, audit: bool) -> ReportSummary {
    let report = &audited.value;
    let file = &report.target.file;
    let pe = report.pe();
    ReportSummary {
        sha256: file.sha256.clone(),
        md5: file.md5.clone(),
        sha1: file.sha1.clone(),
        format: file.file_type.clone(),
        analysis_version: report.info.version.clone(),
        processes: report.behavior.processes.len(),
        threads: report.behavior.processes.iter().map(|p| p.threads.len()).sum(),
        calls: report.behavior.call_count(),
        import_groups: pe.map(|pe| pe.imports.len()).unwrap_or(0),
        imported_symbols: pe
            .map(|pe| pe.imports.iter().map(|group| group.imports.len()).sum())
            .unwrap_or(0),
        exports: pe.map(|pe| pe.exports.len()).unwrap_or(0),
        sections: pe.map(|pe| pe.sections.len()).unwrap_or(0),
        strings: report.strings.as_ref().map(Vec::len),
        ignored_fields: audit.then(|| audited.ignored_fields.clone()),
        sample_verified: None,
    }
}

/// Parse a report file and fail with every validation issue listed.
pub fn load_report(path: &str) -> Result<AuditedReport> {
    let report_path = resolve_input(path)?;
    let buf = read_input(&report_path, "report")?;
    Report::parse_audited(&buf)
        .with_context(|| format!("Failed to validate report {}", report_path.display()))
}

/// Parse a report and print what it describes.
pub fn report_info_command(
    path: &str,
    json: bool,
    audit: bool,
    sample: Option<String>,
) -> Result<()> {
    let audited = load_report(path)?;
    let mut summary = summarize_report(&audited, audit);

    if let Some(sample) = sample {
        let sample_path = resolve_input(&sample)?;
        let actual = sha256_file(&sample_path)?;
        if !actual.eq_ignore_ascii_case(&summary.sha256) {
            bail!(
                "Sample hash mismatch for {}: report says {}, file is {}",
                sample_path.display(),
                summary.sha256,
                actual
            );
        }
        summary.sample_verified = Some(true);
    }

    if json {
        let serialized = serde_json::to_string_pretty(&summary)
            .context("Failed to serialize report summary to JSON")?;
        println!("{}", serialized);
        return Ok(());
    }

    println!("Sandbox Report");
    println!("==============");
    println!("SHA-256: {}", summary.sha256);
    println!("MD5: {}", summary.md5);
    println!("SHA-1: {}", summary.sha1);
    println!("Format: {}", summary.format);
    println!("Analysis version: {}", summary.analysis_version);
    println!();
    println!("Behavior:");
    println!("  Processes: {}", summary.processes);
    println!("  Threads: {}", summary.threads);
    println!("  Calls: {}", summary.calls);
    println!("Static:");
    println!(
        "  Imports: {} symbol(s) from {} DLL(s)",
        summary.imported_symbols, summary.import_groups
    );
    println!("  Exports: {}", summary.exports);
    println!("  Sections: {}", summary.sections);
    if let Some(strings) = summary.strings {
        println!("  Strings: {}", strings);
    }
    if summary.sample_verified == Some(true) {
        println!("Sample: verified");
    }
    if let Some(ignored) = &summary.ignored_fields {
        println!();
        println!("Ignored fields ({}):", ignored.len());
        if ignored.is_empty() {
            println!("  (none)");
        }
        for field in ignored {
            println!("  - {}", field);
        }
    }

    Ok(())
}
