use anyhow::{Context, Result};
use facts_core::store::{ArchiveContext, SampleRecord};
use tracing::info;

use crate::commands::report::load_report;
use crate::commands::util::{open_archive_at, resolve_input};
use crate::{canonicalize_or_current, infer_archive_name};

/// Initialize a new archive at `root`.
pub fn init_archive_command(root: &str, name: Option<String>) -> Result<()> {
    let root_path = canonicalize_or_current(root)?;

    // Derive archive name if not provided.
    let archive_name = match name {
        Some(n) => n,
        None => infer_archive_name(&root_path),
    };

    let ctx = ArchiveContext::create(&root_path, &archive_name)?;

    info!(name = %archive_name, root = %ctx.layout.root.display(), "initialized archive");
    println!("Initialized feature archive:");
    println!("  Name: {}", archive_name);
    println!("  Root: {}", ctx.layout.root.display());
    println!("  Config: {}", ctx.layout.config_path.display());
    println!("  DB path (relative): {}", ctx.config.db.path);

    Ok(())
}

/// Register the target of a sandbox report as a sample.
pub fn add_sample_command(root: &str, report: &str) -> Result<()> {
    let ctx = open_archive_at(root)?;
    let audited = load_report(report)?;
    let source = resolve_input(report)?.to_string_lossy().to_string();

    let record = SampleRecord::from_report(&audited.value, Some(source));
    let id = ctx.store.insert_sample(&record).context("Failed to insert sample record")?;

    println!("Added sample:");
    println!("  Id: {}", id);
    println!("  SHA-256: {}", record.sha256);
    println!("  Format: {}", record.format);
    println!("  DB: {}", ctx.db_path.display());

    Ok(())
}

/// List all samples registered in the archive.
pub fn list_samples_command(root: &str, json: bool) -> Result<()> {
    let ctx = open_archive_at(root)?;
    let samples = ctx.store.list_samples().context("Failed to list samples")?;

    if json {
        let serialized =
            serde_json::to_string_pretty(&samples).context("Failed to serialize samples to JSON")?;
        println!("{}", serialized);
        return Ok(());
    }

    println!("Samples ({}):", samples.len());
    if samples.is_empty() {
        println!("  (none)");
        return Ok(());
    }
    for sample in samples {
        let source = sample.source.as_deref().unwrap_or("-");
        println!("  - {} [{}] source={} added={}", sample.sha256, sample.format, source, sample.added_at);
    }

    Ok(())
}
