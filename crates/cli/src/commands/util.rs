use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use facts_core::store::ArchiveContext;

use crate::canonicalize_or_current;

/// Resolve `root` and open the archive living there.
pub fn open_archive_at(root: &str) -> Result<ArchiveContext> {
    let root_path = canonicalize_or_current(root)?;
    ArchiveContext::open(&root_path)
}

/// Resolve an input path against the current directory.
pub fn resolve_input(path: &str) -> Result<PathBuf> {
    let input = Path::new(path);
    if input.is_absolute() {
        return Ok(input.to_path_buf());
    }
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    Ok(cwd.join(input))
}

/// Read a whole input file, naming `what` in the error.
pub fn read_input(path: &Path, what: &str) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Failed to read {what} at {}", path.display()))
}

/// Format an optional address for text output.
pub fn display_address(address: Option<u64>) -> String {
    match address {
        Some(address) => format!("{address:#x}"),
        None => "-".to_string(),
    }
}
