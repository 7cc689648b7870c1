use anyhow::{Context, Result};
use log::info;
use std::fs;
use std::path::Path;

use crate::record::Record;

/// Default destination, relative to the working directory.
pub const DEFAULT_OUTPUT_FILE: &str = "mood-marked.json";

/// Serializes all records as one JSON array and writes it with a single call.
/// Nothing touches `path` until the whole document is built.
pub fn write_document(path: &Path, records: &[Record], pretty: bool) -> Result<()> {
    let document = if pretty {
        serde_json::to_vec_pretty(records)
    } else {
        serde_json::to_vec(records)
    }
    .context("Failed to serialize enriched records")?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }
    fs::write(path, &document)
        .with_context(|| format!("Failed to write output file: {}", path.display()))?;
    info!(
        "Wrote {} records ({} bytes) to {}",
        records.len(),
        document.len(),
        path.display()
    );
    Ok(())
}
