use anyhow::{Context, Result};
use scopemerge_core::MetadataMarker;
use std::fs;
use std::path::Path;

use crate::display::format_change_set;

pub fn diff_command(old: &Path, new: &Path, json: bool) -> Result<()> {
    let old_markers = read_markers(old)?;
    let new_markers = read_markers(new)?;

    let changes = scopemerge_core::diff(&old_markers, &new_markers)
        .context("Failed to compare marker files")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&changes)?);
    } else {
        print!("{}", format_change_set(&changes));
    }
    Ok(())
}

fn read_markers(path: &Path) -> Result<Vec<MetadataMarker>> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse markers in {}", path.display()))
}
