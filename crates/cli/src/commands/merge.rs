use anyhow::{Context, Result, bail};
use scopemerge_core::{Config, UnitId, UnitOutput};
use std::fs;
use std::path::Path;
use tracing::info;

use super::build_workspace;
use crate::display::format_result;

pub fn merge_command(
    workspace: &Path,
    config: Config,
    unit: Option<&str>,
    json: bool,
    metadata_dir: Option<&Path>,
) -> Result<()> {
    let output = build_workspace(workspace, config)?;

    if let Some(dir) = metadata_dir {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        for unit_output in &output.units {
            write_markers(dir, unit_output)?;
        }
    }

    let selected: Vec<&UnitOutput> = match unit {
        Some(name) => match output.unit(&UnitId::from(name)) {
            Some(unit_output) => vec![unit_output],
            None => bail!("Unit '{}' is not part of {}", name, workspace.display()),
        },
        None => output.units.iter().collect(),
    };

    let results: Vec<_> = selected.iter().flat_map(|u| u.results.iter()).collect();
    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else if results.is_empty() {
        println!("No merge points");
    } else {
        for result in results {
            print!("{}", format_result(result));
        }
    }

    Ok(())
}

fn write_markers(dir: &Path, unit_output: &UnitOutput) -> Result<()> {
    let path = dir.join(format!("{}.markers.json", unit_output.unit));
    let contents = serde_json::to_string_pretty(&unit_output.metadata)?;
    fs::write(&path, contents).with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote {} markers to {:?}", unit_output.metadata.len(), path);
    Ok(())
}
