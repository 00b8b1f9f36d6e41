use anyhow::{Result, bail};
use scopemerge_core::{Config, UnitId};
use std::path::Path;

use super::build_workspace;

pub fn export_command(workspace: &Path, config: Config, unit: &str) -> Result<()> {
    let output = build_workspace(workspace, config)?;

    let Some(unit_output) = output.unit(&UnitId::from(unit)) else {
        bail!("Unit '{}' is not part of {}", unit, workspace.display());
    };

    println!("{}", serde_json::to_string_pretty(&unit_output.metadata)?);
    Ok(())
}
