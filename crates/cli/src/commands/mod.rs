pub mod diff;
pub mod export;
pub mod merge;

pub use diff::diff_command;
pub use export::export_command;
pub use merge::merge_command;

use anyhow::{Context, Result};
use scopemerge_core::{Config, Diagnostic, Workspace, WorkspaceOutput};
use std::path::Path;
use tracing::debug;

/// Load and build a workspace description
///
/// Merge failures are reported as a structured diagnostic on stderr before
/// the error is returned.
pub(crate) fn build_workspace(path: &Path, config: Config) -> Result<WorkspaceOutput> {
    debug!("Building workspace {:?} with {:?}", path, config);

    let workspace = Workspace::load(path)
        .with_context(|| format!("Failed to load workspace {}", path.display()))?
        .with_config(config);

    workspace.build().map_err(|err| {
        print_diagnostic(&err.to_diagnostic());
        anyhow::Error::new(err).context(format!("Failed to merge workspace {}", path.display()))
    })
}

fn print_diagnostic(diagnostic: &Diagnostic) {
    match serde_json::to_string(diagnostic) {
        Ok(json) => eprintln!("{json}"),
        Err(_) => eprintln!("{}", diagnostic.message),
    }
}
