use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use scopemerge_core::{Config, ConfigLoader};
use std::path::{Path, PathBuf};

use crate::commands::{diff_command, export_command, merge_command};

/// Scope-based contribution merging for dependency-injection graphs
#[derive(Parser, Debug)]
#[command(name = "scopemerge", version, about, long_about = None)]
#[command(subcommand_required = true, arg_required_else_help = true)]
#[command(
    after_help = "ENVIRONMENT:\n    RUST_LOG=debug           Enable debug logging\n    SCOPEMERGE_ROOT=<dir>    Outermost directory searched for .scopemerge.json"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Use this config file instead of searching for .scopemerge.json
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Merge every merge point of a workspace description
    Merge {
        /// Path to the workspace description (JSON)
        workspace: PathBuf,

        /// Only print the results of this unit
        #[arg(short, long)]
        unit: Option<String>,

        /// Print merged results as JSON
        #[arg(long)]
        json: bool,

        /// Write each unit's exported markers to <dir>/<unit>.markers.json
        #[arg(long = "metadata-dir")]
        metadata_dir: Option<PathBuf>,
    },
    /// Print the metadata markers a unit exports
    Export {
        /// Path to the workspace description (JSON)
        workspace: PathBuf,

        /// Unit whose markers are printed
        #[arg(short, long)]
        unit: String,
    },
    /// Compare two exported marker files
    Diff {
        /// Markers of the previous build
        old: PathBuf,

        /// Markers of the current build
        new: PathBuf,

        /// Print the change set as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    /// Execute the selected command
    pub fn execute(self) -> Result<()> {
        match self.command {
            Commands::Merge {
                workspace,
                unit,
                json,
                metadata_dir,
            } => {
                let config = load_config(self.config.as_deref(), &workspace)?;
                merge_command(&workspace, config, unit.as_deref(), json, metadata_dir.as_deref())
            }
            Commands::Export { workspace, unit } => {
                let config = load_config(self.config.as_deref(), &workspace)?;
                export_command(&workspace, config, &unit)
            }
            Commands::Diff { old, new, json } => diff_command(&old, &new, json),
        }
    }
}

/// Explicit config file, else the files found from the workspace's directory upwards
fn load_config(explicit: Option<&Path>, workspace: &Path) -> Result<Config> {
    match explicit {
        Some(path) => ConfigLoader::load_file(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => {
            let start = workspace
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let start = start.canonicalize().unwrap_or_else(|_| start.to_path_buf());
            ConfigLoader::load_from_path(&start).context("Failed to load configuration")
        }
    }
}
