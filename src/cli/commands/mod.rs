//! CLI command definitions and dispatch.
//!
//! Each subcommand is implemented in its own submodule:
//! - `preview`: read-only tag table for files and folders
//! - `apply`: validate field values and write them to every file

mod apply;
mod preview;

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::Config;
use crate::scanner;
use crate::tagging::SUPPORTED_EXTENSIONS;

pub use apply::{FieldArgs, cmd_apply};
pub use preview::cmd_preview;

/// Bulk audio tag editor
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// List the supported file extensions
    Formats,
    /// Show current tags of files and folders
    Preview {
        /// Files or folders to preview
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        #[command(flatten)]
        walk: WalkArgs,
        /// Maximum number of files to read
        #[arg(long)]
        limit: Option<usize>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Write the given field values to every file
    Apply {
        /// Files or folders to update
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        #[command(flatten)]
        walk: WalkArgs,
        #[command(flatten)]
        fields: FieldArgs,
        /// Print JSON results instead of text
        #[arg(long)]
        json: bool,
    },
}

/// Folder traversal flags shared by every command taking paths.
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct WalkArgs {
    /// Descend into subfolders of folder arguments
    #[arg(long, overrides_with = "no_recursive")]
    recursive: bool,
    /// Only list direct children of folder arguments
    #[arg(long = "no-recursive", overrides_with = "recursive")]
    no_recursive: bool,
}

impl WalkArgs {
    /// Flag value, or the configured default when neither flag is given.
    pub fn include_subfolders(&self, config: &Config) -> bool {
        if self.recursive {
            true
        } else if self.no_recursive {
            false
        } else {
            config.library.include_subfolders
        }
    }
}

/// Expand folder arguments into their audio files; file arguments are kept
/// as given so unsupported files are reported rather than dropped.
pub fn expand_paths(paths: &[PathBuf], include_subfolders: bool) -> crate::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            files.extend(scanner::list_audio_files(path, include_subfolders)?);
        } else {
            files.push(path.clone());
        }
    }
    debug!(count = files.len(), "Expanded path arguments");
    Ok(files)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Run the specified CLI command.
pub fn run_command(cli: &Cli, config: &Config) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Formats => {
            println!("Supported formats: {SUPPORTED_EXTENSIONS}");
            Ok(())
        }
        Commands::Preview {
            paths,
            walk,
            limit,
            json,
        } => cmd_preview(
            paths,
            walk.include_subfolders(config),
            limit.unwrap_or(config.preview.limit),
            *json,
        ),
        Commands::Apply {
            paths,
            walk,
            fields,
            json,
        } => cmd_apply(paths, walk.include_subfolders(config), fields, *json),
    }
}
