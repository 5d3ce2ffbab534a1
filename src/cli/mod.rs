//! Command-line interface for tagwright.
//!
//! This module provides the `formats`, `preview` and `apply` commands on top
//! of the library's validation, preview and batch engines.

mod commands;

pub use commands::{Cli, Commands, FieldArgs, WalkArgs, expand_paths, run_command};
