//! tagwright - bulk audio metadata editor.
//!
//! Validates field values once, then writes them to MP3, FLAC, MP4 and
//! WMA files, reporting a result per file.

use clap::Parser;
use tagwright::{cli, config};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("tagwright=info".parse()?))
        .init();

    let config = config::load();
    cli::run_command(&args, &config)
}
