//! Preview command.

use std::path::PathBuf;

use super::expand_paths;
use crate::preview::{PreviewRecord, build_table};

const COLUMNS: [&str; 7] = ["File", "Title", "Artists", "Album", "Year", "Track", "Genre"];

fn row(record: &PreviewRecord) -> [&str; 7] {
    [
        &record.file,
        &record.title,
        &record.artists,
        &record.album,
        &record.year,
        &record.track,
        &record.genre,
    ]
}

/// Render records as a left-aligned text table.
fn render_table(records: &[PreviewRecord]) -> String {
    let mut widths = COLUMNS.map(|c| c.chars().count());
    for record in records {
        for (width, cell) in widths.iter_mut().zip(row(record)) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: [&str; 7]| {
        cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = line(COLUMNS);
    out.push('\n');
    for record in records {
        out.push_str(&line(row(record)));
        out.push('\n');
    }
    out
}

/// Show current tags for the given files and folders.
pub fn cmd_preview(
    paths: &[PathBuf],
    include_subfolders: bool,
    limit: usize,
    json: bool,
) -> anyhow::Result<()> {
    let files = expand_paths(paths, include_subfolders)?;
    if files.is_empty() {
        println!("No audio files found.");
        return Ok(());
    }

    let table = build_table(&files, limit);
    if json {
        println!("{}", serde_json::to_string_pretty(&table)?);
        return Ok(());
    }

    print!("{}", render_table(&table.records));
    if table.is_truncated() {
        println!(
            "\nShowing the first {} of {} files.",
            table.records.len(),
            table.total
        );
    } else {
        println!("\n{} file(s).", table.total);
    }
    Ok(())
}
