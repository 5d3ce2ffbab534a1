//! Apply command: validate field values, then write them to every file.

use clap::Args;
use std::io::Write;
use std::path::PathBuf;

use super::{display_name, expand_paths};
use crate::batch::{BatchApply, BatchSummary};
use crate::metadata::{self, Field, FieldSet, RawValue};

/// Field values to write. Omitted flags leave the field untouched.
#[derive(Args, Debug, Clone, Default)]
pub struct FieldArgs {
    /// Track title
    #[arg(long)]
    pub title: Option<String>,
    /// Secondary title
    #[arg(long)]
    pub subtitle: Option<String>,
    /// Star rating, 0-5
    #[arg(long, value_parser = clap::value_parser!(i64).range(0..=5))]
    pub rating: Option<i64>,
    /// Comment text
    #[arg(long)]
    pub comments: Option<String>,
    /// Contributing artists, separated by commas or semicolons
    #[arg(long)]
    pub artists: Option<String>,
    #[arg(long)]
    pub album_artist: Option<String>,
    #[arg(long)]
    pub album: Option<String>,
    /// YYYY, YYYY-MM or YYYY-MM-DD
    #[arg(long)]
    pub year: Option<String>,
    /// N or N/M
    #[arg(long)]
    pub track: Option<String>,
    #[arg(long)]
    pub genre: Option<String>,
}

impl FieldArgs {
    /// Raw inputs keyed by canonical field name, for the flags that were given.
    pub fn raw_inputs(&self) -> Vec<(&'static str, RawValue)> {
        let text = [
            (Field::Title, &self.title),
            (Field::Subtitle, &self.subtitle),
            (Field::Comments, &self.comments),
            (Field::Artists, &self.artists),
            (Field::AlbumArtist, &self.album_artist),
            (Field::Album, &self.album),
            (Field::Year, &self.year),
            (Field::TrackNumber, &self.track),
            (Field::Genre, &self.genre),
        ];
        let mut raw: Vec<(&'static str, RawValue)> = text
            .into_iter()
            .filter_map(|(field, value)| {
                value
                    .as_ref()
                    .map(|value| (field.name(), RawValue::from(value.as_str())))
            })
            .collect();
        if let Some(rating) = self.rating {
            raw.push((Field::Rating.name(), RawValue::Integer(rating)));
        }
        raw
    }

    /// Validate every given flag, reporting all failures at once.
    pub fn validate(&self) -> Result<FieldSet, Vec<metadata::FieldError>> {
        metadata::validate(self.raw_inputs())
    }
}

/// Validate the field values and apply them to every file.
pub fn cmd_apply(
    paths: &[PathBuf],
    include_subfolders: bool,
    fields: &FieldArgs,
    json: bool,
) -> anyhow::Result<()> {
    let updates = match fields.validate() {
        Ok(updates) => updates,
        Err(errors) => {
            for error in &errors {
                eprintln!("{error}");
            }
            anyhow::bail!("{} invalid field value(s), no files were changed", errors.len());
        }
    };

    if updates.is_empty() {
        println!("No changes to apply - enter at least one value.");
        return Ok(());
    }

    let files = expand_paths(paths, include_subfolders)?;
    if files.is_empty() {
        println!("No audio files found.");
        return Ok(());
    }

    let results = BatchApply::new(&updates).run(&files, |progress| {
        if !json {
            eprint!("\rUpdating {}/{}...", progress.completed, progress.total);
            std::io::stderr().flush().ok();
        }
    });
    let summary = BatchSummary::from_results(&results);

    if json {
        let output = serde_json::json!({
            "updates": updates.iter().collect::<Vec<_>>(),
            "results": results,
            "summary": summary,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    eprintln!();
    for result in results.iter().filter(|r| !r.success) {
        println!("FAILED {}: {}", display_name(&result.path), result.message);
    }
    println!("{summary}");
    Ok(())
}
