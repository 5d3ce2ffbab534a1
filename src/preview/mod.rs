//! Read-only metadata preview for display.
//!
//! Unlike the write path, preview reads never fail: a file that cannot be
//! probed or whose tag is corrupt simply yields blank columns. Failures are
//! logged at debug level and otherwise dropped.

use std::path::{Path, PathBuf};

use lofty::config::ParseOptions;
use lofty::error::LoftyError;
use lofty::file::TaggedFileExt;
use lofty::probe::Probe;
use lofty::tag::{Accessor, ItemKey, Tag};
use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::asf::{AsfError, AsfTag};
use crate::tagging::{TagFormat, classify};

/// Rows shown when no limit is configured.
pub const DEFAULT_PREVIEW_LIMIT: usize = 200;

/// Separator for multi-valued columns.
pub const JOIN_SEPARATOR: &str = "; ";

/// One display row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PreviewRecord {
    /// File name without directories
    pub file: String,
    pub title: String,
    pub artists: String,
    pub album: String,
    pub year: String,
    /// `N` or `N/M`
    pub track: String,
    pub genre: String,
    pub path: String,
}

impl PreviewRecord {
    fn blank(path: &Path) -> Self {
        Self {
            file: path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
            path: path.display().to_string(),
            ..Default::default()
        }
    }

    fn has_tags(&self) -> bool {
        [
            &self.title,
            &self.artists,
            &self.album,
            &self.year,
            &self.track,
            &self.genre,
        ]
        .iter()
        .any(|column| !column.is_empty())
    }
}

/// Trim each value, drop empty ones, join the rest.
fn join_values<I, S>(values: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .filter_map(|value| {
            let value = value.as_ref().trim();
            (!value.is_empty()).then(|| value.to_string())
        })
        .collect::<Vec<_>>()
        .join(JOIN_SEPARATOR)
}

fn fill_from_tag(record: &mut PreviewRecord, tag: &Tag) {
    record.title = join_values(tag.get_strings(&ItemKey::TrackTitle));
    record.artists = join_values(tag.get_strings(&ItemKey::TrackArtist));
    record.album = join_values(tag.get_strings(&ItemKey::AlbumTitle));
    record.year = join_values(tag.get_strings(&ItemKey::RecordingDate));
    if record.year.is_empty() {
        record.year = join_values(tag.get_strings(&ItemKey::Year));
    }
    record.track = match (tag.track(), tag.track_total()) {
        (Some(track), Some(total)) if total > 0 => format!("{track}/{total}"),
        (Some(track), _) => track.to_string(),
        (None, _) => String::new(),
    };
    record.genre = join_values(tag.get_strings(&ItemKey::Genre));
}

fn read_generic(path: &Path, record: &mut PreviewRecord) -> Result<(), LoftyError> {
    let tagged_file = Probe::open(path)?
        .options(ParseOptions::new().read_properties(false))
        .read()?;
    if let Some(tag) = tagged_file
        .primary_tag()
        .or_else(|| tagged_file.first_tag())
    {
        fill_from_tag(record, tag);
    }
    Ok(())
}

fn asf_text(tag: &AsfTag, name: &str) -> String {
    join_values(tag.get_all(name).filter_map(|value| value.as_text()))
}

fn read_asf(path: &Path, record: &mut PreviewRecord) -> Result<(), AsfError> {
    let tag = AsfTag::read_from_path(path)?;
    record.title = asf_text(&tag, "Title");
    record.artists = asf_text(&tag, "Author");
    record.album = asf_text(&tag, "WM/AlbumTitle");
    record.year = asf_text(&tag, "WM/Year");
    record.track = asf_text(&tag, "WM/TrackNumber");
    record.genre = asf_text(&tag, "WM/Genre");
    Ok(())
}

/// Best-effort summary of one file's tags. Never fails.
pub fn read_preview(path: &Path) -> PreviewRecord {
    let mut record = PreviewRecord::blank(path);

    if let Err(e) = read_generic(path, &mut record) {
        debug!(path = %path.display(), error = %e, "Generic tag read failed");
    }
    if record.has_tags() || classify(path) != Some(TagFormat::AsfAttributes) {
        return record;
    }

    if let Err(e) = read_asf(path, &mut record) {
        debug!(path = %path.display(), error = %e, "ASF tag read failed");
    }
    record
}

/// A capped preview of a file list.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PreviewTable {
    /// Records for the first `limit` paths, in input order
    pub records: Vec<PreviewRecord>,
    /// Number of paths offered, including those past the limit
    pub total: usize,
}

impl PreviewTable {
    /// Whether some paths were left out.
    pub fn is_truncated(&self) -> bool {
        self.records.len() < self.total
    }
}

/// Read previews for the first `limit` paths. Reads run in parallel;
/// records keep input order.
pub fn build_table(paths: &[PathBuf], limit: usize) -> PreviewTable {
    let sample = &paths[..paths.len().min(limit)];
    let records = sample.par_iter().map(|path| read_preview(path)).collect();
    PreviewTable {
        records,
        total: paths.len(),
    }
}
