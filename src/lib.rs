//! Tagwright - bulk metadata editing for audio files.
//!
//! Applies one set of descriptive fields (title, rating, artists, album, ...)
//! to many audio files at once, writing each file's native tag format:
//! ID3v2 (MP3), Vorbis comments (FLAC), iTunes atoms (MP4) and ASF
//! attributes (WMA). Validation happens up front for the whole field set;
//! file failures are isolated and reported per file.

pub mod asf;
pub mod batch;
pub mod cli;
pub mod config;
pub mod error;
pub mod metadata;
pub mod preview;
pub mod scanner;
pub mod tagging;
#[cfg(test)]
pub mod test_utils;

pub use batch::{BatchApply, BatchSummary, Progress, UpdateResult, apply_to_files};
pub use error::{Error, Result};
pub use metadata::{FieldSet, FieldUpdate, RawValue, TrackNumber, collect_updates, validate};
pub use preview::{PreviewRecord, PreviewTable, build_table, read_preview};
pub use tagging::{SUPPORTED_EXTENSIONS, TagFormat, classify};
