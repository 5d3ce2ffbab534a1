//! Format-specific tag encoders and the extension-based file classifier.
//!
//! Each supported container gets one [`TagEncoder`] variant that owns the
//! file's tag for the duration of a single apply call:
//!
//! | extensions | format | encoder |
//! |---|---|---|
//! | `.mp3` | ID3v2.3 frames | [`Id3Encoder`] |
//! | `.flac` | Vorbis comments | [`VorbisEncoder`] |
//! | `.m4a .m4b .m4p .m4r .mp4 .m4v` | iTunes atoms | [`Mp4Encoder`] |
//! | `.wma .asf` | ASF attributes | [`AsfEncoder`] |

mod asf;
mod id3;
mod mp4;
mod vorbis;

pub use asf::AsfEncoder;
pub use id3::Id3Encoder;
pub use mp4::Mp4Encoder;
pub use vorbis::VorbisEncoder;

use std::fmt;
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};
use crate::metadata::{FieldSet, FieldUpdate};

/// Every supported extension, sorted, for help and display text.
pub const SUPPORTED_EXTENSIONS: &str = ".asf, .flac, .m4a, .m4b, .m4p, .m4r, .m4v, .mp3, .mp4, .wma";

/// Tag container written for a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagFormat {
    Id3v2,
    VorbisComments,
    Mp4Atoms,
    AsfAttributes,
}

impl fmt::Display for TagFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TagFormat::Id3v2 => "ID3v2",
            TagFormat::VorbisComments => "Vorbis comments",
            TagFormat::Mp4Atoms => "MP4 atoms",
            TagFormat::AsfAttributes => "ASF attributes",
        })
    }
}

/// Lower-case extension (without the dot) to tag format.
static EXTENSIONS: [(&str, TagFormat); 10] = [
    ("mp3", TagFormat::Id3v2),
    ("flac", TagFormat::VorbisComments),
    ("m4a", TagFormat::Mp4Atoms),
    ("m4b", TagFormat::Mp4Atoms),
    ("m4p", TagFormat::Mp4Atoms),
    ("m4r", TagFormat::Mp4Atoms),
    ("mp4", TagFormat::Mp4Atoms),
    ("m4v", TagFormat::Mp4Atoms),
    ("wma", TagFormat::AsfAttributes),
    ("asf", TagFormat::AsfAttributes),
];

/// The file's suffix as displayed in messages: `.txt`, or empty when there is none.
pub fn suffix(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

/// Pick the tag format for a path by its extension, case-insensitively.
pub fn classify(path: &Path) -> Option<TagFormat> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    EXTENSIONS
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, format)| *format)
}

/// Whether the path has a supported extension.
pub fn is_supported(path: &Path) -> bool {
    classify(path).is_some()
}

/// The load / set_field / save capability shared by every tag format.
///
/// An encoder owns one file's tag. Fields are mutated in memory by
/// [`set_field`](TagEncoder::set_field) and written to disk once by
/// [`save`](TagEncoder::save), which consumes the encoder. Setting a field
/// always replaces what was there, so repeated calls never leave duplicates.
pub trait TagEncoder: Sized {
    /// Open the file's tag, starting from an empty tag when it has none.
    fn load(path: &Path) -> Result<Self>;

    /// Replace one field in the in-memory tag. Fails when the format cannot
    /// store the value; nothing is written in that case.
    fn set_field(&mut self, update: &FieldUpdate) -> Result<()>;

    /// Write the tag back to the file.
    fn save(self) -> Result<()>;

    /// Set every field in `updates`, then save once.
    fn apply(mut self, updates: &FieldSet) -> Result<()> {
        for update in updates.iter() {
            debug!(field = %update.field(), "Setting field");
            self.set_field(update)?;
        }
        self.save()
    }
}

/// An encoder for any supported format.
pub enum Encoder {
    Id3(Id3Encoder),
    Vorbis(VorbisEncoder),
    Mp4(Mp4Encoder),
    Asf(AsfEncoder),
}

impl Encoder {
    pub fn format(&self) -> TagFormat {
        match self {
            Encoder::Id3(_) => TagFormat::Id3v2,
            Encoder::Vorbis(_) => TagFormat::VorbisComments,
            Encoder::Mp4(_) => TagFormat::Mp4Atoms,
            Encoder::Asf(_) => TagFormat::AsfAttributes,
        }
    }
}

impl TagEncoder for Encoder {
    /// Classify `path` and load the matching encoder.
    ///
    /// Unsupported extensions fail with [`Error::UnsupportedFileType`].
    fn load(path: &Path) -> Result<Self> {
        let format = classify(path).ok_or_else(|| Error::unsupported(suffix(path)))?;
        Ok(match format {
            TagFormat::Id3v2 => Encoder::Id3(Id3Encoder::load(path)?),
            TagFormat::VorbisComments => Encoder::Vorbis(VorbisEncoder::load(path)?),
            TagFormat::Mp4Atoms => Encoder::Mp4(Mp4Encoder::load(path)?),
            TagFormat::AsfAttributes => Encoder::Asf(AsfEncoder::load(path)?),
        })
    }

    fn set_field(&mut self, update: &FieldUpdate) -> Result<()> {
        match self {
            Encoder::Id3(encoder) => encoder.set_field(update),
            Encoder::Vorbis(encoder) => encoder.set_field(update),
            Encoder::Mp4(encoder) => encoder.set_field(update),
            Encoder::Asf(encoder) => encoder.set_field(update),
        }
    }

    fn save(self) -> Result<()> {
        match self {
            Encoder::Id3(encoder) => encoder.save(),
            Encoder::Vorbis(encoder) => encoder.save(),
            Encoder::Mp4(encoder) => encoder.save(),
            Encoder::Asf(encoder) => encoder.save(),
        }
    }
}

/// Load the encoder for `path`.
pub fn open(path: &Path) -> Result<Encoder> {
    Encoder::load(path)
}
