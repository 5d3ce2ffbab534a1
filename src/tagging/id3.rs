//! MP3 files: ID3v2 frames, saved as ID3v2.3.

use std::borrow::Cow;
use std::fs::File;
use std::path::{Path, PathBuf};

use lofty::TextEncoding;
use lofty::config::{ParseOptions, WriteOptions};
use lofty::file::AudioFile;
use lofty::id3::v2::{
    CommentFrame, Frame, FrameId, Id3v2Tag, PopularimeterFrame, TextInformationFrame,
    TimestampFrame,
};
use lofty::mpeg::MpegFile;
use lofty::tag::items::Timestamp;

use super::TagEncoder;
use crate::error::{Result, ResultExt};
use crate::metadata::FieldUpdate;
use crate::metadata::rating;

/// Identifies our POPM frame; Windows Explorer reads ratings from this one.
pub const POPM_EMAIL: &str = "Windows Media Player 9 Series";

/// ID3v2.3 separates multiple values in a text frame with a slash.
const MULTI_VALUE_SEPARATOR: &str = "/";

fn frame_id(id: &'static str) -> FrameId<'static> {
    FrameId::Valid(Cow::Borrowed(id))
}

/// `YYYY`, `YYYY-M` or `YYYY-M-D` as a timestamp; lofty renders the parts
/// zero-padded and splits them into TYER/TDAT for ID3v2.3.
fn recording_timestamp(year: &str) -> Timestamp {
    let mut parts = year.split('-').map(|part| part.parse::<u16>().ok());
    let year = parts.next().flatten().unwrap_or_default();
    let mut small = || parts.next().flatten().and_then(|n| u8::try_from(n).ok());
    let month = small();
    let day = month.and_then(|_| small());
    Timestamp {
        year,
        month,
        day,
        hour: None,
        minute: None,
        second: None,
    }
}

/// Encoder for MP3 files.
pub struct Id3Encoder {
    path: PathBuf,
    file: MpegFile,
    tag: Id3v2Tag,
}

impl Id3Encoder {
    /// Drop every frame with `id`, then add `frame`.
    fn replace(&mut self, id: &'static str, frame: Frame<'static>) {
        self.tag.remove(&frame_id(id)).for_each(drop);
        self.tag.insert(frame);
    }

    fn set_text(&mut self, id: &'static str, value: String) {
        let frame = TextInformationFrame::new(frame_id(id), TextEncoding::UTF16, value);
        self.replace(id, Frame::Text(frame));
    }
}

impl TagEncoder for Id3Encoder {
    fn load(path: &Path) -> Result<Self> {
        let mut reader = File::open(path).with_context(format!("Failed to open {}", path.display()))?;
        let mut file = MpegFile::read_from(&mut reader, ParseOptions::new().read_properties(false))?;
        // a file without an ID3v2 header starts from an empty tag
        let tag = file.remove_id3v2().unwrap_or_default();
        Ok(Self {
            path: path.to_path_buf(),
            file,
            tag,
        })
    }

    fn set_field(&mut self, update: &FieldUpdate) -> Result<()> {
        match update {
            FieldUpdate::Title(title) => self.set_text("TIT2", title.clone()),
            FieldUpdate::Subtitle(subtitle) => self.set_text("TIT3", subtitle.clone()),
            FieldUpdate::Comments(text) => {
                let frame =
                    CommentFrame::new(TextEncoding::UTF16, *b"eng", String::new(), text.clone());
                self.replace("COMM", Frame::Comment(frame));
            }
            FieldUpdate::Artists(artists) => {
                self.set_text("TPE1", artists.join(MULTI_VALUE_SEPARATOR))
            }
            FieldUpdate::AlbumArtist(artist) => self.set_text("TPE2", artist.clone()),
            FieldUpdate::Album(album) => self.set_text("TALB", album.clone()),
            FieldUpdate::Year(year) => {
                let frame = TimestampFrame::new(
                    frame_id("TDRC"),
                    TextEncoding::UTF16,
                    recording_timestamp(year),
                );
                self.replace("TDRC", Frame::Timestamp(frame));
            }
            FieldUpdate::TrackNumber(track) => self.set_text("TRCK", track.to_string()),
            FieldUpdate::Genre(genre) => self.set_text("TCON", genre.clone()),
            FieldUpdate::Rating(stars) => {
                let frame =
                    PopularimeterFrame::new(POPM_EMAIL.to_string(), rating::popm_byte(*stars), 0);
                self.replace("POPM", Frame::Popularimeter(frame));
            }
        }
        Ok(())
    }

    fn save(mut self) -> Result<()> {
        self.file.set_id3v2(self.tag);
        self.file
            .save_to_path(&self.path, WriteOptions::default().use_id3v23(true))?;
        Ok(())
    }
}
