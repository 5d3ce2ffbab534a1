//! FLAC files: Vorbis comments with lower-case keys.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use lofty::config::{ParseOptions, WriteOptions};
use lofty::file::AudioFile;
use lofty::flac::FlacFile;
use lofty::ogg::VorbisComments;

use super::TagEncoder;
use crate::error::{Error, Result, ResultExt};
use crate::metadata::FieldUpdate;
use crate::metadata::rating;

/// Block header byte of a STREAMINFO block flagged as the last metadata block.
const STREAMINFO_LAST: u8 = 0x80;

/// Whether the stream's only metadata block is STREAMINFO. lofty cannot
/// insert comments after such a block, so these files are refused.
fn streaminfo_is_last<R: Read + Seek>(reader: &mut R) -> io::Result<bool> {
    let mut head = [0u8; 10];
    reader.read_exact(&mut head)?;
    let mut offset = 0u64;
    if head.starts_with(b"ID3") {
        let size = head[6..10]
            .iter()
            .fold(0u64, |acc, byte| (acc << 7) | u64::from(byte & 0x7F));
        let footer = if head[5] & 0x10 != 0 { 10 } else { 0 };
        offset = 10 + size + footer;
    }

    let mut marker = [0u8; 5];
    reader.seek(SeekFrom::Start(offset))?;
    reader.read_exact(&mut marker)?;
    Ok(marker.starts_with(b"fLaC") && marker[4] == STREAMINFO_LAST)
}

/// Encoder for FLAC files.
pub struct VorbisEncoder {
    path: PathBuf,
    file: FlacFile,
    tag: VorbisComments,
}

impl VorbisEncoder {
    fn set(&mut self, key: &str, value: String) {
        self.tag.remove(key).for_each(drop);
        self.tag.push(key.to_string(), value);
    }
}

impl TagEncoder for VorbisEncoder {
    fn load(path: &Path) -> Result<Self> {
        let mut reader = File::open(path).with_context(format!("Failed to open {}", path.display()))?;
        if streaminfo_is_last(&mut reader).with_context(format!("Failed to read {}", path.display()))? {
            return Err(Error::UnsupportedLayout(
                "FLAC stream has no metadata block after STREAMINFO".to_string(),
            ));
        }
        reader.rewind()?;
        let mut file = FlacFile::read_from(&mut reader, ParseOptions::new().read_properties(false))?;
        let tag = file.remove_vorbis_comments().unwrap_or_default();
        Ok(Self {
            path: path.to_path_buf(),
            file,
            tag,
        })
    }

    fn set_field(&mut self, update: &FieldUpdate) -> Result<()> {
        match update {
            FieldUpdate::Title(title) => self.set("title", title.clone()),
            FieldUpdate::Subtitle(subtitle) => self.set("subtitle", subtitle.clone()),
            FieldUpdate::Comments(text) => self.set("comment", text.clone()),
            FieldUpdate::Artists(artists) => {
                self.tag.remove("artist").for_each(drop);
                for artist in artists {
                    self.tag.push("artist".to_string(), artist.clone());
                }
            }
            FieldUpdate::AlbumArtist(artist) => self.set("albumartist", artist.clone()),
            FieldUpdate::Album(album) => self.set("album", album.clone()),
            FieldUpdate::Year(year) => self.set("date", year.clone()),
            FieldUpdate::TrackNumber(track) => {
                self.set("tracknumber", track.track.to_string());
                match track.total {
                    Some(total) => self.set("tracktotal", total.to_string()),
                    None => self.tag.remove("tracktotal").for_each(drop),
                }
            }
            FieldUpdate::Genre(genre) => self.set("genre", genre.clone()),
            FieldUpdate::Rating(stars) => self.set("rating", rating::vorbis_rating(*stars)),
        }
        Ok(())
    }

    fn save(mut self) -> Result<()> {
        self.file.set_vorbis_comments(self.tag);
        self.file.save_to_path(&self.path, WriteOptions::default())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{FieldSet, TrackNumber};
    use crate::test_utils;
    use tempfile::tempdir;

    fn reload(path: &Path) -> VorbisComments {
        let mut reader = File::open(path).unwrap();
        let file = FlacFile::read_from(&mut reader, ParseOptions::new().read_properties(false)).unwrap();
        file.vorbis_comments().cloned().expect("comments written")
    }

    #[test]
    fn test_streaminfo_only_stream_is_refused() {
        let dir = tempdir().unwrap();
        let path = test_utils::flac_streaminfo_only_fixture(dir.path(), "bare.flac");
        let before = std::fs::read(&path).unwrap();

        let err = VorbisEncoder::load(&path).err().expect("layout rejected");
        assert!(err.to_string().contains("STREAMINFO"));
        assert_eq!(std::fs::read(&path).unwrap(), before);
    }

    #[test]
    fn test_streaminfo_check_skips_id3_prefix() {
        let mut data = b"ID3\x03\x00\x00\x00\x00\x00\x04".to_vec();
        data.extend_from_slice(&[0u8; 4]);
        data.extend_from_slice(b"fLaC\x80\x00\x00\x22");
        assert!(streaminfo_is_last(&mut io::Cursor::new(&data)).unwrap());

        let mut data = b"fLaC\x00\x00\x00\x22".to_vec();
        data.extend_from_slice(&[0u8; 34]);
        assert!(!streaminfo_is_last(&mut io::Cursor::new(&data)).unwrap());
    }

    #[test]
    fn test_rating_is_plain_text() {
        let dir = tempdir().unwrap();
        let path = test_utils::flac_fixture(dir.path(), "c.flac");
        VorbisEncoder::load(&path)
            .unwrap()
            .apply(&FieldSet::new().with(FieldUpdate::Rating(3)))
            .unwrap();
        assert_eq!(reload(&path).get("rating"), Some("3"));
    }

    #[test]
    fn test_out_of_range_rating_writes_zero() {
        let dir = tempdir().unwrap();
        let path = test_utils::flac_fixture(dir.path(), "c.flac");
        VorbisEncoder::load(&path)
            .unwrap()
            .apply(&FieldSet::new().with(FieldUpdate::Rating(9)))
            .unwrap();
        assert_eq!(reload(&path).get("rating"), Some("0"));
    }

    #[test]
    fn test_artists_are_multi_valued() {
        let dir = tempdir().unwrap();
        let path = test_utils::flac_fixture(dir.path(), "c.flac");
        let artists = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        VorbisEncoder::load(&path)
            .unwrap()
            .apply(&FieldSet::new().with(FieldUpdate::Artists(artists)))
            .unwrap();

        let tag = reload(&path);
        let written: Vec<&str> = tag.get_all("artist").collect();
        assert_eq!(written, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_track_total_removed_when_absent() {
        let dir = tempdir().unwrap();
        let path = test_utils::flac_fixture(dir.path(), "c.flac");
        VorbisEncoder::load(&path)
            .unwrap()
            .apply(&FieldSet::new().with(FieldUpdate::TrackNumber(TrackNumber::new(3, Some(9)))))
            .unwrap();
        let tag = reload(&path);
        assert_eq!(tag.get("tracknumber"), Some("3"));
        assert_eq!(tag.get("tracktotal"), Some("9"));

        VorbisEncoder::load(&path)
            .unwrap()
            .apply(&FieldSet::new().with(FieldUpdate::TrackNumber(TrackNumber::new(4, None))))
            .unwrap();
        let tag = reload(&path);
        assert_eq!(tag.get("tracknumber"), Some("4"));
        assert_eq!(tag.get("tracktotal"), None);
    }

    #[test]
    fn test_text_fields_replace_previous_values() {
        let dir = tempdir().unwrap();
        let path = test_utils::flac_fixture(dir.path(), "c.flac");
        let mut encoder = VorbisEncoder::load(&path).unwrap();
        encoder.set_field(&FieldUpdate::Title("X".into())).unwrap();
        encoder.set_field(&FieldUpdate::Title("Y".into())).unwrap();
        encoder.set_field(&FieldUpdate::Year("2024-09-01".into())).unwrap();
        encoder.set_field(&FieldUpdate::AlbumArtist("Anyma".into())).unwrap();
        encoder.save().unwrap();

        let tag = reload(&path);
        assert_eq!(tag.get_all("title").collect::<Vec<_>>(), vec!["Y"]);
        assert_eq!(tag.get("date"), Some("2024-09-01"));
        assert_eq!(tag.get("albumartist"), Some("Anyma"));
    }
}
