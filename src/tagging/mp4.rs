//! MP4 family files: iTunes-style `ilst` atoms.

use std::borrow::Cow;
use std::fs::File;
use std::path::{Path, PathBuf};

use lofty::config::{ParseOptions, WriteOptions};
use lofty::file::AudioFile;
use lofty::mp4::{Atom, AtomData, AtomIdent, Ilst, Mp4File};
use lofty::tag::Accessor;

use super::TagEncoder;
use crate::error::{Error, Result, ResultExt};
use crate::metadata::FieldUpdate;
use crate::metadata::rating;

const TITLE: [u8; 4] = *b"\xa9nam";
const COMMENT: [u8; 4] = *b"\xa9cmt";
const ARTIST: [u8; 4] = *b"\xa9ART";
const ALBUM_ARTIST: [u8; 4] = *b"aART";
const ALBUM: [u8; 4] = *b"\xa9alb";
const YEAR: [u8; 4] = *b"\xa9day";
const TRACK: [u8; 4] = *b"trkn";
const GENRE: [u8; 4] = *b"\xa9gen";
const RATE: [u8; 4] = *b"rate";

/// `----:com.apple.iTunes:SUBTITLE`
pub(crate) fn subtitle_ident() -> AtomIdent<'static> {
    AtomIdent::Freeform {
        mean: Cow::Borrowed("com.apple.iTunes"),
        name: Cow::Borrowed("SUBTITLE"),
    }
}

/// Encoder for MP4, M4A and related files.
pub struct Mp4Encoder {
    path: PathBuf,
    file: Mp4File,
    tag: Ilst,
}

impl Mp4Encoder {
    fn set_text(&mut self, ident: AtomIdent<'static>, value: String) {
        self.tag.remove(&ident).for_each(drop);
        self.tag.insert(Atom::new(ident, AtomData::UTF8(value)));
    }

    fn set_fourcc(&mut self, fourcc: [u8; 4], value: String) {
        self.set_text(AtomIdent::Fourcc(fourcc), value);
    }
}

impl TagEncoder for Mp4Encoder {
    fn load(path: &Path) -> Result<Self> {
        let mut reader = File::open(path).with_context(format!("Failed to open {}", path.display()))?;
        let mut file = Mp4File::read_from(&mut reader, ParseOptions::new().read_properties(false))?;
        let tag = file.remove_ilst().unwrap_or_default();
        Ok(Self {
            path: path.to_path_buf(),
            file,
            tag,
        })
    }

    fn set_field(&mut self, update: &FieldUpdate) -> Result<()> {
        match update {
            FieldUpdate::Title(title) => self.set_fourcc(TITLE, title.clone()),
            FieldUpdate::Subtitle(subtitle) => self.set_text(subtitle_ident(), subtitle.clone()),
            FieldUpdate::Comments(text) => self.set_fourcc(COMMENT, text.clone()),
            FieldUpdate::Artists(artists) => {
                let ident = AtomIdent::Fourcc(ARTIST);
                self.tag.remove(&ident).for_each(drop);
                let data = artists.iter().cloned().map(AtomData::UTF8).collect();
                if let Some(atom) = Atom::from_collection(ident, data) {
                    self.tag.insert(atom);
                }
            }
            FieldUpdate::AlbumArtist(artist) => self.set_fourcc(ALBUM_ARTIST, artist.clone()),
            FieldUpdate::Album(album) => self.set_fourcc(ALBUM, album.clone()),
            FieldUpdate::Year(year) => self.set_fourcc(YEAR, year.clone()),
            FieldUpdate::TrackNumber(track) => {
                // trkn holds a 16-bit (track, total) pair; a missing total is stored as 0
                let total = track.total.unwrap_or(0);
                if u16::try_from(track.track).is_err() || u16::try_from(total).is_err() {
                    return Err(Error::ValueOutOfRange(format!(
                        "track number {track} does not fit in an MP4 trkn atom (max {})",
                        u16::MAX
                    )));
                }
                self.tag.remove(&AtomIdent::Fourcc(TRACK)).for_each(drop);
                self.tag.set_track(track.track);
                self.tag.set_track_total(total);
            }
            FieldUpdate::Genre(genre) => self.set_fourcc(GENRE, genre.clone()),
            FieldUpdate::Rating(stars) => {
                self.set_fourcc(RATE, rating::mp4_rate(*stars).to_string())
            }
        }
        Ok(())
    }

    fn save(mut self) -> Result<()> {
        self.file.set_ilst(self.tag);
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

    fn reload(path: &Path) -> Ilst {
        let mut reader = File::open(path).unwrap();
        let file = Mp4File::read_from(&mut reader, ParseOptions::new().read_properties(false)).unwrap();
        file.ilst().cloned().expect("ilst written")
    }

    fn texts(tag: &Ilst, ident: &AtomIdent<'_>) -> Vec<String> {
        tag.get(ident)
            .map(|atom| {
                atom.data()
                    .filter_map(|data| match data {
                        AtomData::UTF8(text) => Some(text.clone()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Raw `trkn` payload: 2 reserved bytes, track, total, 2 reserved bytes.
    fn trkn_pair(tag: &Ilst) -> Option<(u16, u16)> {
        let atom = tag.get(&AtomIdent::Fourcc(TRACK))?;
        atom.data().find_map(|data| match data {
            AtomData::Unknown { data, .. } if data.len() >= 6 => Some((
                u16::from_be_bytes([data[2], data[3]]),
                u16::from_be_bytes([data[4], data[5]]),
            )),
            _ => None,
        })
    }

    #[test]
    fn test_rating_writes_rate_atom() {
        let dir = tempdir().unwrap();
        let path = test_utils::mp4_fixture(dir.path(), "a.m4a");
        Mp4Encoder::load(&path)
            .unwrap()
            .apply(&FieldSet::new().with(FieldUpdate::Rating(3)))
            .unwrap();
        assert_eq!(texts(&reload(&path), &AtomIdent::Fourcc(RATE)), vec!["60"]);
    }

    #[test]
    fn test_track_total_defaults_to_zero() {
        let dir = tempdir().unwrap();
        let path = test_utils::mp4_fixture(dir.path(), "a.m4a");
        Mp4Encoder::load(&path)
            .unwrap()
            .apply(&FieldSet::new().with(FieldUpdate::TrackNumber(TrackNumber::new(7, Some(10)))))
            .unwrap();
        let tag = reload(&path);
        assert_eq!(tag.track(), Some(7));
        assert_eq!(tag.track_total(), Some(10));

        Mp4Encoder::load(&path)
            .unwrap()
            .apply(&FieldSet::new().with(FieldUpdate::TrackNumber(TrackNumber::new(2, None))))
            .unwrap();
        let tag = reload(&path);
        assert_eq!(tag.track(), Some(2));
        assert_eq!(trkn_pair(&tag), Some((2, 0)));
    }

    #[test]
    fn test_track_number_beyond_trkn_range_fails() {
        let dir = tempdir().unwrap();
        let path = test_utils::mp4_fixture(dir.path(), "a.m4a");
        let before = std::fs::read(&path).unwrap();

        let err = Mp4Encoder::load(&path)
            .unwrap()
            .apply(&FieldSet::new().with(FieldUpdate::TrackNumber(TrackNumber::new(
                70000,
                Some(70001),
            ))))
            .unwrap_err();
        assert!(err.to_string().contains("70000/70001"));
        assert_eq!(std::fs::read(&path).unwrap(), before);

        let mut encoder = Mp4Encoder::load(&path).unwrap();
        assert!(
            encoder
                .set_field(&FieldUpdate::TrackNumber(TrackNumber::new(3, Some(65536))))
                .is_err()
        );
        encoder
            .set_field(&FieldUpdate::TrackNumber(TrackNumber::new(65535, None)))
            .unwrap();
    }

    #[test]
    fn test_subtitle_uses_freeform_atom() {
        let dir = tempdir().unwrap();
        let path = test_utils::mp4_fixture(dir.path(), "a.m4a");
        Mp4Encoder::load(&path)
            .unwrap()
            .apply(&FieldSet::new().with(FieldUpdate::Subtitle("Live at Wembley".into())))
            .unwrap();
        assert_eq!(texts(&reload(&path), &subtitle_ident()), vec!["Live at Wembley"]);
    }

    #[test]
    fn test_text_atoms_and_multi_valued_artist() {
        let dir = tempdir().unwrap();
        let path = test_utils::mp4_fixture(dir.path(), "a.mp4");
        let mut encoder = Mp4Encoder::load(&path).unwrap();
        encoder.set_field(&FieldUpdate::Title("X".into())).unwrap();
        encoder.set_field(&FieldUpdate::Title("Y".into())).unwrap();
        encoder.set_field(&FieldUpdate::Artists(vec!["A".into(), "B".into()])).unwrap();
        encoder.set_field(&FieldUpdate::Year("2024-09-01".into())).unwrap();
        encoder.set_field(&FieldUpdate::Genre("Dance".into())).unwrap();
        encoder.save().unwrap();

        let tag = reload(&path);
        assert_eq!(texts(&tag, &AtomIdent::Fourcc(TITLE)), vec!["Y"]);
        assert_eq!(texts(&tag, &AtomIdent::Fourcc(ARTIST)), vec!["A", "B"]);
        assert_eq!(texts(&tag, &AtomIdent::Fourcc(YEAR)), vec!["2024-09-01"]);
        assert_eq!(texts(&tag, &AtomIdent::Fourcc(GENRE)), vec!["Dance"]);
    }
}
