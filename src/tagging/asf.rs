//! WMA/ASF files: named header attributes.

use std::path::{Path, PathBuf};

use super::TagEncoder;
use crate::asf::{AsfTag, AttributeValue};
use crate::error::{Result, ResultExt};
use crate::metadata::FieldUpdate;
use crate::metadata::rating;

/// ASF has no multi-value author, so artists are joined into one string.
pub const AUTHOR_SEPARATOR: &str = "; ";

/// Encoder for WMA and ASF files.
pub struct AsfEncoder {
    path: PathBuf,
    tag: AsfTag,
}

impl TagEncoder for AsfEncoder {
    fn load(path: &Path) -> Result<Self> {
        let tag = AsfTag::read_from_path(path)
            .with_context(format!("Failed to read {}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            tag,
        })
    }

    fn set_field(&mut self, update: &FieldUpdate) -> Result<()> {
        let tag = &mut self.tag;
        match update {
            FieldUpdate::Title(title) => tag.insert("Title", title.as_str()),
            FieldUpdate::Subtitle(subtitle) => tag.insert("WM/SubTitle", subtitle.as_str()),
            FieldUpdate::Comments(text) => tag.insert("WM/Comments", text.as_str()),
            FieldUpdate::Artists(artists) => tag.insert("Author", artists.join(AUTHOR_SEPARATOR)),
            FieldUpdate::AlbumArtist(artist) => tag.insert("WM/AlbumArtist", artist.as_str()),
            FieldUpdate::Album(album) => tag.insert("WM/AlbumTitle", album.as_str()),
            FieldUpdate::Year(year) => tag.insert("WM/Year", year.as_str()),
            FieldUpdate::TrackNumber(track) => {
                tag.insert("WM/TrackNumber", track.track.to_string());
                match track.total {
                    Some(total) => tag.insert("WM/TrackTotal", total.to_string()),
                    None => {
                        tag.remove("WM/TrackTotal");
                    }
                }
            }
            FieldUpdate::Genre(genre) => tag.insert("WM/Genre", genre.as_str()),
            FieldUpdate::Rating(stars) => tag.insert(
                "WM/SharedUserRating",
                AttributeValue::DWord(rating::asf_shared_user_rating(*stars)),
            ),
        }
        Ok(())
    }

    fn save(self) -> Result<()> {
        self.tag
            .save_to_path(&self.path)
            .with_context(format!("Failed to write {}", self.path.display()))
    }
}
