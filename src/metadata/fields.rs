//! Canonical field schema and the typed field set.
//!
//! A [`FieldSet`] maps each recognized [`Field`] to at most one typed
//! [`FieldUpdate`]. A field missing from the set means "leave it alone on
//! disk", never "clear it".

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// A recognized metadata field, in form order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Title,
    Subtitle,
    Rating,
    Comments,
    Artists,
    AlbumArtist,
    Album,
    Year,
    TrackNumber,
    Genre,
}

/// How a shell should collect a field's raw input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Single-line text
    Text,
    /// Multi-line text
    TextArea,
    /// One of [`RATING_CHOICES`]
    Rating,
}

/// Static description of a field.
#[derive(Debug)]
pub struct FieldDef {
    pub field: Field,
    pub name: &'static str,
    pub label: &'static str,
    pub kind: InputKind,
    pub placeholder: Option<&'static str>,
    pub help: Option<&'static str>,
}

/// The field registry, in the order a form shows them.
pub static FIELD_DEFS: [FieldDef; 10] = [
    FieldDef {
        field: Field::Title,
        name: "title",
        label: "Title",
        kind: InputKind::Text,
        placeholder: Some("e.g. Pictures Of You"),
        help: Some("Primary track title."),
    },
    FieldDef {
        field: Field::Subtitle,
        name: "subtitle",
        label: "Subtitle",
        kind: InputKind::Text,
        placeholder: Some("Optional secondary title"),
        help: None,
    },
    FieldDef {
        field: Field::Rating,
        name: "rating",
        label: "Rating",
        kind: InputKind::Rating,
        placeholder: None,
        help: Some("0-5 star rating as shown in Windows Explorer."),
    },
    FieldDef {
        field: Field::Comments,
        name: "comments",
        label: "Comments",
        kind: InputKind::TextArea,
        placeholder: Some("Notes about the track"),
        help: None,
    },
    FieldDef {
        field: Field::Artists,
        name: "artists",
        label: "Contributing artists",
        kind: InputKind::Text,
        placeholder: Some("Separate names with commas or semicolons"),
        help: None,
    },
    FieldDef {
        field: Field::AlbumArtist,
        name: "album_artist",
        label: "Album artist",
        kind: InputKind::Text,
        placeholder: Some("e.g. Anyma"),
        help: None,
    },
    FieldDef {
        field: Field::Album,
        name: "album",
        label: "Album",
        kind: InputKind::Text,
        placeholder: Some("e.g. Genesys II"),
        help: None,
    },
    FieldDef {
        field: Field::Year,
        name: "year",
        label: "Year",
        kind: InputKind::Text,
        placeholder: Some("e.g. 2024"),
        help: None,
    },
    FieldDef {
        field: Field::TrackNumber,
        name: "track_number",
        label: "Track number",
        kind: InputKind::Text,
        placeholder: Some("e.g. 1 or 1/10"),
        help: None,
    },
    FieldDef {
        field: Field::Genre,
        name: "genre",
        label: "Genre",
        kind: InputKind::Text,
        placeholder: Some("e.g. Dance"),
        help: None,
    },
];

/// Rating choices for a selection widget. `None` means "skip".
pub const RATING_CHOICES: [(&str, Option<u8>); 7] = [
    ("Skip", None),
    ("0 stars - Unrated", Some(0)),
    ("1 star", Some(1)),
    ("2 stars", Some(2)),
    ("3 stars", Some(3)),
    ("4 stars", Some(4)),
    ("5 stars", Some(5)),
];

impl Field {
    /// All fields in form order.
    pub const ALL: [Field; 10] = [
        Field::Title,
        Field::Subtitle,
        Field::Rating,
        Field::Comments,
        Field::Artists,
        Field::AlbumArtist,
        Field::Album,
        Field::Year,
        Field::TrackNumber,
        Field::Genre,
    ];

    /// Registry entry for this field.
    pub fn def(self) -> &'static FieldDef {
        // FIELD_DEFS is laid out in declaration order
        &FIELD_DEFS[self as usize]
    }

    /// Canonical snake_case name.
    pub fn name(self) -> &'static str {
        self.def().name
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        self.def().label
    }

    /// Look up a field by its canonical name.
    pub fn from_name(name: &str) -> Option<Field> {
        FIELD_DEFS.iter().find(|d| d.name == name).map(|d| d.field)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Track position with an optional album track count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrackNumber {
    pub track: u32,
    pub total: Option<u32>,
}

impl TrackNumber {
    pub fn new(track: u32, total: Option<u32>) -> Self {
        Self { track, total }
    }
}

impl fmt::Display for TrackNumber {
    /// `"track"` or `"track/total"`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.total {
            Some(total) => write!(f, "{}/{}", self.track, total),
            None => write!(f, "{}", self.track),
        }
    }
}

/// A typed value for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum FieldUpdate {
    Title(String),
    Subtitle(String),
    /// Canonical 0-5 star rating. Out-of-range values are written as 0.
    Rating(i64),
    Comments(String),
    Artists(Vec<String>),
    AlbumArtist(String),
    Album(String),
    /// `YYYY`, `YYYY-MM` or `YYYY-MM-DD`, written verbatim
    Year(String),
    TrackNumber(TrackNumber),
    Genre(String),
}

impl FieldUpdate {
    /// The field this value belongs to.
    pub fn field(&self) -> Field {
        match self {
            FieldUpdate::Title(_) => Field::Title,
            FieldUpdate::Subtitle(_) => Field::Subtitle,
            FieldUpdate::Rating(_) => Field::Rating,
            FieldUpdate::Comments(_) => Field::Comments,
            FieldUpdate::Artists(_) => Field::Artists,
            FieldUpdate::AlbumArtist(_) => Field::AlbumArtist,
            FieldUpdate::Album(_) => Field::Album,
            FieldUpdate::Year(_) => Field::Year,
            FieldUpdate::TrackNumber(_) => Field::TrackNumber,
            FieldUpdate::Genre(_) => Field::Genre,
        }
    }
}

/// Validated updates to apply, at most one per field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSet {
    updates: BTreeMap<Field, FieldUpdate>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, update: FieldUpdate) -> Self {
        self.insert(update);
        self
    }

    /// Insert a value, replacing any previous value for the same field.
    pub fn insert(&mut self, update: FieldUpdate) -> Option<FieldUpdate> {
        self.updates.insert(update.field(), update)
    }

    pub fn get(&self, field: Field) -> Option<&FieldUpdate> {
        self.updates.get(&field)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.updates.contains_key(&field)
    }

    /// Updates in form order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldUpdate> {
        self.updates.values()
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }
}

impl FromIterator<FieldUpdate> for FieldSet {
    fn from_iter<I: IntoIterator<Item = FieldUpdate>>(iter: I) -> Self {
        let mut set = FieldSet::new();
        for update in iter {
            set.insert(update);
        }
        set
    }
}
