//! Raw input parsing and validation.
//!
//! Every field is parsed independently and all failures are collected, so a
//! caller can show the whole list in one pass. Nothing here touches a file.

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

use super::fields::{Field, FieldSet, FieldUpdate, TrackNumber};

static YEAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}(-\d{1,2}(-\d{1,2})?)?$").expect("year pattern is valid")
});

/// Raw value as entered by a user or supplied by a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    Text(String),
    Integer(i64),
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Integer(value)
    }
}

impl RawValue {
    fn into_text(self) -> String {
        match self {
            RawValue::Text(text) => text,
            RawValue::Integer(n) => n.to_string(),
        }
    }
}

/// Category of a validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    InvalidFormat,
    OutOfRange,
    TypeMismatch,
}

/// A field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Field name as it appeared in the input
    pub name: String,
    /// Display label (the name itself for unknown fields)
    pub label: String,
    pub kind: ErrorKind,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label, self.message)
    }
}

/// A parser failure before the field is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invalid {
    pub kind: ErrorKind,
    pub message: &'static str,
}

impl Invalid {
    const fn new(kind: ErrorKind, message: &'static str) -> Self {
        Self { kind, message }
    }
}

type Parsed<T> = Result<Option<T>, Invalid>;

/// Trim text; empty becomes `None`.
pub fn sanitize_text(value: &str) -> Option<String> {
    let text = value.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Split a people list on `,` or `;`, dropping empty parts.
pub fn parse_people(value: &str) -> Option<Vec<String>> {
    let parts: Vec<String> = value
        .split([',', ';'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(String::from)
        .collect();
    (!parts.is_empty()).then_some(parts)
}

/// Accept `YYYY`, `YYYY-MM` or `YYYY-MM-DD`.
pub fn parse_year(value: &str) -> Parsed<String> {
    let Some(text) = sanitize_text(value) else {
        return Ok(None);
    };
    if !YEAR_PATTERN.is_match(&text) {
        return Err(Invalid::new(
            ErrorKind::InvalidFormat,
            "Use YYYY or YYYY-MM-DD format.",
        ));
    }
    Ok(Some(text))
}

/// Accept `N` or `N/M` with `M >= N`.
///
/// A total of 0 is treated as "no total", as tag writers omit it.
pub fn parse_track_number(value: &str) -> Parsed<TrackNumber> {
    let Some(text) = sanitize_text(value) else {
        return Ok(None);
    };
    let (first, second) = text.split_once('/').unwrap_or((text.as_str(), ""));

    let track: i64 = first.trim().parse().map_err(|_| {
        Invalid::new(ErrorKind::TypeMismatch, "Track must be an integer.")
    })?;

    let second = second.trim();
    let total: Option<i64> = if second.is_empty() {
        None
    } else {
        Some(second.parse().map_err(|_| {
            Invalid::new(ErrorKind::TypeMismatch, "Total tracks must be an integer.")
        })?)
    };

    if track < 0 {
        return Err(Invalid::new(ErrorKind::OutOfRange, "Track must be positive."));
    }
    if let Some(total) = total
        && total < track
    {
        return Err(Invalid::new(
            ErrorKind::OutOfRange,
            "Total tracks cannot be smaller than the track number.",
        ));
    }

    let too_large = || Invalid::new(ErrorKind::OutOfRange, "Track number is too large.");
    let track = u32::try_from(track).map_err(|_| too_large())?;
    let total = match total {
        Some(total) => Some(u32::try_from(total).map_err(|_| too_large())?),
        None => None,
    };

    Ok(Some(TrackNumber::new(track, total.filter(|t| *t > 0))))
}

/// Integers pass through untouched; text must parse as an integer.
pub fn parse_rating(value: RawValue) -> Parsed<i64> {
    match value {
        RawValue::Integer(rating) => Ok(Some(rating)),
        RawValue::Text(text) => {
            let Some(text) = sanitize_text(&text) else {
                return Ok(None);
            };
            text.parse()
                .map(Some)
                .map_err(|_| Invalid::new(ErrorKind::TypeMismatch, "Rating must be an integer."))
        }
    }
}

/// Parse one field's raw value into a typed update.
pub fn parse_field(field: Field, value: RawValue) -> Parsed<FieldUpdate> {
    let update = match field {
        Field::Rating => parse_rating(value)?.map(FieldUpdate::Rating),
        Field::Title => sanitize_text(&value.into_text()).map(FieldUpdate::Title),
        Field::Subtitle => sanitize_text(&value.into_text()).map(FieldUpdate::Subtitle),
        Field::Comments => sanitize_text(&value.into_text()).map(FieldUpdate::Comments),
        Field::Artists => parse_people(&value.into_text()).map(FieldUpdate::Artists),
        Field::AlbumArtist => sanitize_text(&value.into_text()).map(FieldUpdate::AlbumArtist),
        Field::Album => sanitize_text(&value.into_text()).map(FieldUpdate::Album),
        Field::Year => parse_year(&value.into_text())?.map(FieldUpdate::Year),
        Field::TrackNumber => {
            parse_track_number(&value.into_text())?.map(FieldUpdate::TrackNumber)
        }
        Field::Genre => sanitize_text(&value.into_text()).map(FieldUpdate::Genre),
    };
    Ok(update)
}

/// Parse a whole raw input set.
///
/// Returns the updates that parsed to a non-empty value together with every
/// field error found. Callers must not apply the updates when the error list
/// is non-empty; see [`validate`].
pub fn collect_updates<I, K>(raw_inputs: I) -> (FieldSet, Vec<FieldError>)
where
    I: IntoIterator<Item = (K, RawValue)>,
    K: AsRef<str>,
{
    let mut updates = FieldSet::new();
    let mut errors = Vec::new();

    for (name, raw) in raw_inputs {
        let name = name.as_ref();
        let Some(field) = Field::from_name(name) else {
            errors.push(FieldError {
                name: name.to_string(),
                label: name.to_string(),
                kind: ErrorKind::InvalidFormat,
                message: "Unknown field.".to_string(),
            });
            continue;
        };

        match parse_field(field, raw) {
            Ok(Some(update)) => {
                updates.insert(update);
            }
            Ok(None) => {}
            Err(invalid) => errors.push(FieldError {
                name: name.to_string(),
                label: field.label().to_string(),
                kind: invalid.kind,
                message: invalid.message.to_string(),
            }),
        }
    }

    (updates, errors)
}

/// All-or-nothing gate: the field set only when no field failed.
pub fn validate<I, K>(raw_inputs: I) -> Result<FieldSet, Vec<FieldError>>
where
    I: IntoIterator<Item = (K, RawValue)>,
    K: AsRef<str>,
{
    let (updates, errors) = collect_updates(raw_inputs);
    if errors.is_empty() {
        Ok(updates)
    } else {
        Err(errors)
    }
}


/// Property-based tests using proptest
#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// People lists never contain empty or untrimmed names
        #[test]
        fn people_parts_are_trimmed_and_non_empty(input in "[a-zA-Z ,;]{0,40}") {
            if let Some(parts) = parse_people(&input) {
                prop_assert!(!parts.is_empty());
                for part in parts {
                    prop_assert!(!part.is_empty());
                    prop_assert_eq!(part.trim(), part.as_str());
                    prop_assert!(!part.contains(',') && !part.contains(';'));
                }
            }
        }

        /// Any consistent N/M pair parses back to itself
        #[test]
        fn consistent_track_pairs_parse(track in 0u32..1000, extra in 0u32..1000) {
            let total = track + extra;
            let parsed = parse_track_number(&format!("{track}/{total}")).unwrap().unwrap();
            prop_assert_eq!(parsed.track, track);
            prop_assert_eq!(parsed.total, Some(total).filter(|t| *t > 0));
        }

        /// A total smaller than the track is always rejected
        #[test]
        fn smaller_totals_rejected(track in 1u32..1000, total in 0u32..1000) {
            prop_assume!(total < track);
            let err = parse_track_number(&format!("{track}/{total}")).unwrap_err();
            prop_assert_eq!(err.kind, ErrorKind::OutOfRange);
        }

        /// Four-digit years with optional month and day always validate
        #[test]
        fn well_formed_years_validate(y in 1000u32..9999, m in 1u32..12, d in 1u32..28) {
            let year = y.to_string();
            let year_month = format!("{}-{:02}", y, m);
            let full = format!("{}-{}-{}", y, m, d);
            prop_assert!(parse_year(&year).is_ok());
            prop_assert!(parse_year(&year_month).is_ok());
            prop_assert!(parse_year(&full).is_ok());
        }
    }
}
