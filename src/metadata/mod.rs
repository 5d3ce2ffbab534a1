//! Canonical metadata fields, input validation and rating scales.
//!
//! # Features
//! - Field registry with labels and input hints for a form-based shell
//! - Typed [`FieldSet`] consumed by the tag encoders
//! - Aggregating validation: every field error is reported in one pass
//! - Per-format star rating tables

pub mod fields;
pub mod parse;
pub mod rating;

pub use fields::{FIELD_DEFS, Field, FieldDef, FieldSet, FieldUpdate, InputKind, RATING_CHOICES, TrackNumber};
pub use parse::{ErrorKind, FieldError, RawValue, collect_updates, validate};
