//! Application-wide error types.
//!
//! Library modules return [`Error`] for anything that touches the disk.
//! Field validation does not use this type: it produces a list of
//! [`FieldError`](crate::metadata::FieldError) values so every problem can be
//! shown at once. The binary uses `anyhow` for top-level propagation.
//!
//! # Example
//!
//! ```ignore
//! use tagwright::error::{Error, Result};
//!
//! fn retag(path: &Path, updates: &FieldSet) -> Result<()> {
//!     let encoder = tagging::open(path)?; // unsupported extensions surface here
//!     encoder.apply(updates)              // container errors carry their cause
//! }
//! ```

use std::path::PathBuf;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level application error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Tag container error reported by lofty (MP3, FLAC, MP4)
    #[error("{0}")]
    Tag(#[from] lofty::error::LoftyError),

    /// ASF header object error
    #[error("{0}")]
    Asf(#[from] crate::asf::AsfError),

    /// No encoder exists for the file's extension
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// Container layout the writer cannot handle
    #[error("Unsupported file layout: {0}")]
    UnsupportedLayout(String),

    /// Value outside what the target format can store
    #[error("Value out of range: {0}")]
    ValueOutOfRange(String),

    /// File or folder not found
    #[error("Not found: {0}")]
    NotFound(PathBuf),

    /// Configuration file error
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create an unsupported file type error from the file's suffix (e.g. `.txt`).
    pub fn unsupported(suffix: impl Into<String>) -> Self {
        Self::UnsupportedFileType(suffix.into())
    }

    /// Create a not found error.
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound(path.into())
    }

    /// Add context to an error.
    pub fn context(self, ctx: impl Into<String>) -> Self {
        Self::WithContext {
            context: ctx.into(),
            source: Box::new(self),
        }
    }
}

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn with_context(self, ctx: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Io(e).context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, lofty::error::LoftyError> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Tag(e).context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, crate::asf::AsfError> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Asf(e).context(ctx))
    }
}
