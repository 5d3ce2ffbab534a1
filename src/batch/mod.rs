//! Batch apply engine.
//!
//! Applies one validated [`FieldSet`] to an ordered list of files. Each file
//! is classified, loaded, mutated and saved on its own; a failure on one file
//! is recorded in its [`UpdateResult`] and the batch moves on.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::metadata::FieldSet;
use crate::tagging::{self, TagEncoder};

/// Outcome for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateResult {
    pub path: PathBuf,
    pub success: bool,
    /// Empty on success, the failure cause otherwise
    pub message: String,
}

impl UpdateResult {
    pub fn ok(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            success: true,
            message: String::new(),
        }
    }

    pub fn failed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            success: false,
            message: message.into(),
        }
    }
}

impl fmt::Display for UpdateResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.success {
            write!(f, "{}: updated", self.path.display())
        } else {
            write!(f, "{}: {}", self.path.display(), self.message)
        }
    }
}

/// "File `completed` of `total` done."
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    /// Completed share in `0.0..=1.0`.
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f32 / self.total as f32
        }
    }
}

/// Success and failure counts for a finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn from_results(results: &[UpdateResult]) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        Self {
            succeeded,
            failed: results.len() - succeeded,
        }
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Updated {} file(s), {} failed", self.succeeded, self.failed)
    }
}

/// One batch run over a fixed field set.
pub struct BatchApply<'a> {
    updates: &'a FieldSet,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'a> BatchApply<'a> {
    pub fn new(updates: &'a FieldSet) -> Self {
        Self {
            updates,
            cancel: None,
        }
    }

    /// Stop before the next file once `flag` is set.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    fn apply_one(&self, path: &Path) -> Result<()> {
        tagging::open(path)?.apply(self.updates)
    }

    /// Apply the field set to each path in order, reporting progress after
    /// every file. Returns one result per processed file.
    ///
    /// An empty field set touches nothing and returns no results. A
    /// cancelled batch returns the results gathered so far.
    pub fn run<F>(&self, paths: &[PathBuf], mut on_progress: F) -> Vec<UpdateResult>
    where
        F: FnMut(Progress),
    {
        if self.updates.is_empty() {
            debug!("Empty field set, nothing to apply");
            return Vec::new();
        }

        let total = paths.len();
        info!(files = total, fields = self.updates.len(), "Applying metadata");

        let mut results = Vec::with_capacity(total);
        for (index, path) in paths.iter().enumerate() {
            if self.is_cancelled() {
                info!(completed = index, total, "Batch cancelled");
                break;
            }

            let result = match self.apply_one(path) {
                Ok(()) => {
                    debug!(path = %path.display(), "Updated");
                    UpdateResult::ok(path)
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Update failed");
                    UpdateResult::failed(path, e.to_string())
                }
            };
            results.push(result);
            on_progress(Progress {
                completed: index + 1,
                total,
            });
        }

        let summary = BatchSummary::from_results(&results);
        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Batch finished"
        );
        results
    }
}

/// Apply `updates` to every path without progress reporting.
pub fn apply_to_files(paths: &[PathBuf], updates: &FieldSet) -> Vec<UpdateResult> {
    BatchApply::new(updates).run(paths, |_| {})
}
