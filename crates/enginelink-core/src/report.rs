//! Per-attempt diagnostics for resolution failures.
//!
//! Every candidate a search rejects becomes one [`Attempt`], and every error
//! the resolver returns carries the ordered list of them. A caller looking at
//! a failure sees the entire search, not just the last step: which sources
//! were consulted, in what order, and the specific reason each candidate was
//! rejected.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::ports::BindFailure;
use crate::search::SourceKind;

/// Why a single candidate was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// No file at the probed path.
    #[error("not found")]
    NotFound,

    /// A symlink whose target does not resolve. Counts as absent; the
    /// search continues rather than failing outright.
    #[error("broken symlink")]
    BrokenSymlink,

    /// The path exists but is not a regular file.
    #[error("not a regular file")]
    NotAFile,

    /// The file exists but the process cannot read it.
    #[error("not readable: {detail}")]
    NotReadable { detail: String },

    /// The source could not produce probes at all (nothing configured).
    #[error("source unavailable: {detail}")]
    SourceUnavailable { detail: String },

    /// A bundled resource was present but could not be materialized.
    #[error("extraction failed: {detail}")]
    ExtractionFailed { detail: String },

    /// The file was found but is not a loadable binary for this platform.
    #[error("not an executable format: {detail}")]
    NotExecutableFormat { detail: String },

    /// The binary loaded but a required entry point is missing.
    #[error("missing symbol {symbol:?}: {detail}")]
    SymbolMissing { symbol: String, detail: String },
}

impl FailureReason {
    /// The trail entry for a failed bind on a located file.
    #[must_use]
    pub fn from_bind(failure: &BindFailure) -> Self {
        match failure {
            BindFailure::NotExecutableFormat { detail, .. } => Self::NotExecutableFormat {
                detail: detail.clone(),
            },
            BindFailure::SymbolMissing { symbol, detail, .. } => Self::SymbolMissing {
                symbol: symbol.clone(),
                detail: detail.clone(),
            },
            BindFailure::Io { detail, .. } => Self::NotReadable {
                detail: detail.clone(),
            },
        }
    }
}

/// One rejected candidate in a search.
///
/// `path` is `None` when the source itself was unavailable and no concrete
/// path was ever probed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attempt {
    pub source: SourceKind,
    pub path: Option<PathBuf>,
    pub reason: FailureReason,
}

impl Attempt {
    #[must_use]
    pub fn new(source: SourceKind, path: impl Into<PathBuf>, reason: FailureReason) -> Self {
        Self {
            source,
            path: Some(path.into()),
            reason,
        }
    }

    /// Attempt recording that a whole source produced no probes.
    #[must_use]
    pub fn source_unavailable(source: SourceKind, detail: impl Into<String>) -> Self {
        Self {
            source,
            path: None,
            reason: FailureReason::SourceUnavailable {
                detail: detail.into(),
            },
        }
    }
}

impl std::fmt::Display for Attempt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{} {}: {}", self.source, path.display(), self.reason),
            None => write!(f, "{}: {}", self.source, self.reason),
        }
    }
}

/// Render a search trail as numbered lines, one per attempt, in probe order.
#[must_use]
pub fn render_trail(attempts: &[Attempt]) -> String {
    use std::fmt::Write;

    let mut out = String::new();
    for (index, attempt) in attempts.iter().enumerate() {
        let _ = writeln!(out, "  {:>2}. {attempt}", index + 1);
    }
    out
}
