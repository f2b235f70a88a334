//! Library search: configuration, probing, extraction, and planning.
//!
//! The search layer turns "a logical name and a platform identity" into "a
//! readable file on disk", walking an ordered set of sources and recording
//! an attempt for everything it rejects along the way.
//!
//! # Design
//!
//! - Sources are probed in the configured order; within a source, candidate
//!   file names keep builder order (most-specific-first).
//! - Misses continue the search; only the bind stage fails fast.
//! - Bundled binaries are extracted once per process into a private
//!   directory and reused by later resolutions.

mod config;
mod extract;
mod locate;
mod plan;

pub use config::{
    DEFAULT_SOURCE_ORDER, EXTRACT_DIR_ENV, LIBRARY_PATH_ENV, SearchConfig, SourceKind,
    linker_path_variable,
};
pub use extract::{ExtractError, ExtractionArea};
pub use locate::{Located, SearchExhausted, locate};
pub use plan::{PlannedProbe, ResolutionPlan};
