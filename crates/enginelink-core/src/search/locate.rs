//! The ordered probe loop: walk sources, probe candidates, record misses.
//!
//! A candidate is "located" only when it is a readable regular file (after
//! following symlinks). Everything else is recorded as an [`Attempt`] and the
//! search moves on; locate itself never fails fast. Sources that cannot
//! produce probes at all (no override configured, no bundle, empty system
//! path list) still contribute one attempt each, so an exhausted trail always
//! accounts for every configured source.

use std::env;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::bundle::ResourceBundle;
use crate::report::{Attempt, FailureReason};

use super::config::{SearchConfig, SourceKind};
use super::extract::ExtractionArea;

/// A usable candidate file, ready for binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
    /// Readable regular file holding the library.
    pub path: PathBuf,
    /// Source that produced the file.
    pub source: SourceKind,
    /// Rejections recorded before this hit, in probe order.
    pub attempts: Vec<Attempt>,
}

/// Every configured source was consulted and no candidate was usable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no usable candidate in any source ({} attempts)", attempts.len())]
pub struct SearchExhausted {
    pub attempts: Vec<Attempt>,
}

/// Walk `config.sources` in order, probing each source's candidates.
///
/// Returns the first usable file together with the trail of everything
/// rejected before it.
pub fn locate(
    candidates: &[String],
    config: &SearchConfig,
    bundle: Option<&dyn ResourceBundle>,
    extraction: &ExtractionArea,
) -> Result<Located, SearchExhausted> {
    let mut attempts = Vec::new();

    for source in &config.sources {
        let hit = match source {
            SourceKind::Override => probe_override(candidates, config, &mut attempts),
            SourceKind::WorkingDirectory => probe_working_dir(candidates, config, &mut attempts),
            SourceKind::BundledResource => {
                probe_bundle(candidates, bundle, extraction, &mut attempts)
            }
            SourceKind::SystemPath => probe_system_paths(candidates, config, &mut attempts),
        };
        if let Some(path) = hit {
            debug!(source = %source, path = %path.display(), "located library candidate");
            return Ok(Located {
                path,
                source: *source,
                attempts,
            });
        }
    }

    Err(SearchExhausted { attempts })
}

enum Probe {
    Usable,
    Rejected(FailureReason),
}

/// Classify one path. Symlinks are followed; a dangling link counts as
/// absent, not as an error.
fn probe_file(path: &Path) -> Probe {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Probe::Rejected(FailureReason::NotFound);
        }
        Err(e) => {
            return Probe::Rejected(FailureReason::NotReadable {
                detail: e.to_string(),
            });
        }
    };

    if meta.file_type().is_symlink() {
        match fs::metadata(path) {
            Ok(target) if target.is_file() => {}
            Ok(_) => return Probe::Rejected(FailureReason::NotAFile),
            Err(_) => return Probe::Rejected(FailureReason::BrokenSymlink),
        }
    } else if !meta.is_file() {
        return Probe::Rejected(FailureReason::NotAFile);
    }

    // Readability is part of "located"; an unreadable file would otherwise
    // surface later as a confusing bind error.
    match File::open(path) {
        Ok(_) => Probe::Usable,
        Err(e) => Probe::Rejected(FailureReason::NotReadable {
            detail: e.to_string(),
        }),
    }
}

fn probe_one(source: SourceKind, path: PathBuf, attempts: &mut Vec<Attempt>) -> Option<PathBuf> {
    match probe_file(&path) {
        Probe::Usable => Some(path),
        Probe::Rejected(reason) => {
            debug!(source = %source, path = %path.display(), %reason, "candidate rejected");
            attempts.push(Attempt::new(source, path, reason));
            None
        }
    }
}

fn probe_dir(
    source: SourceKind,
    dir: &Path,
    candidates: &[String],
    attempts: &mut Vec<Attempt>,
) -> Option<PathBuf> {
    for candidate in candidates {
        if let Some(path) = probe_one(source, dir.join(candidate), attempts) {
            return Some(path);
        }
    }
    None
}

fn probe_override(
    candidates: &[String],
    config: &SearchConfig,
    attempts: &mut Vec<Attempt>,
) -> Option<PathBuf> {
    let Some(base) = config.override_path.as_ref() else {
        attempts.push(Attempt::source_unavailable(
            SourceKind::Override,
            "no override path configured",
        ));
        return None;
    };

    // A directory override holds candidates; a file override names the
    // library directly and skips candidate matching.
    if base.is_dir() {
        probe_dir(SourceKind::Override, base, candidates, attempts)
    } else {
        probe_one(SourceKind::Override, base.clone(), attempts)
    }
}

fn probe_working_dir(
    candidates: &[String],
    config: &SearchConfig,
    attempts: &mut Vec<Attempt>,
) -> Option<PathBuf> {
    let dir = match config.working_dir.clone().map_or_else(env::current_dir, Ok) {
        Ok(dir) => dir,
        Err(e) => {
            attempts.push(Attempt::source_unavailable(
                SourceKind::WorkingDirectory,
                format!("working directory unavailable: {e}"),
            ));
            return None;
        }
    };
    probe_dir(SourceKind::WorkingDirectory, &dir, candidates, attempts)
}

fn probe_bundle(
    candidates: &[String],
    bundle: Option<&dyn ResourceBundle>,
    extraction: &ExtractionArea,
    attempts: &mut Vec<Attempt>,
) -> Option<PathBuf> {
    let Some(bundle) = bundle else {
        attempts.push(Attempt::source_unavailable(
            SourceKind::BundledResource,
            "no bundle configured",
        ));
        return None;
    };

    for candidate in candidates {
        if !bundle.contains(candidate) {
            attempts.push(Attempt::new(
                SourceKind::BundledResource,
                candidate,
                FailureReason::NotFound,
            ));
            continue;
        }
        match extraction.materialize_once(bundle, candidate) {
            Ok(extracted) => {
                if let Some(path) = probe_one(SourceKind::BundledResource, extracted, attempts) {
                    return Some(path);
                }
            }
            Err(e) => {
                debug!(resource = %candidate, error = %e, "bundled resource failed to extract");
                attempts.push(Attempt::new(
                    SourceKind::BundledResource,
                    candidate,
                    FailureReason::ExtractionFailed {
                        detail: e.to_string(),
                    },
                ));
            }
        }
    }
    None
}

fn probe_system_paths(
    candidates: &[String],
    config: &SearchConfig,
    attempts: &mut Vec<Attempt>,
) -> Option<PathBuf> {
    if config.system_paths.is_empty() {
        attempts.push(Attempt::source_unavailable(
            SourceKind::SystemPath,
            "no system paths configured",
        ));
        return None;
    }
    for dir in &config.system_paths {
        if let Some(path) = probe_dir(SourceKind::SystemPath, dir, candidates, attempts) {
            return Some(path);
        }
    }
    None
}
