//! Scoped extraction of bundled binaries.
//!
//! Bundled resources are materialized into one process-private directory,
//! created lazily under the configured extraction root. Each resource is
//! extracted at most once per process: concurrent resolvers for the same
//! resource serialize behind a per-resource gate and reuse the first result.
//!
//! Extraction is atomic with respect to other resolvers in this process: the
//! resource is written to a temp sibling and renamed into place, so a reader
//! never observes a half-written binary.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;
use tracing::debug;

use crate::bundle::ResourceBundle;
use crate::gate::{GateMap, lock_recover};

/// Errors from materializing a bundled resource.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The extraction directory could not be created.
    #[error("failed to create extraction directory {path}: {reason}")]
    CreateDirFailed { path: PathBuf, reason: String },

    /// The bundle failed to produce the resource bytes.
    #[error("failed to extract resource {resource:?}: {reason}")]
    Bundle { resource: String, reason: String },

    /// Permissions or rename on the extracted file failed.
    #[error("failed to finalize extracted file {path}: {reason}")]
    FinalizeFailed { path: PathBuf, reason: String },
}

#[derive(Default)]
struct ExtractSlot {
    extracted: Option<PathBuf>,
}

/// Process-private extraction area for bundled binaries.
///
/// Dropping the area removes the extraction directory best-effort; a binary
/// already bound from it stays mapped (the loader never unloads), so cleanup
/// is safe on normal process exit and a failure to clean up is only logged.
pub struct ExtractionArea {
    root: PathBuf,
    dir: Mutex<Option<PathBuf>>,
    gates: GateMap<ExtractSlot>,
}

impl ExtractionArea {
    /// Area rooted at `root`. Nothing is created until the first extraction.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            dir: Mutex::new(None),
            gates: GateMap::new(),
        }
    }

    /// The private directory, creating it on first use.
    fn extraction_dir(&self) -> Result<PathBuf, ExtractError> {
        let mut slot = lock_recover(&self.dir);
        if let Some(dir) = slot.as_ref() {
            return Ok(dir.clone());
        }

        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_nanos());
        let dir = self
            .root
            .join(format!("enginelink-{}-{}", process::id(), nanos));
        fs::create_dir_all(&dir).map_err(|e| ExtractError::CreateDirFailed {
            path: dir.clone(),
            reason: e.to_string(),
        })?;

        // Private to this user: the directory holds executable code
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&dir, fs::Permissions::from_mode(0o700)).map_err(|e| {
                ExtractError::CreateDirFailed {
                    path: dir.clone(),
                    reason: e.to_string(),
                }
            })?;
        }

        debug!(dir = %dir.display(), "created extraction directory");
        *slot = Some(dir.clone());
        Ok(dir)
    }

    /// Materialize `resource` from `bundle`, at most once per process.
    ///
    /// The first caller for a resource performs the extraction while holding
    /// that resource's gate; every later or concurrent caller gets the same
    /// extracted path without touching the bundle again.
    pub fn materialize_once(
        &self,
        bundle: &dyn ResourceBundle,
        resource: &str,
    ) -> Result<PathBuf, ExtractError> {
        let gate = self.gates.slot(resource);
        let mut state = lock_recover(&gate);

        if let Some(path) = state.extracted.as_ref() {
            if path.is_file() {
                return Ok(path.clone());
            }
            // Someone removed the extracted file; fall through and redo it
        }

        let dir = self.extraction_dir()?;
        let dest = dir.join(resource);
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_nanos());
        let tmp = dir.join(format!(".{resource}.tmp-{nanos}"));

        bundle
            .materialize(resource, &tmp)
            .map_err(|e| ExtractError::Bundle {
                resource: resource.to_string(),
                reason: e.to_string(),
            })?;

        // The extracted file is a shared library; mark it executable
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tmp, fs::Permissions::from_mode(0o755)).map_err(|e| {
                ExtractError::FinalizeFailed {
                    path: tmp.clone(),
                    reason: e.to_string(),
                }
            })?;
        }

        fs::rename(&tmp, &dest).map_err(|e| ExtractError::FinalizeFailed {
            path: dest.clone(),
            reason: e.to_string(),
        })?;

        debug!(resource, path = %dest.display(), "extracted bundled resource");
        state.extracted = Some(dest.clone());
        Ok(dest)
    }
}

impl Drop for ExtractionArea {
    fn drop(&mut self) {
        let dir = self
            .dir
            .get_mut()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take();
        if let Some(dir) = dir {
            if let Err(e) = fs::remove_dir_all(&dir) {
                // Best-effort only; never an error
                debug!(dir = %dir.display(), error = %e, "extraction cleanup failed");
            }
        }
    }
}

impl std::fmt::Debug for ExtractionArea {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractionArea")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}
