//! Bundled native binaries as a port.
//!
//! A `ResourceBundle` answers "is this resource packaged?" and copies a
//! packaged resource to a destination file. The two adapters here cover the
//! common shapes: a directory of binaries shipped next to the application,
//! and bytes embedded in the executable via `include_bytes!`.
//!
//! Bundles never load anything. Extraction and binding are handled by the
//! search and registry layers.

use std::borrow::Cow;
use std::collections::HashMap;
use std::env;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Environment variable naming a directory-backed bundle root.
pub const BUNDLE_DIR_ENV: &str = "ENGINELINK_BUNDLE_DIR";

/// Errors from bundle access and materialization.
#[derive(Debug, Error)]
pub enum BundleError {
    /// The requested resource is not packaged in this bundle.
    #[error("resource {resource:?} is not present in the bundle")]
    Missing { resource: String },

    /// The packaged resource exists but could not be read.
    #[error("failed to read resource {resource:?}: {reason}")]
    ReadFailed { resource: String, reason: String },

    /// The destination file could not be written.
    #[error("failed to write {path}: {reason}")]
    WriteFailed { path: PathBuf, reason: String },
}

/// Port for packaged native binaries.
///
/// Resource names are the candidate file names produced by the name builder,
/// so they are always single path components.
pub trait ResourceBundle: Send + Sync {
    /// Whether `resource` is packaged in this bundle.
    fn contains(&self, resource: &str) -> bool;

    /// Write the complete resource to `dest`.
    ///
    /// `dest` is a fresh, process-private file chosen by the extraction
    /// layer; implementations overwrite it if it exists.
    fn materialize(&self, resource: &str, dest: &Path) -> Result<(), BundleError>;
}

// Resource keys with path structure never match anything; candidate names
// are validated upstream, but bundles are also a public API.
fn is_single_component(resource: &str) -> bool {
    !resource.is_empty()
        && !resource.contains('/')
        && !resource.contains('\\')
        && resource != "."
        && resource != ".."
}

/// Bundle backed by a directory of packaged binaries on disk.
#[derive(Debug, Clone)]
pub struct DirBundle {
    root: PathBuf,
}

impl DirBundle {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ResourceBundle for DirBundle {
    fn contains(&self, resource: &str) -> bool {
        is_single_component(resource) && self.root.join(resource).is_file()
    }

    fn materialize(&self, resource: &str, dest: &Path) -> Result<(), BundleError> {
        if !self.contains(resource) {
            return Err(BundleError::Missing {
                resource: resource.to_string(),
            });
        }
        let src_path = self.root.join(resource);
        let mut src = File::open(&src_path).map_err(|e| BundleError::ReadFailed {
            resource: resource.to_string(),
            reason: e.to_string(),
        })?;
        let mut out = File::create(dest).map_err(|e| BundleError::WriteFailed {
            path: dest.to_path_buf(),
            reason: e.to_string(),
        })?;
        io::copy(&mut src, &mut out).map_err(|e| BundleError::WriteFailed {
            path: dest.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(())
    }
}

/// Bundle of byte blobs embedded in the executable.
///
/// Built up at composition time, typically from `include_bytes!`:
///
/// ```
/// use enginelink_core::bundle::{ResourceBundle, StaticBundle};
///
/// let bundle = StaticBundle::new()
///     .with_resource("engine-core-x86_64", &b"\x7fELF..."[..]);
/// assert!(bundle.contains("engine-core-x86_64"));
/// ```
#[derive(Debug, Default)]
pub struct StaticBundle {
    resources: HashMap<String, Cow<'static, [u8]>>,
}

impl StaticBundle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_resource(
        mut self,
        name: impl Into<String>,
        bytes: impl Into<Cow<'static, [u8]>>,
    ) -> Self {
        self.resources.insert(name.into(), bytes.into());
        self
    }
}

impl ResourceBundle for StaticBundle {
    fn contains(&self, resource: &str) -> bool {
        is_single_component(resource) && self.resources.contains_key(resource)
    }

    fn materialize(&self, resource: &str, dest: &Path) -> Result<(), BundleError> {
        let bytes = self
            .resources
            .get(resource)
            .filter(|_| is_single_component(resource))
            .ok_or_else(|| BundleError::Missing {
                resource: resource.to_string(),
            })?;
        fs::write(dest, bytes).map_err(|e| BundleError::WriteFailed {
            path: dest.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

/// Default bundle root for the current process, if any.
///
/// Resolution order:
/// 1. `ENGINELINK_BUNDLE_DIR` environment variable
/// 2. `native/` under the source repository, when running from it
/// 3. `bundle/` beside the executable
///
/// Returns `None` when nothing is configured, which makes the
/// bundled-resource source report itself unavailable instead of failing.
#[must_use]
pub fn default_bundle_root() -> Option<PathBuf> {
    if let Ok(dir) = env::var(BUNDLE_DIR_ENV) {
        if !dir.trim().is_empty() {
            return Some(PathBuf::from(dir));
        }
    }

    if let Some(repo) = detect_local_repo() {
        let native = repo.join("native");
        if native.is_dir() {
            return Some(native);
        }
    }

    if let Ok(exe) = env::current_exe() {
        if let Some(dir) = exe.parent() {
            let beside = dir.join("bundle");
            if beside.is_dir() {
                return Some(beside);
            }
        }
    }

    None
}

/// Detect if we are running from the local repository.
///
/// Returns `Some(path)` in a dev environment or when a release build runs
/// from within the source repo. Returns `None` for a standalone binary
/// (installed via cargo install, downloaded, or app-bundled).
#[allow(clippy::unnecessary_wraps)] // Option is needed for release builds
fn detect_local_repo() -> Option<PathBuf> {
    let repo_root = PathBuf::from(env!("ENGINELINK_REPO_ROOT"));

    #[cfg(debug_assertions)]
    {
        // In debug mode, always assume we want the repo we are building from
        Some(repo_root)
    }

    #[cfg(not(debug_assertions))]
    {
        // In release mode, check if this binary was built from a local repo.
        if !repo_root.exists()
            || (!repo_root.join(".git").exists() && !repo_root.join("Cargo.toml").exists())
        {
            return None;
        }

        // Strategy 1: the marker file written by build.rs
        let marker_file = repo_root.join("data").join(".enginelink_repo_path");
        if marker_file.exists() {
            if let Ok(contents) = fs::read_to_string(&marker_file) {
                if contents.trim() == repo_root.to_string_lossy() {
                    return Some(repo_root);
                }
            }
        }

        // Strategy 2 (fallback): the executable lives inside the repo
        if let Ok(exe_path) = env::current_exe() {
            if let Ok(canonical_exe) = exe_path.canonicalize() {
                if let Ok(canonical_repo) = repo_root.canonicalize() {
                    if canonical_exe.starts_with(&canonical_repo) {
                        return Some(repo_root);
                    }
                }
            }
        }

        None
    }
}
