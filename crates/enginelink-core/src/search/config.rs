//! Search configuration: sources, their order, and where each one looks.
//!
//! Source precedence is policy, not physics, so everything here is a plain
//! configurable value with the documented defaults. The environment variables
//! are the embedding application's knobs; an explicit `SearchConfig` built in
//! code always beats them.

use std::env;
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::naming::NamingConvention;

/// Environment variable holding an override library path.
///
/// May name a library file directly, or a directory that is joined with each
/// candidate file name. Highest-precedence source by default.
pub const LIBRARY_PATH_ENV: &str = "ENGINELINK_LIBRARY_PATH";

/// Environment variable naming the root under which the process-private
/// extraction directory is created.
pub const EXTRACT_DIR_ENV: &str = "ENGINELINK_EXTRACT_DIR";

/// Where a candidate may come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Explicit override path (config field or `ENGINELINK_LIBRARY_PATH`).
    Override,
    /// The process working directory.
    WorkingDirectory,
    /// A packaged resource, extracted on demand.
    BundledResource,
    /// System library directories and linker-path entries.
    SystemPath,
}

impl SourceKind {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Override => "override",
            Self::WorkingDirectory => "working-directory",
            Self::BundledResource => "bundled-resource",
            Self::SystemPath => "system-path",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Default source precedence: explicit override always wins, the system
/// library path is the last resort.
pub const DEFAULT_SOURCE_ORDER: [SourceKind; 4] = [
    SourceKind::Override,
    SourceKind::WorkingDirectory,
    SourceKind::BundledResource,
    SourceKind::SystemPath,
];

/// Configuration for a library search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    /// Library file or directory consulted before any other source.
    pub override_path: Option<PathBuf>,
    /// Sources in probe order.
    pub sources: Vec<SourceKind>,
    /// Directory used for the working-directory source. `None` means the
    /// process working directory at probe time.
    pub working_dir: Option<PathBuf>,
    /// Directories probed by the system-path source.
    pub system_paths: Vec<PathBuf>,
    /// Root under which the process-private extraction directory is created.
    pub extract_root: PathBuf,
    /// Naming convention to fall back on when the OS is unknown.
    pub fallback_convention: Option<NamingConvention>,
}

impl SearchConfig {
    /// Config with built-in defaults and no environment input.
    ///
    /// System paths are the fixed per-OS install directories only; use
    /// [`SearchConfig::from_env`] to also honor the linker path variable and
    /// the `ENGINELINK_*` overrides.
    #[must_use]
    pub fn new() -> Self {
        Self {
            override_path: None,
            sources: DEFAULT_SOURCE_ORDER.to_vec(),
            working_dir: None,
            system_paths: fixed_system_paths(),
            extract_root: env::temp_dir(),
            fallback_convention: None,
        }
    }

    /// Config honoring the process environment.
    ///
    /// Adds on top of [`SearchConfig::new`]:
    /// - `ENGINELINK_LIBRARY_PATH` as the override path
    /// - the platform linker path entries, ahead of the fixed system dirs
    /// - `ENGINELINK_EXTRACT_DIR` as the extraction root
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::new();

        if let Ok(path) = env::var(LIBRARY_PATH_ENV) {
            if !path.trim().is_empty() {
                config.override_path = Some(PathBuf::from(path));
            }
        }

        let mut system_paths = linker_path_entries();
        system_paths.append(&mut config.system_paths);
        config.system_paths = system_paths;

        if let Ok(root) = env::var(EXTRACT_DIR_ENV) {
            if !root.trim().is_empty() {
                config.extract_root = PathBuf::from(root);
            }
        }

        config
    }

    #[must_use]
    pub fn with_override_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.override_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_sources(mut self, sources: Vec<SourceKind>) -> Self {
        self.sources = sources;
        self
    }

    #[must_use]
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn with_system_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.system_paths = paths;
        self
    }

    #[must_use]
    pub fn with_extract_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.extract_root = root.into();
        self
    }

    #[must_use]
    pub const fn with_fallback_convention(mut self, convention: NamingConvention) -> Self {
        self.fallback_convention = Some(convention);
        self
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Name of the platform linker search path variable.
#[must_use]
pub const fn linker_path_variable() -> &'static str {
    if cfg!(target_os = "windows") {
        "PATH"
    } else if cfg!(target_os = "macos") {
        "DYLD_LIBRARY_PATH"
    } else {
        "LD_LIBRARY_PATH"
    }
}

/// Entries of the platform linker search path variable.
fn linker_path_entries() -> Vec<PathBuf> {
    env::var_os(linker_path_variable())
        .map(|raw| env::split_paths(&raw).filter(|p| !p.as_os_str().is_empty()).collect())
        .unwrap_or_default()
}

/// Fixed per-OS library install directories.
fn fixed_system_paths() -> Vec<PathBuf> {
    if cfg!(target_os = "macos") {
        vec![
            PathBuf::from("/usr/local/lib"),
            PathBuf::from("/opt/homebrew/lib"),
        ]
    } else if cfg!(target_os = "linux") {
        let mut paths = vec![PathBuf::from("/usr/local/lib"), PathBuf::from("/usr/lib")];
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".local/lib"));
        }
        paths
    } else {
        Vec::new()
    }
}
