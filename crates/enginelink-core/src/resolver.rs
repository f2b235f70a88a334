//! The top-level resolve pipeline: identity, candidates, locate, bind.
//!
//! `Resolver` composes the other modules and owns the policy decisions that
//! tie them together:
//!
//! - every stage short-circuits, and every error carries the complete prior
//!   search trail, so one failure explains the whole search
//! - a bind failure is terminal for the call; falling through to another
//!   source after a broken binary would mask a deployment defect, while a
//!   locate miss is expected fallback
//! - resolution is repeatable: a second resolve for a bound name re-walks
//!   the search and reuses the recorded bind, which is what lets a changed
//!   environment surface [`ResolveError::AlreadyLoadedDifferentPath`]
//!   instead of silently returning a stale handle

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::bundle::{DirBundle, ResourceBundle, default_bundle_root};
use crate::naming::{self, NamingError};
use crate::platform::{OsKind, PlatformIdentity, identify};
use crate::ports::{BindFailure, NativeBinder};
use crate::registry::{LoadRegistry, LoadedLibrary, RegistryError};
use crate::report::{Attempt, FailureReason, render_trail};
use crate::search::{ExtractionArea, Located, SearchConfig, SearchExhausted, SourceKind, locate};

/// A resolve request: the logical name plus the entry points that must be
/// present for the bind to count as successful.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub name: String,
    pub required_symbols: Vec<String>,
}

impl LoadRequest {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required_symbols: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_required_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.required_symbols.push(symbol.into());
        self
    }
}

/// Errors from [`Resolver::resolve`].
///
/// Variants produced after the search started carry the full trail; the
/// two pre-search variants ([`InvalidName`](Self::InvalidName),
/// [`UnsupportedPlatform`](Self::UnsupportedPlatform)) have an empty one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The logical name is not usable as a file-name stem.
    #[error("invalid logical library name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },

    /// No naming convention for this OS and no fallback configured.
    #[error("no library naming convention for os {os} and no fallback configured")]
    UnsupportedPlatform { os: OsKind },

    /// Every source was searched and nothing readable was found.
    #[error("library {name:?} not found ({} candidates rejected)", attempts.len())]
    NotFound { name: String, attempts: Vec<Attempt> },

    /// A located file failed to bind. Terminal: no further source is tried.
    #[error("library {name:?} failed to bind: {failure}")]
    Bind {
        name: String,
        failure: BindFailure,
        attempts: Vec<Attempt>,
    },

    /// The name is already bound to a different file in this process.
    #[error("library {name:?} is already loaded from {loaded_from}; refusing to bind {requested}")]
    AlreadyLoadedDifferentPath {
        name: String,
        loaded_from: PathBuf,
        requested: PathBuf,
        attempts: Vec<Attempt>,
    },
}

impl ResolveError {
    /// The search trail: every rejected candidate, in probe order.
    #[must_use]
    pub fn attempts(&self) -> &[Attempt] {
        match self {
            Self::InvalidName { .. } | Self::UnsupportedPlatform { .. } => &[],
            Self::NotFound { attempts, .. }
            | Self::Bind { attempts, .. }
            | Self::AlreadyLoadedDifferentPath { attempts, .. } => attempts,
        }
    }

    /// The trail rendered as numbered lines, for logs and CLI output.
    #[must_use]
    pub fn search_trail(&self) -> String {
        render_trail(self.attempts())
    }
}

/// Serializable two-state summary of a resolution.
///
/// [`LoadedLibrary`] itself holds a live native handle and cannot be
/// serialized; this is the machine-readable projection of a resolve result.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResolutionOutcome {
    Loaded {
        name: String,
        path: PathBuf,
        source: SourceKind,
    },
    Failed {
        name: String,
        error: String,
        attempts: Vec<Attempt>,
    },
}

impl ResolutionOutcome {
    /// Project a resolve result for `name` into its serializable summary.
    #[must_use]
    pub fn summarize(name: &str, result: &Result<LoadedLibrary, ResolveError>) -> Self {
        match result {
            Ok(loaded) => Self::Loaded {
                name: loaded.logical_name().to_string(),
                path: loaded.path().to_path_buf(),
                source: loaded.source(),
            },
            Err(error) => Self::Failed {
                name: name.to_string(),
                error: error.to_string(),
                attempts: error.attempts().to_vec(),
            },
        }
    }
}

/// Resolves logical library names to bound native libraries.
///
/// One resolver owns one search configuration and one extraction area.
/// The registry is shared (`Arc`), so independent resolvers can be pointed
/// at the same per-process load state with
/// [`with_registry`](Self::with_registry).
pub struct Resolver {
    identity: PlatformIdentity,
    config: SearchConfig,
    bundle: Option<Arc<dyn ResourceBundle>>,
    extraction: ExtractionArea,
    registry: Arc<LoadRegistry>,
    binder: Arc<dyn NativeBinder>,
}

impl Resolver {
    /// Resolver with an explicit configuration and nothing taken from the
    /// process environment. No bundle is attached.
    #[must_use]
    pub fn new(config: SearchConfig, binder: Arc<dyn NativeBinder>) -> Self {
        Self {
            identity: identify(),
            extraction: ExtractionArea::new(config.extract_root.clone()),
            config,
            bundle: None,
            registry: Arc::new(LoadRegistry::new()),
            binder,
        }
    }

    /// Resolver wired for the current process: detected identity,
    /// environment-driven configuration, and the default bundle root when
    /// one exists.
    #[must_use]
    pub fn from_env(binder: Arc<dyn NativeBinder>) -> Self {
        let mut resolver = Self::new(SearchConfig::from_env(), binder);
        if let Some(root) = default_bundle_root() {
            resolver.bundle = Some(Arc::new(DirBundle::new(root)));
        }
        resolver
    }

    /// Replace the platform identity (cross-identity planning and tests).
    #[must_use]
    pub fn with_identity(mut self, identity: PlatformIdentity) -> Self {
        self.identity = identity;
        self
    }

    /// Replace the search configuration. The extraction area follows the
    /// new config's extraction root.
    #[must_use]
    pub fn with_config(mut self, config: SearchConfig) -> Self {
        self.extraction = ExtractionArea::new(config.extract_root.clone());
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_bundle(mut self, bundle: Arc<dyn ResourceBundle>) -> Self {
        self.bundle = Some(bundle);
        self
    }

    #[must_use]
    pub fn without_bundle(mut self) -> Self {
        self.bundle = None;
        self
    }

    /// Share another resolver's load registry instead of this one's own.
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<LoadRegistry>) -> Self {
        self.registry = registry;
        self
    }

    #[must_use]
    pub const fn identity(&self) -> PlatformIdentity {
        self.identity
    }

    #[must_use]
    pub const fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Handle on the process load state, shareable with other resolvers.
    #[must_use]
    pub fn registry(&self) -> Arc<LoadRegistry> {
        Arc::clone(&self.registry)
    }

    /// Resolve `name` with no required symbols.
    pub fn resolve(&self, name: &str) -> Result<LoadedLibrary, ResolveError> {
        self.resolve_with(LoadRequest::new(name))
    }

    /// Resolve a full request: search the configured sources and bind the
    /// first usable candidate.
    pub fn resolve_with(&self, request: LoadRequest) -> Result<LoadedLibrary, ResolveError> {
        let LoadRequest {
            name,
            required_symbols,
        } = request;

        let candidates =
            naming::candidate_filenames(&name, self.identity, self.config.fallback_convention)
                .map_err(|e| match e {
                    NamingError::InvalidName { name, reason } => {
                        ResolveError::InvalidName { name, reason }
                    }
                    NamingError::UnsupportedPlatform { os } => {
                        ResolveError::UnsupportedPlatform { os }
                    }
                })?;
        debug!(name = %name, candidates = candidates.len(), "resolving native library");

        let Located {
            path,
            source,
            mut attempts,
        } = locate(
            &candidates,
            &self.config,
            self.bundle.as_deref(),
            &self.extraction,
        )
        .map_err(|SearchExhausted { attempts }| ResolveError::NotFound {
            name: name.clone(),
            attempts,
        })?;

        match self
            .registry
            .bind_or_reuse(&name, &path, source, &required_symbols, self.binder.as_ref())
        {
            Ok(loaded) => Ok(loaded),
            Err(RegistryError::AlreadyLoadedDifferentPath {
                name,
                loaded_from,
                requested,
            }) => Err(ResolveError::AlreadyLoadedDifferentPath {
                name,
                loaded_from,
                requested,
                attempts,
            }),
            Err(RegistryError::Bind { name, failure }) => {
                attempts.push(Attempt::new(source, path, FailureReason::from_bind(&failure)));
                Err(ResolveError::Bind {
                    name,
                    failure,
                    attempts,
                })
            }
        }
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("identity", &self.identity)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
