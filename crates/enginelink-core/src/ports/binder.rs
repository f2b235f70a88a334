//! Native binder port: the one seam between the pure search logic and the
//! OS dynamic loader.
//!
//! # Design Notes
//!
//! - Core owns the trait and error types (pure, no unsafe)
//! - The adapter crate (`enginelink-loader`) owns the dlopen implementation
//! - Tests substitute in-memory fakes, so the whole resolution pipeline runs
//!   without touching a real dynamic loader

use std::ffi::c_void;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

/// Ways a native bind can fail.
///
/// `Clone + PartialEq` matter here: a decided failure for a path is recorded
/// by the registry and replayed to every later caller for that same path, so
/// all of them observe one identical outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindFailure {
    /// The file exists and is readable but is not a loadable binary for
    /// this platform (wrong architecture packaged by mistake, or corrupt).
    #[error("{path} is not a loadable binary: {detail}")]
    NotExecutableFormat { path: PathBuf, detail: String },

    /// The binary loaded but a required entry point is absent. Signals a
    /// version mismatch between the binding and the native library.
    #[error("{path} is missing required symbol {symbol:?}: {detail}")]
    SymbolMissing {
        path: PathBuf,
        symbol: String,
        detail: String,
    },

    /// The file could not be opened or mapped at all.
    #[error("failed to open {path}: {detail}")]
    Io { path: PathBuf, detail: String },
}

/// A bound native library, usable by FFI call sites.
///
/// Handles are shared (`Arc`) and live until process exit; no unload
/// operation exists anywhere in this API.
pub trait NativeHandle: Send + Sync + fmt::Debug {
    /// The path the library was bound from.
    fn path(&self) -> &Path;

    /// Raw address of an exported symbol.
    ///
    /// The returned pointer stays valid for the process lifetime because a
    /// bound library is never unloaded. Interpreting it as a callable is the
    /// FFI call site's concern.
    fn symbol_address(&self, symbol: &str) -> Result<*const c_void, BindFailure>;
}

/// Port that binds a located file into the process.
pub trait NativeBinder: Send + Sync {
    /// Bind the library at `path` and verify `required_symbols` resolve.
    ///
    /// The first missing symbol fails the whole bind; a handle is returned
    /// only when every required entry point is present.
    fn bind(
        &self,
        path: &Path,
        required_symbols: &[String],
    ) -> Result<Arc<dyn NativeHandle>, BindFailure>;
}
