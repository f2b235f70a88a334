//! `libloading`-backed implementation of the binder port.
//!
//! This is the single place the workspace touches the OS dynamic loader.
//! The core crate decides *what* to bind; this adapter performs the bind and
//! pins the mapping for the rest of the process lifetime.

use std::ffi::c_void;
use std::fmt;
use std::fs::File;
use std::mem::ManuallyDrop;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use libloading::Library;
use tracing::debug;

use enginelink_core::{BindFailure, NativeBinder, NativeHandle};

/// Production binder: binds located files with the platform dynamic loader
/// (`dlopen` on Unix-likes, `LoadLibraryW` on Windows).
#[derive(Debug, Clone, Copy, Default)]
pub struct DlBinder;

impl DlBinder {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl NativeBinder for DlBinder {
    fn bind(
        &self,
        path: &Path,
        required_symbols: &[String],
    ) -> Result<Arc<dyn NativeHandle>, BindFailure> {
        // SAFETY: loading a library runs its initializers; that is the point
        // of binding a native engine. The resolver only hands over files it
        // located and could read.
        let library =
            unsafe { Library::new(path) }.map_err(|e| classify_open_failure(path, &e))?;

        let handle = EngineLibrary {
            path: path.to_path_buf(),
            library: ManuallyDrop::new(library),
        };

        // Verify every required entry point up front; the first miss fails
        // the whole bind
        for symbol in required_symbols {
            handle.symbol_address(symbol)?;
        }

        debug!(
            path = %path.display(),
            symbols = required_symbols.len(),
            "bound library via dynamic loader"
        );
        Ok(Arc::new(handle))
    }
}

/// An open failure on a readable file means the loader rejected the image
/// itself (wrong architecture, corrupt file); anything else is I/O.
fn classify_open_failure(path: &Path, error: &libloading::Error) -> BindFailure {
    match File::open(path) {
        Ok(_) => BindFailure::NotExecutableFormat {
            path: path.to_path_buf(),
            detail: error.to_string(),
        },
        Err(io) => BindFailure::Io {
            path: path.to_path_buf(),
            detail: format!("{error} ({io})"),
        },
    }
}

/// A bound library, pinned for the process lifetime.
///
/// The wrapped [`Library`] sits in [`ManuallyDrop`]: closing it would unmap
/// the engine while FFI pointers into it may still be live, so the mapping
/// is deliberately kept until process exit. The core registry guarantees at
/// most one `EngineLibrary` exists per logical name.
pub struct EngineLibrary {
    path: PathBuf,
    library: ManuallyDrop<Library>,
}

impl NativeHandle for EngineLibrary {
    fn path(&self) -> &Path {
        &self.path
    }

    fn symbol_address(&self, symbol: &str) -> Result<*const c_void, BindFailure> {
        // SAFETY: the export is only read as an address, never called here.
        // The address cannot dangle because the library is never unloaded.
        let address = unsafe { self.library.get::<*mut c_void>(symbol.as_bytes()) }.map_err(
            |e| BindFailure::SymbolMissing {
                path: self.path.clone(),
                symbol: symbol.to_string(),
                detail: e.to_string(),
            },
        )?;
        Ok((*address).cast_const())
    }
}

impl fmt::Debug for EngineLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineLibrary")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Typed view of an exported symbol from a bound handle.
///
/// # Safety
///
/// `T` must be a pointer-sized type matching the exported item; for
/// functions, the full `extern "C"` signature. Calling through a mistyped
/// symbol is undefined behavior.
pub unsafe fn symbol<T: Copy>(handle: &dyn NativeHandle, name: &str) -> Result<T, BindFailure> {
    let address = handle.symbol_address(name)?;
    // SAFETY: the caller guarantees T is pointer-sized and matches the
    // export; the address stays valid because bound libraries are never
    // unloaded.
    Ok(unsafe { std::mem::transmute_copy::<*const c_void, T>(&address) })
}
