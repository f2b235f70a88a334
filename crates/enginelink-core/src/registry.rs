//! The per-process load registry: at most one bind per logical name, ever.
//!
//! The registry owns the whole-process invariants around binding:
//!
//! - concurrent requests for one name serialize behind that name's gate, so
//!   the underlying binder runs at most once per name
//! - a successful bind is permanent; later requests for the same name and
//!   file reuse it, requests for a different file are rejected
//! - a failed bind for a (name, path) pair is recorded and replayed, so
//!   every caller observes the same decided outcome
//!
//! Unrelated names never block each other: the registry map lock is held
//! only long enough to fetch a name's gate, never across a bind.

use std::ffi::c_void;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::gate::{GateMap, lock_recover};
use crate::ports::{BindFailure, NativeBinder, NativeHandle};
use crate::search::SourceKind;

/// Errors from registering a located library.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The name is already bound to a different file. Rebinding is never
    /// allowed because the first library stays mapped for the process
    /// lifetime.
    #[error(
        "{name:?} is already loaded from {loaded_from}; refusing to bind {requested}"
    )]
    AlreadyLoadedDifferentPath {
        name: String,
        loaded_from: PathBuf,
        requested: PathBuf,
    },

    /// Binding failed, either just now or in a recorded earlier attempt for
    /// the same file.
    #[error("binding {name:?} failed: {failure}")]
    Bind { name: String, failure: BindFailure },
}

/// A successfully bound native library.
///
/// Values are only handed out by the [`LoadRegistry`]; each one represents
/// the single successful bind for its logical name in this process. Clones
/// are cheap and share the underlying handle.
#[derive(Debug, Clone)]
pub struct LoadedLibrary {
    logical_name: String,
    path: PathBuf,
    source: SourceKind,
    handle: Arc<dyn NativeHandle>,
}

impl LoadedLibrary {
    /// The name the library was requested under.
    #[must_use]
    pub fn logical_name(&self) -> &str {
        &self.logical_name
    }

    /// Canonical path of the bound file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The source that produced the file.
    #[must_use]
    pub const fn source(&self) -> SourceKind {
        self.source
    }

    /// The bound handle, for FFI call sites.
    #[must_use]
    pub fn handle(&self) -> &Arc<dyn NativeHandle> {
        &self.handle
    }

    /// Raw address of an exported symbol.
    pub fn symbol_address(&self, symbol: &str) -> Result<*const c_void, BindFailure> {
        self.handle.symbol_address(symbol)
    }
}

#[derive(Debug, Default)]
struct NameState {
    bound: Option<LoadedLibrary>,
    failed: Vec<(PathBuf, BindFailure)>,
}

/// Process-wide record of bound libraries, keyed by logical name.
#[derive(Debug, Default)]
pub struct LoadRegistry {
    names: GateMap<NameState>,
}

impl LoadRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `path` under `name`, or reuse/replay the decided outcome.
    ///
    /// Holds the name's gate across the entire decision, including the
    /// binder call, so concurrent requests for one name cannot race the
    /// binder. Paths are compared in canonical form: two spellings of the
    /// same file reuse one bind, a genuinely different file is rejected.
    pub fn bind_or_reuse(
        &self,
        name: &str,
        path: &Path,
        source: SourceKind,
        required_symbols: &[String],
        binder: &dyn NativeBinder,
    ) -> Result<LoadedLibrary, RegistryError> {
        let canonical = canonical_or_given(path);
        let gate = self.names.slot(name);
        let mut state = lock_recover(&gate);

        if let Some(bound) = state.bound.as_ref() {
            if bound.path == canonical {
                debug!(name, path = %canonical.display(), "reusing bound library");
                return Ok(bound.clone());
            }
            return Err(RegistryError::AlreadyLoadedDifferentPath {
                name: name.to_string(),
                loaded_from: bound.path.clone(),
                requested: canonical,
            });
        }

        if let Some((_, failure)) = state.failed.iter().find(|(p, _)| *p == canonical) {
            debug!(name, path = %canonical.display(), "replaying recorded bind failure");
            return Err(RegistryError::Bind {
                name: name.to_string(),
                failure: failure.clone(),
            });
        }

        match binder.bind(&canonical, required_symbols) {
            Ok(handle) => {
                let loaded = LoadedLibrary {
                    logical_name: name.to_string(),
                    path: canonical,
                    source,
                    handle,
                };
                info!(
                    name,
                    path = %loaded.path.display(),
                    source = %loaded.source,
                    "bound native library"
                );
                state.bound = Some(loaded.clone());
                Ok(loaded)
            }
            Err(failure) => {
                state.failed.push((canonical, failure.clone()));
                Err(RegistryError::Bind {
                    name: name.to_string(),
                    failure,
                })
            }
        }
    }

    /// The bound library for `name`, if any.
    pub fn lookup(&self, name: &str) -> Option<LoadedLibrary> {
        let gate = self.names.slot(name);
        let state = lock_recover(&gate);
        state.bound.clone()
    }
}

/// Canonical form of `path`, or the path as given when canonicalization
/// fails (file already gone, permission change). The literal fallback keeps
/// failure bookkeeping deterministic for paths that never existed.
fn canonical_or_given(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[derive(Debug)]
    struct FakeHandle {
        path: PathBuf,
    }

    impl NativeHandle for FakeHandle {
        fn path(&self) -> &Path {
            &self.path
        }

        fn symbol_address(&self, _symbol: &str) -> Result<*const c_void, BindFailure> {
            Ok(std::ptr::null())
        }
    }

    /// Counts binder invocations; optionally fails every bind.
    struct CountingBinder {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingBinder {
        fn succeeding() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: true,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl fmt::Debug for CountingBinder {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("CountingBinder").finish_non_exhaustive()
        }
    }

    impl NativeBinder for CountingBinder {
        fn bind(
            &self,
            path: &Path,
            _required_symbols: &[String],
        ) -> Result<Arc<dyn NativeHandle>, BindFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(BindFailure::NotExecutableFormat {
                    path: path.to_path_buf(),
                    detail: "invalid ELF header".to_string(),
                });
            }
            Ok(Arc::new(FakeHandle {
                path: path.to_path_buf(),
            }))
        }
    }

    #[test]
    fn second_request_reuses_the_first_bind() {
        let registry = LoadRegistry::new();
        let binder = CountingBinder::succeeding();
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("libengine.so");
        fs::write(&file, b"x").unwrap();

        let first = registry
            .bind_or_reuse("engine", &file, SourceKind::WorkingDirectory, &[], &binder)
            .unwrap();
        let second = registry
            .bind_or_reuse("engine", &file, SourceKind::WorkingDirectory, &[], &binder)
            .unwrap();

        assert_eq!(binder.calls(), 1);
        assert!(Arc::ptr_eq(first.handle(), second.handle()));
        assert_eq!(first.path(), second.path());
    }

    #[test]
    fn path_spellings_of_one_file_share_a_bind() {
        let registry = LoadRegistry::new();
        let binder = CountingBinder::succeeding();
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("libengine.so");
        fs::write(&file, b"x").unwrap();
        let dotted = tmp.path().join(".").join("libengine.so");

        let first = registry
            .bind_or_reuse("engine", &file, SourceKind::WorkingDirectory, &[], &binder)
            .unwrap();
        let second = registry
            .bind_or_reuse("engine", &dotted, SourceKind::WorkingDirectory, &[], &binder)
            .unwrap();

        assert_eq!(binder.calls(), 1);
        assert!(Arc::ptr_eq(first.handle(), second.handle()));
    }

    #[cfg(unix)]
    #[test]
    fn symlink_to_the_bound_file_is_the_same_library() {
        let registry = LoadRegistry::new();
        let binder = CountingBinder::succeeding();
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("libengine.so");
        let link = tmp.path().join("alias.so");
        fs::write(&file, b"x").unwrap();
        std::os::unix::fs::symlink(&file, &link).unwrap();

        registry
            .bind_or_reuse("engine", &file, SourceKind::WorkingDirectory, &[], &binder)
            .unwrap();
        let via_link = registry
            .bind_or_reuse("engine", &link, SourceKind::WorkingDirectory, &[], &binder)
            .unwrap();

        assert_eq!(binder.calls(), 1);
        assert_eq!(via_link.path(), fs::canonicalize(&file).unwrap());
    }

    #[test]
    fn different_file_for_a_bound_name_is_rejected() {
        let registry = LoadRegistry::new();
        let binder = CountingBinder::succeeding();
        let tmp = tempfile::tempdir().unwrap();
        let first = tmp.path().join("libengine.so");
        let other = tmp.path().join("libother.so");
        fs::write(&first, b"x").unwrap();
        fs::write(&other, b"y").unwrap();

        registry
            .bind_or_reuse("engine", &first, SourceKind::WorkingDirectory, &[], &binder)
            .unwrap();
        let err = registry
            .bind_or_reuse("engine", &other, SourceKind::Override, &[], &binder)
            .unwrap_err();

        assert_eq!(binder.calls(), 1);
        match err {
            RegistryError::AlreadyLoadedDifferentPath {
                loaded_from,
                requested,
                ..
            } => {
                assert_eq!(loaded_from, fs::canonicalize(&first).unwrap());
                assert_eq!(requested, fs::canonicalize(&other).unwrap());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn bind_failure_is_replayed_without_retrying() {
        let registry = LoadRegistry::new();
        let binder = CountingBinder::failing();
        let path = Path::new("/nonexistent/libengine.so");

        let first = registry
            .bind_or_reuse("engine", path, SourceKind::SystemPath, &[], &binder)
            .unwrap_err();
        let second = registry
            .bind_or_reuse("engine", path, SourceKind::SystemPath, &[], &binder)
            .unwrap_err();

        assert_eq!(binder.calls(), 1);
        assert_eq!(first, second);
    }

    #[test]
    fn failure_for_one_path_does_not_block_another() {
        let registry = LoadRegistry::new();
        let failing = CountingBinder::failing();
        let succeeding = CountingBinder::succeeding();

        registry
            .bind_or_reuse(
                "engine",
                Path::new("/bad/libengine.so"),
                SourceKind::SystemPath,
                &[],
                &failing,
            )
            .unwrap_err();
        let loaded = registry
            .bind_or_reuse(
                "engine",
                Path::new("/good/libengine.so"),
                SourceKind::Override,
                &[],
                &succeeding,
            )
            .unwrap();

        assert_eq!(loaded.path(), Path::new("/good/libengine.so"));
        assert_eq!(succeeding.calls(), 1);
    }

    #[test]
    fn replay_wins_even_with_a_healthier_binder() {
        let registry = LoadRegistry::new();
        let failing = CountingBinder::failing();
        let succeeding = CountingBinder::succeeding();
        let path = Path::new("/flaky/libengine.so");

        registry
            .bind_or_reuse("engine", path, SourceKind::SystemPath, &[], &failing)
            .unwrap_err();
        let replay = registry
            .bind_or_reuse("engine", path, SourceKind::SystemPath, &[], &succeeding)
            .unwrap_err();

        assert_eq!(succeeding.calls(), 0);
        assert!(matches!(replay, RegistryError::Bind { .. }));
    }

    #[test]
    fn names_bind_independently() {
        let registry = LoadRegistry::new();
        let binder = CountingBinder::succeeding();
        let tmp = tempfile::tempdir().unwrap();
        let a = tmp.path().join("liba.so");
        let b = tmp.path().join("libb.so");
        fs::write(&a, b"x").unwrap();
        fs::write(&b, b"y").unwrap();

        registry
            .bind_or_reuse("a", &a, SourceKind::WorkingDirectory, &[], &binder)
            .unwrap();
        registry
            .bind_or_reuse("b", &b, SourceKind::WorkingDirectory, &[], &binder)
            .unwrap();
        assert_eq!(binder.calls(), 2);
    }

    #[test]
    fn concurrent_requests_bind_exactly_once() {
        let registry = Arc::new(LoadRegistry::new());
        let binder = Arc::new(CountingBinder::succeeding());
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("libengine.so");
        fs::write(&file, b"x").unwrap();

        let mut loaded = Vec::new();
        thread::scope(|scope| {
            let mut handles = Vec::new();
            for _ in 0..8 {
                let registry = Arc::clone(&registry);
                let binder = Arc::clone(&binder);
                let file = file.clone();
                handles.push(scope.spawn(move || {
                    registry
                        .bind_or_reuse(
                            "engine",
                            &file,
                            SourceKind::WorkingDirectory,
                            &[],
                            binder.as_ref(),
                        )
                        .unwrap()
                }));
            }
            for handle in handles {
                loaded.push(handle.join().unwrap());
            }
        });

        assert_eq!(binder.calls(), 1);
        let first = &loaded[0];
        assert!(
            loaded
                .iter()
                .all(|lib| Arc::ptr_eq(first.handle(), lib.handle()))
        );
    }

    #[test]
    fn lookup_sees_only_bound_names() {
        let registry = LoadRegistry::new();
        let binder = CountingBinder::succeeding();
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("libengine.so");
        fs::write(&file, b"x").unwrap();

        assert!(registry.lookup("engine").is_none());
        registry
            .bind_or_reuse("engine", &file, SourceKind::WorkingDirectory, &[], &binder)
            .unwrap();
        let found = registry.lookup("engine").unwrap();
        assert_eq!(found.logical_name(), "engine");
        assert!(registry.lookup("other").is_none());
    }
}
