//! End-to-end resolution through the public API.
//!
//! Everything runs against temp directories and in-memory fakes; the native
//! binder is the only substituted port, so these tests exercise the real
//! candidate building, source walking, extraction, and registry code paths.
//!
//! # What is tested
//!
//! - A system-path-only hit still reports every earlier source as attempted,
//!   in precedence order
//! - N concurrent resolves of one name produce exactly one bind and N
//!   shared handles
//! - N concurrent resolves of a corrupt library produce exactly one bind
//!   attempt and N identical failures
//! - A name bound once cannot be rebound from a different path, even when
//!   the second resolver finds its copy through a bundle
//! - A bundled resource is extracted once into a process-private directory
//!   and reused by later resolves without re-extracting or re-binding

use std::ffi::c_void;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use enginelink_core::{
    AbiVariant, ArchKind, BindFailure, BundleError, ExtractionArea, NativeBinder, NativeHandle,
    OsKind, PlatformIdentity, ResolveError, Resolver, ResourceBundle, SearchConfig, SourceKind,
    StaticBundle, candidate_filenames, locate,
};

// ── Fake binder ────────────────────────────────────────────────────

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

/// Counts bind calls; optionally fails every one of them.
struct CountingBinder {
    calls: AtomicUsize,
    fail: bool,
}

impl CountingBinder {
    fn succeeding() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail: false,
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail: true,
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
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
                detail: "invalid magic".to_string(),
            });
        }
        Ok(Arc::new(FakeHandle {
            path: path.to_path_buf(),
        }))
    }
}

// ── Fake bundle ────────────────────────────────────────────────────

/// Wraps a `StaticBundle` and counts materialize calls.
struct CountingBundle {
    inner: StaticBundle,
    materialized: AtomicUsize,
}

impl CountingBundle {
    fn new(resource: &str, bytes: &'static [u8]) -> Arc<Self> {
        Arc::new(Self {
            inner: StaticBundle::new().with_resource(resource, bytes),
            materialized: AtomicUsize::new(0),
        })
    }

    fn materialize_calls(&self) -> usize {
        self.materialized.load(Ordering::SeqCst)
    }
}

impl ResourceBundle for CountingBundle {
    fn contains(&self, resource: &str) -> bool {
        self.inner.contains(resource)
    }

    fn materialize(&self, resource: &str, dest: &Path) -> Result<(), BundleError> {
        self.materialized.fetch_add(1, Ordering::SeqCst);
        self.inner.materialize(resource, dest)
    }
}

// ── Helpers ────────────────────────────────────────────────────────

fn linux_plain() -> PlatformIdentity {
    PlatformIdentity::new(OsKind::Linux, ArchKind::X86_64, AbiVariant::None)
}

/// Config confined to `dir`: working dir, extraction root, no system paths.
fn hermetic(dir: &Path) -> SearchConfig {
    SearchConfig::new()
        .with_working_dir(dir)
        .with_system_paths(Vec::new())
        .with_extract_root(dir)
}

// ── Tests ──────────────────────────────────────────────────────────

#[test]
fn system_path_hit_reports_earlier_sources_in_order() {
    let tmp = tempfile::tempdir().unwrap();
    let work = tmp.path().join("cwd");
    let system = tmp.path().join("system");
    fs::create_dir_all(&work).unwrap();
    fs::create_dir_all(&system).unwrap();
    fs::write(system.join("libengine-core.so"), b"x").unwrap();

    let candidates = candidate_filenames("engine-core", linux_plain(), None).unwrap();
    assert_eq!(candidates.len(), 3);

    let config = SearchConfig::new()
        .with_working_dir(&work)
        .with_system_paths(vec![system.clone()])
        .with_extract_root(tmp.path());
    let area = ExtractionArea::new(tmp.path());

    let located = locate(&candidates, &config, None, &area).unwrap();
    assert_eq!(located.source, SourceKind::SystemPath);
    assert_eq!(located.path, system.join("libengine-core.so"));

    // Override, working directory, and bundle were all attempted and
    // absent, in precedence order, before the system-path hit
    assert_eq!(located.attempts[0].source, SourceKind::Override);
    assert!(
        located.attempts[1..=3]
            .iter()
            .all(|a| a.source == SourceKind::WorkingDirectory)
    );
    assert_eq!(located.attempts[4].source, SourceKind::BundledResource);
    assert!(
        located.attempts[5..]
            .iter()
            .all(|a| a.source == SourceKind::SystemPath)
    );
}

#[test]
fn concurrent_resolves_share_one_bind() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join("libengine-core.so"), b"x").unwrap();
    let binder = CountingBinder::succeeding();
    let resolver = Resolver::new(
        hermetic(tmp.path()),
        Arc::clone(&binder) as Arc<dyn NativeBinder>,
    )
    .with_identity(linux_plain());

    let mut loaded = Vec::new();
    thread::scope(|scope| {
        let mut workers = Vec::new();
        for _ in 0..8 {
            let resolver = &resolver;
            workers.push(scope.spawn(move || resolver.resolve("engine-core").unwrap()));
        }
        for worker in workers {
            loaded.push(worker.join().unwrap());
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
fn concurrent_failures_are_identical() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join("libengine-core.so"), b"junk").unwrap();
    let binder = CountingBinder::failing();
    let resolver = Resolver::new(
        hermetic(tmp.path()),
        Arc::clone(&binder) as Arc<dyn NativeBinder>,
    )
    .with_identity(linux_plain());

    let mut failures = Vec::new();
    thread::scope(|scope| {
        let mut workers = Vec::new();
        for _ in 0..8 {
            let resolver = &resolver;
            workers.push(scope.spawn(move || resolver.resolve("engine-core").unwrap_err()));
        }
        for worker in workers {
            failures.push(worker.join().unwrap());
        }
    });

    assert_eq!(binder.calls(), 1);
    assert!(failures.iter().all(|f| *f == failures[0]));
    assert!(matches!(failures[0], ResolveError::Bind { .. }));
}

#[test]
fn bound_name_rejects_a_different_source_path() {
    let tmp = tempfile::tempdir().unwrap();
    let app_dir = tmp.path().join("app");
    let plugin_dir = tmp.path().join("plugin");
    fs::create_dir_all(&app_dir).unwrap();
    fs::create_dir_all(&plugin_dir).unwrap();
    fs::write(app_dir.join("libengine-core.so"), b"x").unwrap();

    let binder = CountingBinder::succeeding();
    let app = Resolver::new(
        hermetic(&app_dir),
        Arc::clone(&binder) as Arc<dyn NativeBinder>,
    )
    .with_identity(linux_plain());
    let loaded = app.resolve("engine-core").unwrap();

    // A second resolver in the same process finds its own copy through a
    // bundle; extraction succeeds but the rebind must be refused.
    let bundle = CountingBundle::new("engine-core-x86_64", b"y");
    let plugin = Resolver::new(
        hermetic(&plugin_dir),
        Arc::clone(&binder) as Arc<dyn NativeBinder>,
    )
    .with_identity(linux_plain())
    .with_bundle(bundle as Arc<dyn ResourceBundle>)
    .with_registry(app.registry());

    let err = plugin.resolve("engine-core").unwrap_err();
    match err {
        ResolveError::AlreadyLoadedDifferentPath {
            loaded_from,
            requested,
            ..
        } => {
            assert_eq!(loaded_from, loaded.path());
            assert_ne!(requested, loaded_from);
            assert_eq!(
                requested.file_name().unwrap().to_str(),
                Some("engine-core-x86_64")
            );
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(binder.calls(), 1);
}

#[test]
fn bundled_resource_extracts_once_and_rebinds_never() {
    let tmp = tempfile::tempdir().unwrap();
    let work = tmp.path().join("cwd");
    let extract_root = tmp.path().join("extract");
    fs::create_dir_all(&work).unwrap();

    let bundle = CountingBundle::new("engine-core-x86_64", b"\x7fELF fake");
    let binder = CountingBinder::succeeding();
    let config = SearchConfig::new()
        .with_working_dir(&work)
        .with_system_paths(Vec::new())
        .with_extract_root(&extract_root);
    let resolver = Resolver::new(config, Arc::clone(&binder) as Arc<dyn NativeBinder>)
        .with_identity(linux_plain())
        .with_bundle(Arc::clone(&bundle) as Arc<dyn ResourceBundle>);

    let first = resolver.resolve("engine-core").unwrap();
    assert_eq!(first.source(), SourceKind::BundledResource);
    assert_eq!(
        first.path().file_name().unwrap().to_str(),
        Some("engine-core-x86_64")
    );
    let private_dir = first.path().parent().unwrap();
    assert!(
        private_dir
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("enginelink-")
    );
    assert_eq!(
        private_dir.parent().unwrap(),
        fs::canonicalize(&extract_root).unwrap()
    );
    assert_eq!(fs::read(first.path()).unwrap(), b"\x7fELF fake");

    let second = resolver.resolve("engine-core").unwrap();
    assert!(Arc::ptr_eq(first.handle(), second.handle()));
    assert_eq!(bundle.materialize_calls(), 1, "re-extracted on second resolve");
    assert_eq!(binder.calls(), 1, "re-bound on second resolve");
}
