#![cfg(all(target_os = "linux", target_env = "gnu"))]

//! Binds the platform C library through the real dynamic loader.
//!
//! glibc is always resolvable on a gnu target and is already mapped into the
//! test process, so binding it is cheap and has no side effects.
//!
//! # What is tested
//! - A bind with required symbols verifies them and hands out a usable handle
//! - A missing required symbol fails the bind and names the symbol
//! - The typed accessor produces callable function pointers

use std::ffi::c_void;
use std::path::Path;

use enginelink_core::{BindFailure, NativeBinder, NativeHandle};
use enginelink_loader::{symbol, DlBinder};

const LIBC: &str = "libc.so.6";

#[test]
fn binds_libc_and_verifies_required_symbols() {
    let binder = DlBinder::new();
    let handle = binder
        .bind(Path::new(LIBC), &["malloc".to_string(), "free".to_string()])
        .unwrap();

    assert_eq!(handle.path(), Path::new(LIBC));
    assert!(!handle.symbol_address("malloc").unwrap().is_null());
}

#[test]
fn missing_required_symbol_fails_the_bind() {
    let binder = DlBinder::new();
    let err = binder
        .bind(Path::new(LIBC), &["enginelink_no_such_export".to_string()])
        .unwrap_err();

    match err {
        BindFailure::SymbolMissing { symbol, .. } => {
            assert_eq!(symbol, "enginelink_no_such_export");
        }
        other => panic!("unexpected failure: {other:?}"),
    }
}

#[test]
fn typed_symbol_is_callable() {
    type MallocFn = unsafe extern "C" fn(usize) -> *mut c_void;
    type FreeFn = unsafe extern "C" fn(*mut c_void);

    let binder = DlBinder::new();
    let handle = binder.bind(Path::new(LIBC), &[]).unwrap();

    // SAFETY: the signatures match glibc's malloc and free.
    unsafe {
        let malloc: MallocFn = symbol(handle.as_ref(), "malloc").unwrap();
        let free: FreeFn = symbol(handle.as_ref(), "free").unwrap();

        let block = malloc(64);
        assert!(!block.is_null());
        free(block);
    }
}
