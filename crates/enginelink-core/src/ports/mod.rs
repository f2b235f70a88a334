//! Ports: traits the core depends on, implemented by adapter crates.

mod binder;

pub use binder::{BindFailure, NativeBinder, NativeHandle};
