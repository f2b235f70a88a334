#![doc = include_str!(concat!(env!("OUT_DIR"), "/README_GENERATED.md"))]
#![deny(unused_crate_dependencies)]

mod binder;

pub use binder::{symbol, DlBinder, EngineLibrary};
