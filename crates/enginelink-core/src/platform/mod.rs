//! Platform identification for native-library resolution.
//!
//! Everything here is a pure function of the execution environment: no I/O,
//! no failures. Environments we cannot map resolve to `Unknown` values, which
//! later stages treat as "no platform-specific resolution possible" rather
//! than as errors.

mod identity;

pub use identity::{AbiVariant, ArchKind, OsKind, PlatformIdentity, identify};
