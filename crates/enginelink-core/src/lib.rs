#![doc = include_str!(concat!(env!("OUT_DIR"), "/README_GENERATED.md"))]
#![deny(unused_crate_dependencies)]

pub mod bundle;
pub mod naming;
pub mod platform;
pub mod ports;
pub mod registry;
pub mod report;
pub mod resolver;
pub mod search;

mod gate;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-export the platform identity vocabulary
pub use platform::{AbiVariant, ArchKind, OsKind, PlatformIdentity, identify};

// Re-export naming and search types used at every call site
pub use naming::{NamingConvention, NamingError, candidate_filenames, validate_logical_name};
pub use search::{
    DEFAULT_SOURCE_ORDER, EXTRACT_DIR_ENV, ExtractError, ExtractionArea, LIBRARY_PATH_ENV,
    Located, PlannedProbe, ResolutionPlan, SearchConfig, SearchExhausted, SourceKind,
    linker_path_variable, locate,
};

// Re-export the ports and bundle adapters
pub use bundle::{
    BUNDLE_DIR_ENV, BundleError, DirBundle, ResourceBundle, StaticBundle, default_bundle_root,
};
pub use ports::{BindFailure, NativeBinder, NativeHandle};

// Re-export the resolution surface
pub use registry::{LoadRegistry, LoadedLibrary, RegistryError};
pub use report::{Attempt, FailureReason, render_trail};
pub use resolver::{LoadRequest, ResolutionOutcome, ResolveError, Resolver};

// Silence unused dev-dependency warnings until we add mock-based tests
#[cfg(test)]
use mockall as _;
