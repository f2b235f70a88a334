//! Candidate file names for a logical library on a given platform.
//!
//! A logical name like `engine-core` expands into the ordered list of file
//! names the locator probes. Ordering is most-specific-first so the best
//! ABI match wins before any fallback; the list never contains duplicates.

use thiserror::Error;

use crate::platform::{OsKind, PlatformIdentity};

/// OS file-naming convention for shared libraries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamingConvention {
    pub prefix: &'static str,
    pub suffix: &'static str,
}

impl NamingConvention {
    /// `lib{name}.so` on Linux, Android, and NaCl.
    pub const UNIX: Self = Self {
        prefix: "lib",
        suffix: ".so",
    };
    /// `lib{name}.dylib` on macOS.
    pub const MACOS: Self = Self {
        prefix: "lib",
        suffix: ".dylib",
    };
    /// `{name}.dll` on Windows.
    pub const WINDOWS: Self = Self {
        prefix: "",
        suffix: ".dll",
    };

    /// The convention for an OS, or `None` when the OS has none.
    #[must_use]
    pub const fn for_os(os: OsKind) -> Option<Self> {
        match os {
            OsKind::Linux | OsKind::Android | OsKind::NativeClient => Some(Self::UNIX),
            OsKind::MacOs => Some(Self::MACOS),
            OsKind::Windows => Some(Self::WINDOWS),
            OsKind::Unknown => None,
        }
    }

    /// Wrap a file stem in this convention's prefix and suffix.
    #[must_use]
    pub fn decorate(&self, stem: &str) -> String {
        format!("{}{}{}", self.prefix, stem, self.suffix)
    }
}

/// Errors from candidate-name construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NamingError {
    /// The logical name cannot be used as a file name component.
    #[error("invalid logical library name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },

    /// No naming convention exists for this OS and no fallback is configured.
    #[error("no library naming convention for os {os} and no fallback configured")]
    UnsupportedPlatform { os: OsKind },
}

/// Check that a logical name is usable as a single path component.
///
/// Candidate names double as bundle resource keys and extraction file names,
/// so a logical name must never smuggle in path structure.
pub fn validate_logical_name(name: &str) -> Result<(), NamingError> {
    let reject = |reason: &str| {
        Err(NamingError::InvalidName {
            name: name.to_string(),
            reason: reason.to_string(),
        })
    };

    if name.trim().is_empty() {
        return reject("name is empty");
    }
    if name.contains('/') || name.contains('\\') {
        return reject("name contains a path separator");
    }
    if name.contains('\0') {
        return reject("name contains a NUL byte");
    }
    if name == "." || name == ".." {
        return reject("name is a relative path component");
    }
    Ok(())
}

/// Build the ordered candidate file names for `name` on `identity`.
///
/// Order, for ABI variant chain `V` (most-specific-first) and OS tag `os`:
///
/// 1. fully-qualified per variant: `{prefix}{name}-{os}-{v}{suffix}`
/// 2. bare resource form per variant: `{name}-{v}` (how bundled binaries
///    are addressed)
/// 3. plain conventional: `{prefix}{name}{suffix}`
///
/// The result is deduplicated preserving first occurrence. Fails with
/// [`NamingError::UnsupportedPlatform`] only when the OS is `Unknown` and no
/// `fallback` convention is supplied.
pub fn candidate_filenames(
    name: &str,
    identity: PlatformIdentity,
    fallback: Option<NamingConvention>,
) -> Result<Vec<String>, NamingError> {
    validate_logical_name(name)?;

    let convention = NamingConvention::for_os(identity.os)
        .or(fallback)
        .ok_or(NamingError::UnsupportedPlatform { os: identity.os })?;

    let os_tag = identity.os.tag();
    let variants = identity.variant_chain();

    let mut candidates: Vec<String> = Vec::with_capacity(variants.len() * 2 + 1);
    let push_unique = |list: &mut Vec<String>, candidate: String| {
        if !list.contains(&candidate) {
            list.push(candidate);
        }
    };

    for variant in &variants {
        push_unique(
            &mut candidates,
            convention.decorate(&format!("{name}-{os_tag}-{variant}")),
        );
    }
    for variant in &variants {
        push_unique(&mut candidates, format!("{name}-{variant}"));
    }
    push_unique(&mut candidates, convention.decorate(name));

    Ok(candidates)
}
