//! The normalized (OS, architecture, ABI-variant) identity of a process.
//!
//! Tag vocabulary is stable and wire-visible: the strings returned by the
//! `tag()` accessors appear in candidate file names, bundle resource keys,
//! and JSON output, so they must never change for an existing variant.

use std::fmt;

use serde::Serialize;
use strum_macros::EnumIter;

/// Operating-system family of the running process.
///
/// Closed set. `Unknown` is a valid terminal value, not an error: it signals
/// that no OS-specific naming convention applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, EnumIter)]
pub enum OsKind {
    #[serde(rename = "linux")]
    Linux,
    #[serde(rename = "macosx")]
    MacOs,
    #[serde(rename = "windows")]
    Windows,
    #[serde(rename = "android")]
    Android,
    #[serde(rename = "nacl")]
    NativeClient,
    #[serde(rename = "unknown")]
    Unknown,
}

impl OsKind {
    /// Stable tag used in candidate file names and reports.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::MacOs => "macosx",
            Self::Windows => "windows",
            Self::Android => "android",
            Self::NativeClient => "nacl",
            Self::Unknown => "unknown",
        }
    }

    /// Normalize a runtime OS marker string (e.g. an `os.name`-style value).
    ///
    /// Recognized synonyms map to the same variant; anything else is
    /// `Unknown`. Matching is case-insensitive and never fails.
    #[must_use]
    pub fn from_marker(marker: &str) -> Self {
        let m = marker.trim().to_ascii_lowercase();
        match m.as_str() {
            "linux" => Self::Linux,
            "android" => Self::Android,
            "macosx" | "macos" | "mac os x" | "darwin" | "osx" => Self::MacOs,
            "nacl" => Self::NativeClient,
            _ if m.starts_with("windows") => Self::Windows,
            // Android reports a Linux kernel marker; check it before linux
            _ if m.contains("android") => Self::Android,
            _ if m.contains("linux") => Self::Linux,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for OsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Hardware architecture of the running process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, EnumIter)]
pub enum ArchKind {
    #[serde(rename = "x86")]
    X86,
    #[serde(rename = "x86_64")]
    X86_64,
    #[serde(rename = "arm")]
    Arm,
    #[serde(rename = "arm64")]
    Arm64,
    #[serde(rename = "unknown")]
    Unknown,
}

impl ArchKind {
    /// Stable tag used in candidate file names and reports.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::X86 => "x86",
            Self::X86_64 => "x86_64",
            Self::Arm => "arm",
            Self::Arm64 => "arm64",
            Self::Unknown => "unknown",
        }
    }

    /// Normalize a machine-identifier string.
    ///
    /// Architecture markers vary in casing and format across environments
    /// (`amd64` vs `x86_64`, `aarch64` vs `arm64`); recognized synonyms
    /// compare equal after normalization. Unrecognized input is `Unknown`.
    #[must_use]
    pub fn from_marker(marker: &str) -> Self {
        match marker.trim().to_ascii_lowercase().as_str() {
            "x86_64" | "amd64" | "x64" => Self::X86_64,
            "x86" | "i386" | "i486" | "i586" | "i686" | "ia32" => Self::X86,
            "arm64" | "aarch64" => Self::Arm64,
            "arm" | "armv7" | "armv7l" | "armeabi" | "armeabi-v7a" => Self::Arm,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for ArchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Binary-compatibility sub-classification within one architecture.
///
/// On Linux this is the libc flavor; on Android it selects the NDK ABI tag.
/// `None` means the architecture tag alone is sufficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AbiVariant {
    None,
    Gnu,
    Musl,
    Ndk,
}

impl AbiVariant {
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Gnu => "gnu",
            Self::Musl => "musl",
            Self::Ndk => "ndk",
        }
    }
}

impl fmt::Display for AbiVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Immutable (OS, architecture, ABI-variant) tuple for the current process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PlatformIdentity {
    pub os: OsKind,
    pub arch: ArchKind,
    pub abi: AbiVariant,
}

impl PlatformIdentity {
    #[must_use]
    pub const fn new(os: OsKind, arch: ArchKind, abi: AbiVariant) -> Self {
        Self { os, arch, abi }
    }

    /// ABI variant tags for this identity, most-specific-first.
    ///
    /// The name builder produces one candidate per entry, so ordering here
    /// decides which binary wins when several ABI-compatible variants are
    /// packaged side by side. An `Unknown` architecture yields an empty
    /// chain: only the undecorated conventional name remains.
    #[must_use]
    pub fn variant_chain(self) -> Vec<String> {
        if self.arch == ArchKind::Unknown {
            return Vec::new();
        }
        let arch_tag = self.arch.tag();
        match self.abi {
            AbiVariant::None => vec![arch_tag.to_string()],
            AbiVariant::Gnu => vec![format!("{arch_tag}-gnu"), arch_tag.to_string()],
            AbiVariant::Musl => vec![format!("{arch_tag}-musl"), arch_tag.to_string()],
            AbiVariant::Ndk => {
                let ndk = ndk_abi_tag(self.arch);
                if ndk == arch_tag {
                    vec![arch_tag.to_string()]
                } else {
                    vec![ndk.to_string(), arch_tag.to_string()]
                }
            }
        }
    }
}

impl fmt::Display for PlatformIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.os, self.arch, self.abi)
    }
}

/// NDK ABI directory tag for an architecture.
const fn ndk_abi_tag(arch: ArchKind) -> &'static str {
    match arch {
        ArchKind::Arm => "armeabi-v7a",
        ArchKind::Arm64 => "arm64-v8a",
        ArchKind::X86 => "x86",
        ArchKind::X86_64 => "x86_64",
        ArchKind::Unknown => "unknown",
    }
}

/// Identify the platform the current process runs on.
///
/// Pure and deterministic per process: the mapping is fixed at compile time
/// via `cfg!`, so two calls always return identical values. Never fails;
/// targets outside the known set produce `Unknown` fields.
#[must_use]
pub const fn identify() -> PlatformIdentity {
    // Android first: it also matches several linux-family cfgs
    let os = if cfg!(target_os = "android") {
        OsKind::Android
    } else if cfg!(target_os = "linux") {
        OsKind::Linux
    } else if cfg!(target_os = "macos") {
        OsKind::MacOs
    } else if cfg!(target_os = "windows") {
        OsKind::Windows
    } else {
        OsKind::Unknown
    };

    let arch = if cfg!(target_arch = "x86_64") {
        ArchKind::X86_64
    } else if cfg!(target_arch = "x86") {
        ArchKind::X86
    } else if cfg!(target_arch = "aarch64") {
        ArchKind::Arm64
    } else if cfg!(target_arch = "arm") {
        ArchKind::Arm
    } else {
        ArchKind::Unknown
    };

    let abi = if cfg!(target_os = "android") {
        AbiVariant::Ndk
    } else if cfg!(target_env = "musl") {
        AbiVariant::Musl
    } else if cfg!(all(target_os = "linux", target_env = "gnu")) {
        AbiVariant::Gnu
    } else {
        AbiVariant::None
    };

    PlatformIdentity { os, arch, abi }
}
