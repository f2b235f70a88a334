//! Platform command handler.
//!
//! Reports the identity compiled into this binary, or normalizes foreign
//! marker strings when `--os`/`--arch` are given.

use anyhow::Result;

use enginelink_core::{AbiVariant, ArchKind, OsKind, PlatformIdentity, identify};

/// Execute the platform command.
pub fn execute(os: Option<&str>, arch: Option<&str>, json: bool) -> Result<()> {
    let identity = identity_from_markers(os, arch);

    if json {
        println!("{}", serde_json::to_string_pretty(&identity)?);
    } else {
        println!("os   = {}", identity.os);
        println!("arch = {}", identity.arch);
        println!("abi  = {}", identity.abi);
    }
    Ok(())
}

/// The identity to operate on: detected, unless marker strings override it.
///
/// A marker describes some other machine, so the local ABI variant does not
/// carry over when one is given.
pub(crate) fn identity_from_markers(os: Option<&str>, arch: Option<&str>) -> PlatformIdentity {
    let detected = identify();
    if os.is_none() && arch.is_none() {
        return detected;
    }

    PlatformIdentity::new(
        os.map_or(detected.os, OsKind::from_marker),
        arch.map_or(detected.arch, ArchKind::from_marker),
        AbiVariant::None,
    )
}
