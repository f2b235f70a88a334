//! Candidates command handler.
//!
//! Prints the ordered candidate file names a search would probe, one per
//! line, most specific first.

use anyhow::Result;

use enginelink_core::candidate_filenames;

use super::platform::identity_from_markers;

/// Execute the candidates command.
pub fn execute(name: &str, os: Option<&str>, arch: Option<&str>, json: bool) -> Result<()> {
    let identity = identity_from_markers(os, arch);
    let candidates = candidate_filenames(name, identity, None)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&candidates)?);
    } else {
        for candidate in &candidates {
            println!("{candidate}");
        }
    }
    Ok(())
}
