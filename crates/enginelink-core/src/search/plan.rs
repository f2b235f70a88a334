//! Dry-run resolution plans.
//!
//! A plan is the pure part of a resolution: the candidate names and the
//! ordered probe list a search would walk, computed without touching the
//! filesystem. Two calls with the same name, identity, and config produce
//! identical plans, which makes plans usable as a diagnostic golden record.

use std::fmt;

use serde::Serialize;

use crate::naming::{self, NamingError};
use crate::platform::PlatformIdentity;

use super::config::{SearchConfig, SourceKind};

/// One probe a search would perform.
///
/// `target` is a path for the path-backed sources and a resource name for
/// the bundled source. Sources with nothing configured plan no probes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedProbe {
    pub source: SourceKind,
    pub target: String,
}

/// The complete, ordered search a resolution would perform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionPlan {
    pub identity: PlatformIdentity,
    pub logical_name: String,
    pub candidates: Vec<String>,
    pub probes: Vec<PlannedProbe>,
}

impl ResolutionPlan {
    /// Plan the search for `name` on `identity` under `config`.
    ///
    /// Fails only for the reasons candidate building fails: an invalid name
    /// or an unknown OS with no fallback convention.
    pub fn compute(
        name: &str,
        identity: PlatformIdentity,
        config: &SearchConfig,
    ) -> Result<Self, NamingError> {
        let candidates = naming::candidate_filenames(name, identity, config.fallback_convention)?;

        let mut probes = Vec::new();
        for source in &config.sources {
            match source {
                SourceKind::Override => {
                    if let Some(path) = config.override_path.as_ref() {
                        probes.push(PlannedProbe {
                            source: *source,
                            target: path.display().to_string(),
                        });
                    }
                }
                SourceKind::WorkingDirectory => {
                    for candidate in &candidates {
                        // No configured dir means the process working
                        // directory at probe time; the plan keeps the
                        // target relative rather than guessing.
                        let target = config.working_dir.as_ref().map_or_else(
                            || candidate.clone(),
                            |dir| dir.join(candidate).display().to_string(),
                        );
                        probes.push(PlannedProbe {
                            source: *source,
                            target,
                        });
                    }
                }
                SourceKind::BundledResource => {
                    for candidate in &candidates {
                        probes.push(PlannedProbe {
                            source: *source,
                            target: candidate.clone(),
                        });
                    }
                }
                SourceKind::SystemPath => {
                    for dir in &config.system_paths {
                        for candidate in &candidates {
                            probes.push(PlannedProbe {
                                source: *source,
                                target: dir.join(candidate).display().to_string(),
                            });
                        }
                    }
                }
            }
        }

        Ok(Self {
            identity,
            logical_name: name.to_string(),
            candidates,
            probes,
        })
    }
}

impl fmt::Display for ResolutionPlan {
    /// `key = value` lines, one fact per line, stable across runs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "name = {}", self.logical_name)?;
        writeln!(f, "platform = {}", self.identity)?;
        for candidate in &self.candidates {
            writeln!(f, "candidate = {candidate}")?;
        }
        for probe in &self.probes {
            writeln!(f, "probe = {} {}", probe.source, probe.target)?;
        }
        Ok(())
    }
}
