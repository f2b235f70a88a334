//! Main commands enum and subcommand arguments.
//!
//! This module defines the available commands for the CLI tool.

use std::path::PathBuf;

use clap::Subcommand;
use clap_complete::Shell;

/// Available commands for the native-library resolution tool.
#[derive(Subcommand)]
pub enum Commands {
    /// Show the platform identity this binary detects
    Platform {
        /// Normalize an OS marker string instead of using the detected OS
        #[arg(long)]
        os: Option<String>,
        /// Normalize an architecture marker instead of the detected one
        #[arg(long)]
        arch: Option<String>,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// List candidate file names for a logical library, in probe order
    Candidates {
        /// Logical library name (e.g. "engine-core")
        name: String,
        /// Normalize an OS marker string instead of using the detected OS
        #[arg(long)]
        os: Option<String>,
        /// Normalize an architecture marker instead of the detected one
        #[arg(long)]
        arch: Option<String>,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Print every probe a resolve would walk, without touching the filesystem
    Plan {
        /// Logical library name
        name: String,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Resolve a library and bind it through the OS dynamic loader
    Resolve {
        /// Logical library name
        name: String,
        /// Entry point that must be exported; repeat for several
        #[arg(long = "require-symbol")]
        require_symbol: Vec<String>,
        /// Probe this file or directory before any other source
        #[arg(long)]
        override_path: Option<PathBuf>,
        /// Directory serving bundled resources for this run
        #[arg(long)]
        bundle_dir: Option<PathBuf>,
        /// Emit the resolution outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Report the resolution environment and its health
    Doctor,

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}
