//! Main CLI parser and top-level argument handling.
//!
//! This module defines the root CLI structure with global options.

use clap::Parser;

use crate::commands::Commands;

/// Command-line interface for inspecting and loading native engine libraries.
///
/// This is the top-level parser that handles global options and dispatches
/// to subcommands.
#[derive(Parser)]
#[command(name = "enginelink")]
#[command(about = "Locate, inspect, and load native engine libraries")]
#[command(version)]
pub struct Cli {
    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_verbose_flag_parses_anywhere() {
        let cli = Cli::parse_from(["enginelink", "platform", "--verbose"]);
        assert!(cli.verbose);

        let cli = Cli::parse_from(["enginelink", "-v", "doctor"]);
        assert!(cli.verbose);
    }

    #[test]
    fn resolve_collects_repeated_symbols() {
        let cli = Cli::parse_from([
            "enginelink",
            "resolve",
            "engine-core",
            "--require-symbol",
            "engine_init",
            "--require-symbol",
            "engine_shutdown",
        ]);
        match cli.command {
            Some(Commands::Resolve {
                name,
                require_symbol,
                ..
            }) => {
                assert_eq!(name, "engine-core");
                assert_eq!(require_symbol, vec!["engine_init", "engine_shutdown"]);
            }
            _ => panic!("expected resolve subcommand"),
        }
    }
}
