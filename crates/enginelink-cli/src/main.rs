//! CLI entry point.
//!
//! Parses arguments, initializes logging, and dispatches to handlers.
//! Logs go to stderr so stdout stays clean for `--json` consumers.

use clap::Parser;

use enginelink_cli::{Cli, Commands, handlers};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let Some(command) = cli.command else {
        // No command provided - show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Platform { os, arch, json } => {
            handlers::platform::execute(os.as_deref(), arch.as_deref(), json)?;
        }
        Commands::Candidates {
            name,
            os,
            arch,
            json,
        } => {
            handlers::candidates::execute(&name, os.as_deref(), arch.as_deref(), json)?;
        }
        Commands::Plan { name, json } => {
            handlers::plan::execute(&name, json)?;
        }
        Commands::Resolve {
            name,
            require_symbol,
            override_path,
            bundle_dir,
            json,
        } => {
            let args = handlers::resolve::ResolveArgs {
                name,
                require_symbols: require_symbol,
                override_path,
                bundle_dir,
                json,
            };
            if !handlers::resolve::execute(&args)? {
                std::process::exit(1);
            }
        }
        Commands::Doctor => {
            handlers::doctor::execute()?;
        }
        Commands::Completions { shell } => {
            handlers::completions::execute(shell);
        }
    }

    Ok(())
}

/// `--verbose` turns on debug-level events from every crate; otherwise
/// `RUST_LOG` decides, defaulting to warnings only.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
