//! Resolve command handler.
//!
//! Performs a real resolve-and-bind through the OS dynamic loader. Text
//! output is the loaded path on success, or the failure headline plus the
//! full search trail; `--json` emits the serialized outcome instead.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use enginelink_core::{DirBundle, LoadRequest, ResolutionOutcome, Resolver};
use enginelink_loader::DlBinder;

// ANSI color codes
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

/// Arguments for a resolve run.
pub struct ResolveArgs {
    pub name: String,
    pub require_symbols: Vec<String>,
    pub override_path: Option<PathBuf>,
    pub bundle_dir: Option<PathBuf>,
    pub json: bool,
}

/// Execute the resolve command.
///
/// Returns whether the library loaded; the caller turns `false` into a
/// nonzero exit code.
pub fn execute(args: &ResolveArgs) -> Result<bool> {
    debug!(
        name = %args.name,
        symbols = args.require_symbols.len(),
        "resolve requested"
    );

    let mut resolver = Resolver::from_env(Arc::new(DlBinder::new()));
    if let Some(path) = &args.override_path {
        let config = resolver.config().clone().with_override_path(path);
        resolver = resolver.with_config(config);
    }
    if let Some(dir) = &args.bundle_dir {
        resolver = resolver.with_bundle(Arc::new(DirBundle::new(dir)));
    }

    let mut request = LoadRequest::new(&args.name);
    for symbol in &args.require_symbols {
        request = request.with_required_symbol(symbol);
    }

    let result = resolver.resolve_with(request);

    if args.json {
        let outcome = ResolutionOutcome::summarize(&args.name, &result);
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(result.is_ok());
    }

    match result {
        Ok(loaded) => {
            println!(
                "{GREEN}✓{RESET} {} loaded from {} ({})",
                loaded.logical_name(),
                loaded.path().display(),
                loaded.source()
            );
            Ok(true)
        }
        Err(error) => {
            println!("{RED}✗{RESET} {error}");
            let trail = error.search_trail();
            if !trail.is_empty() {
                println!();
                println!("Search trail:");
                print!("{trail}");
            }
            Ok(false)
        }
    }
}
