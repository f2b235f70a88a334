//! Doctor command handler.
//!
//! Reports everything resolution depends on: the platform identity, the
//! `ENGINELINK_*` environment, the configured sources, bundle presence, and
//! whether the extraction root is writable. The report is diagnostic only;
//! it never changes any state besides a writability probe file it removes
//! again.

use std::env;
use std::fs;
use std::path::Path;

use anyhow::Result;

use enginelink_core::{
    BUNDLE_DIR_ENV, EXTRACT_DIR_ENV, LIBRARY_PATH_ENV, SearchConfig, default_bundle_root,
    identify, linker_path_variable,
};

// ANSI color codes
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Execute the doctor command.
pub fn execute() -> Result<()> {
    let identity = identify();
    let config = SearchConfig::from_env();

    println!("{BOLD}Platform{RESET}");
    println!("{}", "-".repeat(40));
    println!("  identity           {identity}");
    println!();

    println!("{BOLD}Environment{RESET}");
    println!("{}", "-".repeat(40));
    print_env_var(LIBRARY_PATH_ENV);
    print_env_var(BUNDLE_DIR_ENV);
    print_env_var(EXTRACT_DIR_ENV);
    print_env_var(linker_path_variable());
    println!();

    println!("{BOLD}Search{RESET}");
    println!("{}", "-".repeat(40));
    let order: Vec<&str> = config.sources.iter().map(|s| s.label()).collect();
    println!("  source order       {}", order.join(" > "));
    match &config.override_path {
        Some(path) => print_path_probe("override path", path),
        None => println!("  override path      (none)"),
    }
    for path in &config.system_paths {
        print_path_probe("system path", path);
    }
    println!();

    println!("{BOLD}Bundle{RESET}");
    println!("{}", "-".repeat(40));
    match default_bundle_root() {
        Some(root) => print_path_probe("bundle root", &root),
        None => println!("  {YELLOW}○{RESET} no bundle root configured"),
    }
    println!();

    println!("{BOLD}Extraction{RESET}");
    println!("{}", "-".repeat(40));
    let root = &config.extract_root;
    if extraction_root_writable(root) {
        println!("  {GREEN}✓{RESET} {} is writable", root.display());
    } else {
        println!("  {RED}✗{RESET} {} is not writable", root.display());
        println!("    set {EXTRACT_DIR_ENV} to a writable directory");
    }

    Ok(())
}

fn print_env_var(name: &str) {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => {
            println!("  {GREEN}✓{RESET} {name:<24} {value}");
        }
        _ => println!("  {YELLOW}○{RESET} {name:<24} (unset)"),
    }
}

fn print_path_probe(label: &str, path: &Path) {
    if path.exists() {
        println!("  {GREEN}✓{RESET} {label:<16} {}", path.display());
    } else {
        println!("  {YELLOW}○{RESET} {label:<16} {} (missing)", path.display());
    }
}

/// Whether a file can be created under `root`. The probe file is removed
/// again before returning.
fn extraction_root_writable(root: &Path) -> bool {
    let probe = root.join(format!(".enginelink-doctor-{}", std::process::id()));
    match fs::write(&probe, b"probe") {
        Ok(()) => {
            let _ = fs::remove_file(&probe);
            true
        }
        Err(_) => false,
    }
}
