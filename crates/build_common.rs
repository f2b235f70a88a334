// Build helpers shared by every crate's build.rs via:
//   include!("../build_common.rs");
//
// The including build.rs must bring these into scope:
//   use std::env;
//   use std::fs;
//   use std::path::Path;

/// Turn the crate's README.md into a rustdoc-ready file in OUT_DIR.
///
/// Each crate's lib.rs includes the result as its crate-level docs, so the
/// README stays the single source. Three rewrites make the links resolve
/// inside rustdoc:
///
/// 1. `](src/` -> `](` so module links point at modules, not source paths
/// 2. trailing `.rs)` -> `)` for the same reason
/// 3. `](../../README.md` -> the repository URL from the workspace manifest,
///    so crate docs can reference the workspace overview
fn process_readme_for_rustdoc(crate_dir: &str) {
    println!("cargo:rerun-if-changed=README.md");
    println!("cargo:rerun-if-changed=../../Cargo.toml");

    let readme = Path::new(crate_dir).join("README.md");
    let Ok(source) = fs::read_to_string(&readme) else {
        // No README, nothing to generate
        return;
    };

    let mut rendered = source.replace("](src/", "](").replace(".rs)", ")");
    if let Some(url) = workspace_repository_url(crate_dir) {
        rendered = rendered.replace("](../../README.md", &format!("]({url}"));
    }

    let out_dir = env::var("OUT_DIR").unwrap();
    fs::write(Path::new(&out_dir).join("README_GENERATED.md"), rendered).unwrap();
}

/// The `repository` field of the workspace manifest, if present.
fn workspace_repository_url(crate_dir: &str) -> Option<String> {
    let manifest = Path::new(crate_dir)
        .parent()? // crates/
        .parent()? // workspace root
        .join("Cargo.toml");
    let content = fs::read_to_string(manifest).ok()?;

    for line in content.lines() {
        let line = line.trim();
        if line.starts_with("repository")
            && line.contains('=')
            && let Some(start) = line.find('"')
            && let Some(end) = line.rfind('"')
            && start < end
        {
            return Some(line[start + 1..end].to_string());
        }
    }
    None
}
