//! Plan command handler.
//!
//! Shows the complete probe sequence a resolve would walk for the current
//! environment, without touching the filesystem. This is the golden-truth
//! tool for "why was my library not found here" questions.

use anyhow::Result;

use enginelink_core::{ResolutionPlan, SearchConfig, identify};

/// Execute the plan command.
pub fn execute(name: &str, json: bool) -> Result<()> {
    let config = SearchConfig::from_env();
    let plan = ResolutionPlan::compute(name, identify(), &config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print!("{plan}");
    }
    Ok(())
}
