//! Command handlers.
//!
//! One module per subcommand. Handlers follow the canonical pattern:
//! - Signature: `pub fn execute(...) -> Result<()>`
//! - Thin wrappers that:
//!   1. Parse/validate CLI-specific input
//!   2. Call `enginelink-core` / `enginelink-loader`
//!   3. Format output for the terminal
//!
//! Handlers should NOT contain resolution logic; the library crates own the
//! semantics, the handlers own the presentation.

pub mod candidates;
pub mod completions;
pub mod doctor;
pub mod plan;
pub mod platform;
pub mod resolve;
