//! Command handlers.
//!
//! Handlers follow one pattern:
//! - Signature: `pub async fn execute(ctx: &CliContext, ...) -> Result<..., CliError>`
//! - They call into the core services and ports, then format for the terminal
//! - Anything worth asserting on is returned, printing stays in `execute`

pub mod check;
pub mod fetch;
pub mod mark_displayed;
pub mod paths;
pub mod reset;
pub mod status;
