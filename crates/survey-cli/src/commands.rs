//! Subcommands of the survey-gate CLI.

use clap::Subcommand;

/// Available commands.
///
/// Every command except `paths` works on the campaign resolved from the
/// settings file and the global overrides.
#[derive(Subcommand)]
pub enum Commands {
    /// Show resolved paths and the campaign in effect
    Paths,

    /// Show the persisted state of the campaign
    Status {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Evaluate the eligibility gate once
    ///
    /// This is a real evaluation: a daily roll is recorded when one happens.
    Check {
        /// Evaluate as if telemetry consent were withheld
        #[arg(long)]
        no_consent: bool,
        /// Evaluate as if this were the first run
        #[arg(long)]
        first_run: bool,
        /// Use this value in [0, 1) instead of a random roll
        #[arg(long, value_parser = parse_unit)]
        roll: Option<f64>,
    },

    /// Download the survey definition and report whether it expired
    Fetch,

    /// Record the prompt as displayed now
    MarkDisplayed,

    /// Forget everything stored for the campaign
    Reset {
        /// Also clear the shared daily roll
        #[arg(long)]
        sampling: bool,
    },
}

/// Parse a value in `[0, 1)`.
fn parse_unit(raw: &str) -> Result<f64, String> {
    let value: f64 = raw.parse().map_err(|e| format!("{e}"))?;
    if (0.0..1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{value} is not in [0, 1)"))
    }
}
