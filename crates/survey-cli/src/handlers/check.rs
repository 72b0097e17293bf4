//! Check command handler.
//!
//! Runs one real gate evaluation against the store. Telemetry consent and
//! first-run come from flags because the CLI has no host to ask.

use std::fmt;
use std::sync::Arc;

use survey_core::{FixedRandom, GateDecision, GateSignals, RandomSource, ThreadRandom};

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Flags of the check command.
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckOptions {
    pub no_consent: bool,
    pub first_run: bool,
    pub roll: Option<f64>,
}

/// Gate decision for one campaign.
pub struct CheckReport {
    pub campaign_id: String,
    pub decision: GateDecision,
}

impl fmt::Display for CheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.decision.allowed {
            "eligible"
        } else {
            "not eligible"
        };
        match self.decision.reason {
            Some(reason) => write!(f, "{}: {verdict} ({reason})", self.campaign_id),
            None => write!(f, "{}: {verdict}", self.campaign_id),
        }
    }
}

/// Evaluate the gate for the configured campaign.
pub async fn evaluate(ctx: &CliContext, options: CheckOptions) -> Result<CheckReport, CliError> {
    let campaign = ctx.campaign()?;
    let random: Arc<dyn RandomSource> = match options.roll {
        Some(roll) => Arc::new(FixedRandom(roll)),
        None => Arc::new(ThreadRandom),
    };
    let signals = GateSignals {
        consent: !options.no_consent,
        is_first_run: options.first_run,
        force_enabled: ctx.config.settings.force_enabled,
    };

    let decision = ctx.gate(random).can_show(&campaign, signals).await?;
    Ok(CheckReport {
        campaign_id: campaign.campaign_id().to_string(),
        decision,
    })
}

/// Execute the check command.
pub async fn execute(ctx: &CliContext, options: CheckOptions) -> Result<(), CliError> {
    println!("{}", evaluate(ctx, options).await?);
    Ok(())
}
