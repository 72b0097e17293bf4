//! Mark-displayed command handler.

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Record the prompt of the configured campaign as displayed now.
///
/// Returns `false` when it was already recorded; the stored time is kept.
pub async fn mark(ctx: &CliContext) -> Result<bool, CliError> {
    let campaign = ctx.campaign()?;
    let newly_set = ctx
        .repo
        .mark_prompt_displayed(campaign.campaign_id(), ctx.clock.now_millis())
        .await?;
    tracing::info!(
        campaign_id = %campaign.campaign_id(),
        newly_set,
        "Prompt marked displayed from the command line"
    );
    Ok(newly_set)
}

/// Execute the mark-displayed command.
pub async fn execute(ctx: &CliContext) -> Result<(), CliError> {
    if mark(ctx).await? {
        println!("Prompt recorded as displayed");
    } else {
        println!("Prompt was already recorded as displayed; unchanged");
    }
    Ok(())
}
