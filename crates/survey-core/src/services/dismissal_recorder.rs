//! Dismissal bookkeeping for one displayed prompt.

use std::sync::Arc;

use crate::domain::{ClosingState, DismissCause};
use crate::events::SurveyEvent;
use crate::ports::{Clock, RepositoryError, SurveyEventEmitter, SurveyStateRepository};

/// What [`DismissalRecorder::on_dismiss`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DismissOutcome {
    /// The campaign's one-shot display was consumed.
    Displayed,
    /// Consumed, and the user accepted after `attempts` downloads.
    Accepted { attempts: u32 },
    /// Booked elsewhere; nothing done.
    Ignored,
    /// The host went away; the campaign stays eligible.
    NotRecorded,
    /// An earlier call already handled this attempt.
    AlreadyRecorded,
}

/// Books the dismissal of a single display attempt.
///
/// One recorder exists per attempt that reached the displayed state. The
/// "recorded" marker lives only in memory: it guards against several
/// teardown paths reporting the same dismissal.
pub struct DismissalRecorder {
    campaign_id: String,
    repo: Arc<dyn SurveyStateRepository>,
    clock: Arc<dyn Clock>,
    emitter: Arc<dyn SurveyEventEmitter>,
    recorded: bool,
}

impl DismissalRecorder {
    pub fn new(
        campaign_id: impl Into<String>,
        repo: Arc<dyn SurveyStateRepository>,
        clock: Arc<dyn Clock>,
        emitter: Arc<dyn SurveyEventEmitter>,
    ) -> Self {
        Self {
            campaign_id: campaign_id.into(),
            repo,
            clock,
            emitter,
            recorded: false,
        }
    }

    /// Whether this attempt's dismissal has been handled.
    pub const fn is_recorded(&self) -> bool {
        self.recorded
    }

    /// Book a dismissal.
    ///
    /// The marker is set before any storage write, so a failed write is not
    /// retried by a later teardown path.
    pub async fn on_dismiss(
        &mut self,
        cause: DismissCause,
    ) -> Result<DismissOutcome, RepositoryError> {
        if self.recorded {
            tracing::debug!(
                target: "survey.dismissal",
                campaign_id = %self.campaign_id,
                %cause,
                "Dismissal already recorded, ignoring"
            );
            return Ok(DismissOutcome::AlreadyRecorded);
        }

        match cause {
            DismissCause::SecondaryAction => Ok(DismissOutcome::Ignored),
            DismissCause::ScopeDestroyed => {
                self.recorded = true;
                self.emitter.emit(SurveyEvent::prompt_closed(
                    &self.campaign_id,
                    ClosingState::ScopeDestroyed,
                ));
                tracing::debug!(
                    target: "survey.dismissal",
                    campaign_id = %self.campaign_id,
                    "Host torn down; campaign stays eligible"
                );
                Ok(DismissOutcome::NotRecorded)
            }
            _ => {
                self.recorded = true;
                self.record_displayed(cause).await
            }
        }
    }

    async fn record_displayed(
        &self,
        cause: DismissCause,
    ) -> Result<DismissOutcome, RepositoryError> {
        let now = self.clock.now_millis();
        let newly_set = self
            .repo
            .mark_prompt_displayed(&self.campaign_id, now)
            .await?;
        if !newly_set {
            tracing::warn!(
                target: "survey.dismissal",
                campaign_id = %self.campaign_id,
                "Prompt was already marked displayed"
            );
        }

        self.emitter.emit(SurveyEvent::prompt_closed(
            &self.campaign_id,
            cause.closing_state(),
        ));
        tracing::info!(
            target: "survey.dismissal",
            campaign_id = %self.campaign_id,
            %cause,
            "Survey prompt recorded as displayed"
        );

        if cause != DismissCause::PrimaryAction {
            return Ok(DismissOutcome::Displayed);
        }

        let attempts = self.repo.load(&self.campaign_id).await?.download_attempts;
        self.emitter.emit(SurveyEvent::attempts_before_accepted(
            &self.campaign_id,
            attempts,
        ));
        Ok(DismissOutcome::Accepted { attempts })
    }
}
