//! Survey prompt UI port.
//!
//! The scheduler never touches rendering details. It asks the host to render
//! a prompt and hands over a [`PromptResponder`]; the host reports acceptance
//! or dismissal through it.

use thiserror::Error;
use tokio::sync::mpsc;

use crate::domain::{CampaignConfig, DismissCause, SurveyDefinition};

/// User or host reaction to a rendered prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptReply {
    /// The user opted in.
    Accepted,
    /// The prompt went away for `cause`.
    Dismissed(DismissCause),
}

/// Reply channel given to the UI host with each rendered prompt.
///
/// Sending after the scheduler has finished is a silent no-op.
#[derive(Debug, Clone)]
pub struct PromptResponder {
    tx: mpsc::UnboundedSender<PromptReply>,
}

impl PromptResponder {
    /// Wrap a reply sender.
    pub const fn new(tx: mpsc::UnboundedSender<PromptReply>) -> Self {
        Self { tx }
    }

    /// Report that the user accepted the invitation.
    pub fn accept(&self) {
        let _ = self.tx.send(PromptReply::Accepted);
    }

    /// Report that the prompt was dismissed.
    pub fn dismissed(&self, cause: DismissCause) {
        let _ = self.tx.send(PromptReply::Dismissed(cause));
    }
}

/// Errors a UI host may report when asked to render.
#[derive(Debug, Error)]
pub enum UiError {
    /// There is no container to attach the prompt to.
    #[error("No prompt container available")]
    NoContainer,

    /// The host declined for another reason.
    #[error("Host refused to render: {0}")]
    Refused(String),
}

/// Port for presenting survey prompts.
pub trait SurveyUiHost: Send + Sync {
    /// Render the invitation for `config`.
    ///
    /// Must return promptly; the outcome arrives later through `responder`.
    fn render(
        &self,
        config: &CampaignConfig,
        definition: &SurveyDefinition,
        responder: PromptResponder,
    ) -> Result<(), UiError>;

    /// Take a rendered prompt down programmatically.
    fn dismiss(&self, campaign_id: &str, cause: DismissCause);
}
