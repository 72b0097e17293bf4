//! Domain types for survey admission and presentation.
//!
//! These are pure value types with no infrastructure dependencies.

mod campaign;
mod definition;
mod dismiss;
mod filtering;
mod page;
mod state;

pub use campaign::CampaignConfig;
pub use definition::SurveyDefinition;
pub use dismiss::{ClosingState, DismissCause};
pub use filtering::{FilteringResult, GateDecision};
pub use page::{LifecycleTopic, PageEvent, PageId, PageSnapshot, SubscriptionId};
pub use state::{
    LAST_SAMPLED_DAY_KEY, PersistedSurveyState, download_attempts_key, prompt_displayed_key,
};
