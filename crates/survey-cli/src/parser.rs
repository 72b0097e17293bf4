//! Main CLI parser and top-level argument handling.
//!
//! Global options describe *which* campaign and *which* store a command works
//! on; they mirror the fields of [`SurveySettings`] so a settings file can be
//! overridden from the command line or the environment.

use std::path::PathBuf;

use clap::Parser;
use survey_core::SurveySettings;

use crate::commands::Commands;

/// Command-line interface for survey-gate.
#[derive(Parser)]
#[command(name = "survey-gate")]
#[command(about = "Inspect and exercise survey invitation state")]
#[command(version)]
pub struct Cli {
    /// JSON settings file
    #[arg(long, global = true, env = "SURVEY_GATE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Path to the survey state database
    #[arg(long, global = true, env = "SURVEY_GATE_DB")]
    pub db: Option<PathBuf>,

    /// Trigger id of the campaign, from experiment configuration
    #[arg(long, global = true, env = "SURVEY_TRIGGER_ID")]
    pub trigger_id: Option<String>,

    /// Operator override replacing the trigger id
    #[arg(long, global = true, env = "SURVEY_FORCED_TRIGGER_ID")]
    pub forced_trigger_id: Option<String>,

    /// Bypass every admission check except consent
    #[arg(long, global = true)]
    pub force: bool,

    /// Sampling denominator (daily probability is 1 / N)
    #[arg(long, global = true)]
    pub max_number: Option<u32>,

    /// Cap on definition downloads per campaign (0 means unlimited)
    #[arg(long, global = true)]
    pub max_download_attempts: Option<u32>,

    /// Base URL of the survey definition service
    #[arg(long, global = true, env = "SURVEY_DEFINITION_BASE_URL")]
    pub base_url: Option<String>,

    /// Pretend today is this day of the year
    #[arg(long, global = true, value_parser = clap::value_parser!(u32).range(1..=366))]
    pub day: Option<u32>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Settings carried by the command line, to merge over a settings file.
    pub fn settings_overrides(&self) -> SurveySettings {
        SurveySettings {
            trigger_id: self.trigger_id.clone(),
            forced_trigger_id: self.forced_trigger_id.clone(),
            force_enabled: self.force,
            max_number: self.max_number,
            max_download_attempts: self.max_download_attempts,
            definition_base_url: self.base_url.clone(),
        }
    }
}
