//! CLI-specific error types and exit codes.

use std::path::PathBuf;

use survey_core::{FetchError, RepositoryError, SettingsError};
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// No trigger id configured for a command that needs a campaign.
    #[error("No campaign configured: set --trigger-id or trigger_id in the settings file")]
    NoCampaign,

    /// The settings file could not be read or parsed.
    #[error("Cannot load settings from {path}: {reason}")]
    SettingsFile { path: PathBuf, reason: String },

    /// Settings failed validation.
    #[error("Configuration error: {0}")]
    Settings(#[from] SettingsError),

    /// No platform data directory and no `--db`.
    #[error("Cannot determine a data directory; pass --db")]
    NoDataDir,

    /// Storage failure.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Definition download failure.
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),
}

impl CliError {
    /// Map error to an exit code (sysexits.h conventions).
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::NoCampaign => 64,                              // EX_USAGE
            Self::SettingsFile { .. } | Self::Settings(_) => 78, // EX_CONFIG
            Self::NoDataDir => 72,                               // EX_OSFILE
            Self::Database(_) => 74,                             // EX_IOERR
            Self::Fetch(_) => 69,                                // EX_UNAVAILABLE
        }
    }
}
