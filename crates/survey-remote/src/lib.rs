//! Survey definition service client.
//!
//! Implements the `SurveyDefinitionFetcher` port from `survey-core` over
//! HTTP. Definitions are fetched from `{base_url}/{campaign_id}` as JSON and
//! cached per campaign so that expiry checks on app resume do not hit the
//! network again.
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]
// DefaultSurveyFetcher is meant to be used through the port trait, not its
// internal generic structure
#![allow(private_interfaces, private_bounds)]

mod client;
mod config;
mod error;
mod http;

// ============================================================================
// Public API
// ============================================================================

// Client
pub use client::{DefaultSurveyFetcher, HttpSurveyFetcher};

// Configuration
pub use config::RemoteClientConfig;

// Silence unused dev-dependency warnings
#[cfg(test)]
use tokio_test as _;
