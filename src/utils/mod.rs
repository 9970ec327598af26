//! Shared utilities

pub mod error;

pub use error::{CampaignError, CampaignResult, ErrorResponse};
