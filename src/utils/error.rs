//! Error types and handling
//!
//! The five user-facing failures of the campaign flow. None of them is
//! fatal: each one becomes a destructive notification and the session
//! stays where it was.

use crate::notify::{Notification, Severity};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Campaign-wide error type
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CampaignError {
    #[error("Camera access denied")]
    CameraAccessDenied,

    #[error("File too large")]
    FileTooLarge,

    #[error("No video")]
    MissingVideo,

    #[error("Permission required")]
    PermissionNotGranted,

    #[error("Follow required")]
    FollowRequirementNotMet,
}

impl CampaignError {
    /// Stable code for the IPC boundary
    pub fn code(&self) -> &'static str {
        match self {
            CampaignError::CameraAccessDenied => "CAMERA_ACCESS_DENIED",
            CampaignError::FileTooLarge => "FILE_TOO_LARGE",
            CampaignError::MissingVideo => "MISSING_VIDEO",
            CampaignError::PermissionNotGranted => "PERMISSION_NOT_GRANTED",
            CampaignError::FollowRequirementNotMet => "FOLLOW_REQUIREMENT_NOT_MET",
        }
    }

    /// Toast title shown to the user
    pub fn title(&self) -> &'static str {
        match self {
            CampaignError::CameraAccessDenied => "Camera Access Denied",
            CampaignError::FileTooLarge => "File Too Large",
            CampaignError::MissingVideo => "No Video",
            CampaignError::PermissionNotGranted => "Permission Required",
            CampaignError::FollowRequirementNotMet => "Follow Required",
        }
    }

    /// Toast description shown to the user
    pub fn description(&self) -> &'static str {
        match self {
            CampaignError::CameraAccessDenied => "Please allow camera access to record a video.",
            CampaignError::FileTooLarge => "Please upload a video under 100MB.",
            CampaignError::MissingVideo => "Please record or upload a video first.",
            CampaignError::PermissionNotGranted => {
                "Please grant permission to share your video on social media."
            }
            CampaignError::FollowRequirementNotMet => {
                "Please follow us on Instagram or share our page to be eligible for the lucky draw."
            }
        }
    }
}

impl From<CampaignError> for Notification {
    fn from(error: CampaignError) -> Self {
        Notification::new(error.title(), error.description(), Severity::Destructive)
    }
}

/// Error response for frontend
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<CampaignError> for ErrorResponse {
    fn from(error: CampaignError) -> Self {
        ErrorResponse {
            code: error.code().to_string(),
            message: error.description().to_string(),
        }
    }
}

/// Result type alias using CampaignError
pub type CampaignResult<T> = Result<T, CampaignError>;
