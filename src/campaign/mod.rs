//! The campaign session: capture, upload and the entry form in one place
//!
//! The host UI layer drives a [`CampaignSession`] through its transition
//! methods and renders [`CampaignSnapshot`]s and notifications.

mod session;
mod video;

pub use session::{CampaignSession, CampaignSnapshot};
pub use video::{CurrentVideo, VideoSource, VideoSummary};
