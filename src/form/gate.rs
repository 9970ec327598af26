//! Submission gate
//!
//! Validation runs in a fixed order and stops at the first failure:
//! a video, then permission, then follow-or-visit. A valid entry moves
//! Idle -> Submitting, and Submitting -> Submitted once the simulated delay
//! has passed. Nothing leads back to Idle.

use super::data::FormData;
use crate::campaign::VideoSummary;
use crate::utils::{CampaignError, CampaignResult};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Where the submission stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionState {
    Idle,
    Submitting,
    Submitted,
}

impl Default for SubmissionState {
    fn default() -> Self {
        Self::Idle
    }
}

/// What a successful submission carries
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionEntry {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: String,
    pub social_handle: String,
    pub video: VideoSummary,
    pub submitted_at: DateTime<Utc>,
}

impl SubmissionEntry {
    fn new(form: &FormData, video: VideoSummary) -> Self {
        let email = form.email.trim();
        Self {
            id: Uuid::new_v4(),
            name: form.name.trim().to_string(),
            email: (!email.is_empty()).then(|| email.to_string()),
            phone: form.phone.trim().to_string(),
            social_handle: form.social_handle.trim().to_string(),
            video,
            submitted_at: Utc::now(),
        }
    }
}

/// Check the entry preconditions in order
pub fn validate(video: Option<&VideoSummary>, form: &FormData) -> CampaignResult<()> {
    if video.is_none() {
        return Err(CampaignError::MissingVideo);
    }
    if !form.permission_granted {
        return Err(CampaignError::PermissionNotGranted);
    }
    if !form.meets_follow_requirement() {
        return Err(CampaignError::FollowRequirementNotMet);
    }
    Ok(())
}

pub struct SubmissionGate {
    state: Arc<RwLock<SubmissionState>>,
    delay: Duration,
}

impl SubmissionGate {
    pub fn new(delay: Duration) -> Self {
        Self {
            state: Arc::new(RwLock::new(SubmissionState::Idle)),
            delay,
        }
    }

    pub fn state(&self) -> SubmissionState {
        *self.state.read()
    }

    /// Validate and move to Submitting. `Ok(None)` when a submission is
    /// already underway or done.
    pub fn begin(
        &self,
        video: Option<VideoSummary>,
        form: &FormData,
    ) -> CampaignResult<Option<PendingSubmission>> {
        let current = self.state();
        if current != SubmissionState::Idle {
            tracing::debug!("submit ignored in state {:?}", current);
            return Ok(None);
        }

        validate(video.as_ref(), form)?;
        let video = video.ok_or(CampaignError::MissingVideo)?;

        *self.state.write() = SubmissionState::Submitting;
        tracing::info!("Submitting entry for @{}", form.social_handle);

        Ok(Some(PendingSubmission {
            state: self.state.clone(),
            delay: self.delay,
            entry: SubmissionEntry::new(form, video),
        }))
    }

    /// Whether `completed` was started by this gate and landed here. A
    /// gate replaced mid-flight never owns the old submission.
    pub fn owns(&self, completed: &CompletedSubmission) -> bool {
        Arc::ptr_eq(&self.state, &completed.state) && self.state() == SubmissionState::Submitted
    }
}

/// A submission waiting out its simulated delay
#[derive(Debug)]
pub struct PendingSubmission {
    state: Arc<RwLock<SubmissionState>>,
    delay: Duration,
    entry: SubmissionEntry,
}

impl PendingSubmission {
    pub fn entry(&self) -> &SubmissionEntry {
        &self.entry
    }

    /// Wait for the delay, then mark the originating gate Submitted
    pub async fn complete(self) -> CompletedSubmission {
        tokio::time::sleep(self.delay).await;
        *self.state.write() = SubmissionState::Submitted;
        tracing::info!("Entry {} submitted", self.entry.id);
        CompletedSubmission {
            state: self.state,
            entry: self.entry,
        }
    }
}

/// A submission whose delay has passed, tied to the gate that started it
#[derive(Debug)]
pub struct CompletedSubmission {
    state: Arc<RwLock<SubmissionState>>,
    entry: SubmissionEntry,
}

impl CompletedSubmission {
    pub fn entry(&self) -> &SubmissionEntry {
        &self.entry
    }

    pub fn into_entry(self) -> SubmissionEntry {
        self.entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::campaign::VideoSource;

    fn video() -> VideoSummary {
        VideoSummary {
            source: VideoSource::Uploaded,
            object_url: "blob:upload/clip.mp4".to_string(),
            size_bytes: 10,
            mime_type: "video/mp4".to_string(),
            name: Some("clip.mp4".to_string()),
            duration_ms: None,
        }
    }

    fn eligible() -> FormData {
        FormData {
            name: " Jane ".to_string(),
            phone: "0123".to_string(),
            social_handle: "jane".to_string(),
            permission_granted: true,
            already_following: true,
            ..FormData::default()
        }
    }

    #[test]
    fn test_missing_video_wins_over_everything() {
        assert_eq!(
            validate(None, &FormData::default()),
            Err(CampaignError::MissingVideo)
        );
        assert_eq!(validate(None, &eligible()), Err(CampaignError::MissingVideo));
    }

    #[test]
    fn test_permission_checked_before_follow() {
        let form = FormData {
            already_following: true,
            has_shared_page: true,
            ..FormData::default()
        };
        assert_eq!(
            validate(Some(&video()), &form),
            Err(CampaignError::PermissionNotGranted)
        );
    }

    #[test]
    fn test_follow_or_share_required() {
        let mut form = eligible();
        form.already_following = false;
        assert_eq!(
            validate(Some(&video()), &form),
            Err(CampaignError::FollowRequirementNotMet)
        );

        form.has_shared_page = true;
        assert!(validate(Some(&video()), &form).is_ok());
    }

    #[test]
    fn test_invalid_submit_stays_idle() {
        let gate = SubmissionGate::new(Duration::from_millis(2000));
        assert!(gate.begin(None, &eligible()).is_err());
        assert_eq!(gate.state(), SubmissionState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_valid_submit_goes_through_submitting() {
        let gate = SubmissionGate::new(Duration::from_millis(2000));
        let pending = gate.begin(Some(video()), &eligible()).unwrap().unwrap();
        assert_eq!(gate.state(), SubmissionState::Submitting);
        assert_eq!(pending.entry().name, "Jane");
        assert_eq!(pending.entry().email, None);

        // A second submit while in flight does nothing
        assert!(gate.begin(Some(video()), &eligible()).unwrap().is_none());

        let started = tokio::time::Instant::now();
        let completed = pending.complete().await;
        assert!(started.elapsed() >= Duration::from_millis(2000));
        assert_eq!(gate.state(), SubmissionState::Submitted);
        assert!(gate.owns(&completed));
        assert_eq!(completed.entry().social_handle, "jane");

        assert!(gate.begin(Some(video()), &eligible()).unwrap().is_none());
        assert_eq!(gate.state(), SubmissionState::Submitted);
    }

    #[tokio::test(start_paused = true)]
    async fn test_replaced_gate_does_not_own_old_submission() {
        let old = SubmissionGate::new(Duration::from_millis(2000));
        let pending = old.begin(Some(video()), &eligible()).unwrap().unwrap();

        let fresh = SubmissionGate::new(Duration::from_millis(2000));
        let completed = pending.complete().await;

        assert!(old.owns(&completed));
        assert!(!fresh.owns(&completed));
        assert_eq!(fresh.state(), SubmissionState::Idle);
    }
}
