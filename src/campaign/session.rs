//! Campaign session
//!
//! Composes the capture controller, the upload path and the submission
//! gate, and keeps "at most one video" true: whichever of recording or
//! upload happened last is the current video.

use super::video::{CurrentVideo, VideoSummary};
use crate::capture::MediaDevices;
use crate::config::{CampaignConfig, VideoCriteria};
use crate::form::{
    CompletedSubmission, ConsentFlag, FormData, FormField, PendingSubmission, SubmissionEntry,
    SubmissionGate, SubmissionState,
};
use crate::links::LinkOpener;
use crate::notify::{Notification, NotificationCenter};
use crate::recorder::{CaptureEvent, CaptureState, MediaCaptureController, RecordedVideo};
use crate::upload::{self, SelectedFile};
use crate::utils::CampaignResult;
use bytes::Bytes;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Everything the UI needs to render
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignSnapshot {
    pub capture_state: CaptureState,
    pub recording_duration_ms: f64,
    pub current_video: Option<VideoSummary>,
    pub form: FormData,
    pub submission_state: SubmissionState,
    pub criteria_dialog_open: bool,
    pub social_handle: String,
    pub social_page_url: String,
    pub entry: Option<SubmissionEntry>,
}

pub struct CampaignSession {
    config: CampaignConfig,
    capture: MediaCaptureController,
    selected: Option<SelectedFile>,
    form: FormData,
    gate: SubmissionGate,
    notifications: NotificationCenter,
    criteria_open: bool,
    entry: Option<SubmissionEntry>,
}

impl CampaignSession {
    pub fn new(
        config: CampaignConfig,
        devices: Arc<dyn MediaDevices>,
        notifications: NotificationCenter,
    ) -> Self {
        let capture = MediaCaptureController::new(devices, config.recording_mime_type.clone());
        let gate = SubmissionGate::new(config.submit_delay());

        Self {
            config,
            capture,
            selected: None,
            form: FormData::default(),
            gate,
            notifications,
            criteria_open: true,
            entry: None,
        }
    }

    pub fn config(&self) -> &CampaignConfig {
        &self.config
    }

    pub fn criteria(&self) -> &VideoCriteria {
        &self.config.criteria
    }

    pub fn form(&self) -> &FormData {
        &self.form
    }

    pub fn capture_state(&self) -> CaptureState {
        self.capture.state()
    }

    pub fn submission_state(&self) -> SubmissionState {
        self.gate.state()
    }

    pub fn selected_file(&self) -> Option<&SelectedFile> {
        self.selected.as_ref()
    }

    pub fn recorded_video(&self) -> Option<&RecordedVideo> {
        self.capture.recorded_video()
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    pub fn subscribe_capture(&self) -> broadcast::Receiver<CaptureEvent> {
        self.capture.subscribe()
    }

    /// The recording if there is one, else the uploaded file
    pub fn current_video(&self) -> Option<CurrentVideo<'_>> {
        self.capture
            .recorded_video()
            .map(CurrentVideo::Recorded)
            .or_else(|| self.selected.as_ref().map(CurrentVideo::Uploaded))
    }

    pub fn snapshot(&self) -> CampaignSnapshot {
        CampaignSnapshot {
            capture_state: self.capture.state(),
            recording_duration_ms: self.capture.recording_duration_ms(),
            current_video: self.current_video().map(|v| v.summary()),
            form: self.form.clone(),
            submission_state: self.gate.state(),
            criteria_dialog_open: self.criteria_open,
            social_handle: self.config.social_handle.clone(),
            social_page_url: self.config.social_page_url.clone(),
            entry: self.entry.clone(),
        }
    }

    /// Forward an error to the notification surface and hand it back
    fn report<T>(&self, result: CampaignResult<T>) -> CampaignResult<T> {
        if let Err(error) = &result {
            self.notifications.notify(*error);
        }
        result
    }

    // ---- criteria dialog ----

    pub fn acknowledge_criteria(&mut self) {
        self.criteria_open = false;
    }

    // ---- capture ----

    pub async fn start_camera(&mut self) -> CampaignResult<CaptureState> {
        let result = self.capture.start_camera().await;
        self.report(result)
    }

    pub fn start_recording(&mut self) -> CampaignResult<CaptureState> {
        let result = self.capture.start_recording();
        self.report(result)
    }

    pub fn push_chunk(&mut self, chunk: Bytes) -> bool {
        self.capture.push_chunk(chunk)
    }

    pub fn drain_chunks(&mut self) -> usize {
        self.capture.drain_chunks()
    }

    /// Finalize the recording; it replaces any uploaded file
    pub fn stop_recording(&mut self) -> CaptureState {
        let state = self.capture.stop_recording();
        if state == CaptureState::HasRecordedVideo && self.selected.take().is_some() {
            tracing::debug!("Uploaded video replaced by recording");
        }
        state
    }

    pub fn stop_camera(&mut self) -> CaptureState {
        self.capture.stop_camera()
    }

    /// Drop both videos and release the camera
    pub fn reset(&mut self) {
        self.capture.reset();
        self.selected = None;
    }

    // ---- upload ----

    /// Use `file` as the current video; it replaces any recording
    pub fn select_file(&mut self, file: SelectedFile) -> CampaignResult<()> {
        let result = upload::check_size(&file, self.config.max_upload_bytes);
        self.report(result)?;

        tracing::info!("Selected {} ({} bytes)", file.name, file.size_bytes);
        self.capture.clear_recording();
        self.selected = Some(file);
        Ok(())
    }

    // ---- form ----

    pub fn update_field(&mut self, field: FormField, value: impl Into<String>) {
        self.form.update_field(field, value);
    }

    pub fn toggle_consent(&mut self, flag: ConsentFlag) -> bool {
        self.form.toggle_consent(flag)
    }

    pub fn set_consent(&mut self, flag: ConsentFlag, value: bool) {
        self.form.set_consent(flag, value);
    }

    /// Open the social page and take the click as proof of the visit
    pub fn mark_page_visited(&mut self, opener: &dyn LinkOpener) {
        if let Err(e) = opener.open(&self.config.social_page_url) {
            tracing::warn!("{}", e);
        }
        self.form.has_shared_page = true;
        self.notifications.notify(Notification::normal(
            "Great! 🎄",
            "Follow us and come back to complete your entry!",
        ));
    }

    // ---- submission ----

    /// Validate and move to Submitting. The caller awaits
    /// [`PendingSubmission::complete`] and hands the result back through
    /// [`CampaignSession::finish_submission`].
    pub fn begin_submission(&mut self) -> CampaignResult<Option<PendingSubmission>> {
        let video = self.current_video().map(|v| v.summary());
        let result = self.gate.begin(video, &self.form);
        self.report(result)
    }

    /// Record a completed submission. Returns false, and stores nothing,
    /// when the session was reloaded while the submission was in flight.
    pub fn finish_submission(&mut self, completed: CompletedSubmission) -> bool {
        if !self.gate.owns(&completed) {
            tracing::debug!(
                "Dropping entry {} from a reloaded session",
                completed.entry().id
            );
            return false;
        }

        self.entry = Some(completed.into_entry());
        self.notifications.notify(Notification::normal(
            "Submission Successful! 🎉🎄",
            "You're now in the Christmas & New Year Lucky Draw!",
        ));
        true
    }

    /// Validate, wait out the delay and land in Submitted
    pub async fn submit(&mut self) -> CampaignResult<SubmissionState> {
        if let Some(pending) = self.begin_submission()? {
            let completed = pending.complete().await;
            self.finish_submission(completed);
        }
        Ok(self.gate.state())
    }

    /// Start over with a blank session ("submit another video")
    pub fn reload(&mut self) {
        self.reset();
        self.form = FormData::default();
        self.gate = SubmissionGate::new(self.config.submit_delay());
        self.criteria_open = true;
        self.entry = None;
        tracing::info!("Campaign session reloaded");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::campaign::VideoSource;
    use crate::capture::testing::FakeDevices;
    use crate::links::LinkError;
    use crate::notify::Severity;
    use crate::utils::CampaignError;
    use parking_lot::Mutex;
    use std::sync::atomic::Ordering;

    const MB: u64 = 1024 * 1024;

    fn session(devices: FakeDevices) -> CampaignSession {
        CampaignSession::new(
            CampaignConfig::default(),
            Arc::new(devices),
            NotificationCenter::new(),
        )
    }

    fn clip(size_bytes: u64) -> SelectedFile {
        SelectedFile::new("clip.mp4", size_bytes, "video/mp4")
    }

    async fn record(session: &mut CampaignSession) {
        session.start_camera().await.unwrap();
        session.start_recording().unwrap();
        session.stop_recording();
    }

    #[derive(Default)]
    struct RememberingOpener {
        opened: Mutex<Vec<String>>,
        fail: bool,
    }

    impl LinkOpener for RememberingOpener {
        fn open(&self, url: &str) -> Result<(), LinkError> {
            self.opened.lock().push(url.to_string());
            if self.fail {
                return Err(LinkError {
                    url: url.to_string(),
                    reason: "popup blocked".to_string(),
                });
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_recording_replaces_upload() {
        let mut s = session(FakeDevices::granting(&[b"rec"]));
        s.select_file(clip(5 * MB)).unwrap();
        assert_eq!(s.current_video().unwrap().source(), VideoSource::Uploaded);

        record(&mut s).await;
        assert_eq!(s.current_video().unwrap().source(), VideoSource::Recorded);
        assert!(s.selected_file().is_none());
    }

    #[tokio::test]
    async fn test_upload_replaces_recording() {
        let mut s = session(FakeDevices::granting(&[b"rec"]));
        record(&mut s).await;

        s.select_file(clip(5 * MB)).unwrap();
        assert_eq!(s.current_video().unwrap().source(), VideoSource::Uploaded);
        assert!(s.recorded_video().is_none());
        assert_eq!(s.capture_state(), CaptureState::Idle);
    }

    #[tokio::test]
    async fn test_oversized_upload_changes_nothing() {
        let mut s = session(FakeDevices::granting(&[b"rec"]));
        let mut notes = s.notifications().subscribe();
        record(&mut s).await;
        let before = s.current_video().unwrap().summary();

        assert_eq!(s.select_file(clip(101 * MB)), Err(CampaignError::FileTooLarge));
        assert_eq!(s.current_video().unwrap().summary(), before);
        assert!(s.selected_file().is_none());

        let note = notes.try_recv().unwrap();
        assert_eq!(note.title, "File Too Large");
        assert_eq!(note.severity, Severity::Destructive);
    }

    #[tokio::test]
    async fn test_denied_camera_notifies() {
        let mut s = session(FakeDevices::denying());
        let mut notes = s.notifications().subscribe();

        assert_eq!(s.start_camera().await, Err(CampaignError::CameraAccessDenied));
        assert_eq!(notes.try_recv().unwrap().title, "Camera Access Denied");
    }

    #[tokio::test]
    async fn test_submit_without_video() {
        let mut s = session(FakeDevices::granting(&[]));
        s.set_consent(ConsentFlag::PermissionGranted, true);
        s.set_consent(ConsentFlag::AlreadyFollowing, true);

        assert_eq!(s.submit().await, Err(CampaignError::MissingVideo));
        assert_eq!(s.submission_state(), SubmissionState::Idle);
    }

    #[tokio::test]
    async fn test_submit_without_permission() {
        let mut s = session(FakeDevices::granting(&[]));
        s.select_file(clip(MB)).unwrap();
        s.set_consent(ConsentFlag::AlreadyFollowing, true);
        s.set_consent(ConsentFlag::HasSharedPage, true);

        assert_eq!(s.submit().await, Err(CampaignError::PermissionNotGranted));
        assert_eq!(s.submission_state(), SubmissionState::Idle);
    }

    #[tokio::test]
    async fn test_submit_without_follow() {
        let mut s = session(FakeDevices::granting(&[]));
        let mut notes = s.notifications().subscribe();
        s.select_file(clip(MB)).unwrap();
        s.toggle_consent(ConsentFlag::PermissionGranted);

        assert_eq!(s.submit().await, Err(CampaignError::FollowRequirementNotMet));
        assert_eq!(notes.try_recv().unwrap().title, "Follow Required");
    }

    #[tokio::test(start_paused = true)]
    async fn test_valid_submission_completes() {
        let mut s = session(FakeDevices::granting(&[b"rec"]));
        let mut notes = s.notifications().subscribe();
        record(&mut s).await;
        s.update_field(FormField::Name, "Jane");
        s.update_field(FormField::SocialHandle, "@jane");
        s.toggle_consent(ConsentFlag::PermissionGranted);
        s.toggle_consent(ConsentFlag::AlreadyFollowing);

        assert_eq!(s.submit().await, Ok(SubmissionState::Submitted));

        let note = notes.try_recv().unwrap();
        assert_eq!(note.severity, Severity::Normal);
        let entry = s.snapshot().entry.unwrap();
        assert_eq!(entry.social_handle, "jane");
        assert_eq!(entry.video.source, VideoSource::Recorded);

        // Submitted is terminal until reload
        assert_eq!(s.submit().await, Ok(SubmissionState::Submitted));
        s.reload();
        assert_eq!(s.submission_state(), SubmissionState::Idle);
        assert!(s.current_video().is_none());
        assert_eq!(s.form(), &FormData::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_split_submission_is_observable() {
        let mut s = session(FakeDevices::granting(&[]));
        s.select_file(clip(MB)).unwrap();
        s.set_consent(ConsentFlag::PermissionGranted, true);
        s.set_consent(ConsentFlag::AlreadyFollowing, true);

        let pending = s.begin_submission().unwrap().unwrap();
        assert_eq!(s.snapshot().submission_state, SubmissionState::Submitting);

        let completed = pending.complete().await;
        assert!(s.finish_submission(completed));
        assert_eq!(s.submission_state(), SubmissionState::Submitted);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reload_during_submit_delay_drops_entry() {
        let mut s = session(FakeDevices::granting(&[]));
        let mut notes = s.notifications().subscribe();
        s.select_file(clip(MB)).unwrap();
        s.set_consent(ConsentFlag::PermissionGranted, true);
        s.set_consent(ConsentFlag::AlreadyFollowing, true);

        let pending = s.begin_submission().unwrap().unwrap();
        s.reload();

        let completed = pending.complete().await;
        assert!(!s.finish_submission(completed));

        let snapshot = s.snapshot();
        assert_eq!(snapshot.submission_state, SubmissionState::Idle);
        assert!(snapshot.entry.is_none());
        assert!(notes.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_recorder_failure_notifies() {
        let devices = FakeDevices::failing_recorder();
        let stopped = devices.stopped_counter();
        let mut s = session(devices);
        let mut notes = s.notifications().subscribe();

        s.start_camera().await.unwrap();
        assert_eq!(s.start_recording(), Err(CampaignError::CameraAccessDenied));

        assert_eq!(notes.try_recv().unwrap().title, "Camera Access Denied");
        assert_eq!(s.capture_state(), CaptureState::Idle);
        assert_eq!(stopped.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_page_visit_is_trusted() {
        let mut s = session(FakeDevices::granting(&[]));
        let mut notes = s.notifications().subscribe();
        let opener = RememberingOpener {
            fail: true,
            ..Default::default()
        };

        s.mark_page_visited(&opener);

        assert!(s.form().has_shared_page);
        assert_eq!(
            opener.opened.lock().as_slice(),
            ["https://instagram.com/downtown.30".to_string()]
        );
        assert_eq!(notes.try_recv().unwrap().title, "Great! 🎄");
    }

    #[tokio::test]
    async fn test_reset_clears_everything() {
        let devices = FakeDevices::granting(&[b"rec"]);
        let stopped = devices.stopped_counter();
        let mut s = session(devices);

        s.select_file(clip(MB)).unwrap();
        s.start_camera().await.unwrap();
        s.reset();

        assert_eq!(s.capture_state(), CaptureState::Idle);
        assert!(s.current_video().is_none());
        assert_eq!(stopped.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_criteria_dialog_starts_open() {
        let mut s = session(FakeDevices::granting(&[]));
        assert!(s.snapshot().criteria_dialog_open);
        assert_eq!(s.criteria().min_duration_secs, 15);

        s.acknowledge_criteria();
        assert!(!s.snapshot().criteria_dialog_open);
    }
}
