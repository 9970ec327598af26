//! Campaign Tauri commands
//!
//! Thin IPC wrappers around the shared [`CampaignSession`]. Every mutating
//! command answers with a fresh snapshot so the webview can re-render.

use crate::campaign::{CampaignSession, CampaignSnapshot};
use crate::capture::webcam::WebcamDevices;
use crate::config::{CampaignConfig, VideoCriteria};
use crate::form::{ConsentFlag, FormField};
use crate::links::{LinkError, LinkOpener};
use crate::notify::NotificationCenter;
use crate::upload::SelectedFile;
use crate::utils::{CampaignError, ErrorResponse};
use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tauri::{AppHandle, Emitter, State};
use tauri_plugin_dialog::DialogExt;
use tauri_plugin_shell::ShellExt;
use tokio::sync::Mutex;

/// Event carrying a [`crate::notify::Notification`]
pub const NOTIFICATION_EVENT: &str = "campaign://notification";

/// Event carrying a [`crate::recorder::CaptureEvent`]
pub const CAPTURE_EVENT: &str = "campaign://capture";

/// Event carrying a [`CampaignSnapshot`] while a submission is in flight
pub const SNAPSHOT_EVENT: &str = "campaign://snapshot";

/// Application state for the campaign
pub struct CampaignState {
    pub session: Arc<Mutex<CampaignSession>>,
}

impl CampaignState {
    pub fn new(config: CampaignConfig, notifications: NotificationCenter) -> Self {
        let devices = Arc::new(WebcamDevices::new());
        Self {
            session: Arc::new(Mutex::new(CampaignSession::new(config, devices, notifications))),
        }
    }
}

/// Opens links in the system browser
pub struct ShellLinkOpener {
    app: AppHandle,
}

impl ShellLinkOpener {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }
}

impl LinkOpener for ShellLinkOpener {
    fn open(&self, url: &str) -> Result<(), LinkError> {
        #[allow(deprecated)]
        self.app.shell().open(url, None).map_err(|e| LinkError {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

fn invalid_file(path: &Path, error: std::io::Error) -> ErrorResponse {
    ErrorResponse {
        code: "INVALID_FILE".to_string(),
        message: format!("Could not read {:?}: {}", path, error),
    }
}

/// Get the current campaign state
#[tauri::command]
pub async fn get_campaign_state(
    state: State<'_, CampaignState>,
) -> Result<CampaignSnapshot, ErrorResponse> {
    Ok(state.session.lock().await.snapshot())
}

/// Get the video guidelines for the criteria dialog
#[tauri::command]
pub async fn get_video_criteria(
    state: State<'_, CampaignState>,
) -> Result<VideoCriteria, ErrorResponse> {
    Ok(state.session.lock().await.criteria().clone())
}

/// Close the criteria dialog
#[tauri::command]
pub async fn acknowledge_criteria(
    state: State<'_, CampaignState>,
) -> Result<CampaignSnapshot, ErrorResponse> {
    let mut session = state.session.lock().await;
    session.acknowledge_criteria();
    Ok(session.snapshot())
}

/// Acquire the camera and microphone
#[tauri::command]
pub async fn start_camera(
    state: State<'_, CampaignState>,
) -> Result<CampaignSnapshot, ErrorResponse> {
    let mut session = state.session.lock().await;
    session.start_camera().await?;
    Ok(session.snapshot())
}

/// Release the camera without recording
#[tauri::command]
pub async fn stop_camera(
    state: State<'_, CampaignState>,
) -> Result<CampaignSnapshot, ErrorResponse> {
    let mut session = state.session.lock().await;
    session.stop_camera();
    Ok(session.snapshot())
}

/// Start recording from the live camera
#[tauri::command]
pub async fn start_recording(
    state: State<'_, CampaignState>,
) -> Result<CampaignSnapshot, ErrorResponse> {
    let mut session = state.session.lock().await;
    session.start_recording()?;
    Ok(session.snapshot())
}

/// Append a recorded chunk produced by the webview's recorder. Returns
/// false once the stream's own recorder is feeding the recording.
#[tauri::command]
pub async fn push_recording_chunk(
    state: State<'_, CampaignState>,
    chunk: Vec<u8>,
) -> Result<bool, ErrorResponse> {
    Ok(state.session.lock().await.push_chunk(Bytes::from(chunk)))
}

/// Stop recording and keep the result
#[tauri::command]
pub async fn stop_recording(
    state: State<'_, CampaignState>,
) -> Result<CampaignSnapshot, ErrorResponse> {
    let mut session = state.session.lock().await;
    session.stop_recording();
    Ok(session.snapshot())
}

/// Raw bytes of the finalized recording, for a playable blob URL
#[tauri::command]
pub async fn read_recorded_video(
    state: State<'_, CampaignState>,
) -> Result<tauri::ipc::Response, ErrorResponse> {
    let session = state.session.lock().await;
    let video = session
        .recorded_video()
        .ok_or(CampaignError::MissingVideo)?;
    Ok(tauri::ipc::Response::new(video.data().to_vec()))
}

/// Drop the current video and release the camera
#[tauri::command]
pub async fn reset_video(
    state: State<'_, CampaignState>,
) -> Result<CampaignSnapshot, ErrorResponse> {
    let mut session = state.session.lock().await;
    session.reset();
    Ok(session.snapshot())
}

/// Use a video file on disk
#[tauri::command]
pub async fn select_file(
    state: State<'_, CampaignState>,
    path: String,
) -> Result<CampaignSnapshot, ErrorResponse> {
    let path = PathBuf::from(path);
    let file = SelectedFile::from_path(&path)
        .await
        .map_err(|e| invalid_file(&path, e))?;

    let mut session = state.session.lock().await;
    session.select_file(file)?;
    Ok(session.snapshot())
}

/// Let the user pick a video file, then use it
#[tauri::command]
pub async fn pick_video_file(
    app: AppHandle,
    state: State<'_, CampaignState>,
) -> Result<CampaignSnapshot, ErrorResponse> {
    let picker = app.clone();
    let picked = tauri::async_runtime::spawn_blocking(move || {
        picker
            .dialog()
            .file()
            .add_filter("Video", &["mp4", "m4v", "webm", "mov", "mkv", "avi", "3gp"])
            .blocking_pick_file()
    })
    .await
    .map_err(|e| ErrorResponse {
        code: "DIALOG_ERROR".to_string(),
        message: e.to_string(),
    })?;

    let Some(picked) = picked else {
        return Ok(state.session.lock().await.snapshot());
    };
    let path = picked.into_path().map_err(|e| ErrorResponse {
        code: "INVALID_FILE".to_string(),
        message: e.to_string(),
    })?;

    select_file(state, path.to_string_lossy().to_string()).await
}

/// Update one text field
#[tauri::command]
pub async fn update_field(
    state: State<'_, CampaignState>,
    field: FormField,
    value: String,
) -> Result<CampaignSnapshot, ErrorResponse> {
    let mut session = state.session.lock().await;
    session.update_field(field, value);
    Ok(session.snapshot())
}

/// Flip a consent checkbox
#[tauri::command]
pub async fn toggle_consent(
    state: State<'_, CampaignState>,
    flag: ConsentFlag,
) -> Result<CampaignSnapshot, ErrorResponse> {
    let mut session = state.session.lock().await;
    session.toggle_consent(flag);
    Ok(session.snapshot())
}

/// Set a consent checkbox to a known value
#[tauri::command]
pub async fn set_consent(
    state: State<'_, CampaignState>,
    flag: ConsentFlag,
    value: bool,
) -> Result<CampaignSnapshot, ErrorResponse> {
    let mut session = state.session.lock().await;
    session.set_consent(flag, value);
    Ok(session.snapshot())
}

/// Open the social page and count it as visited
#[tauri::command]
pub async fn open_social_page(
    app: AppHandle,
    state: State<'_, CampaignState>,
) -> Result<CampaignSnapshot, ErrorResponse> {
    let mut session = state.session.lock().await;
    session.mark_page_visited(&ShellLinkOpener::new(app));
    Ok(session.snapshot())
}

/// Submit the entry. The session is unlocked during the simulated delay
/// so the webview can keep polling state.
#[tauri::command]
pub async fn submit_entry(
    app: AppHandle,
    state: State<'_, CampaignState>,
) -> Result<CampaignSnapshot, ErrorResponse> {
    let pending = {
        let mut session = state.session.lock().await;
        match session.begin_submission()? {
            Some(pending) => {
                if let Err(e) = app.emit(SNAPSHOT_EVENT, session.snapshot()) {
                    tracing::warn!("Failed to emit {}: {}", SNAPSHOT_EVENT, e);
                }
                pending
            }
            None => return Ok(session.snapshot()),
        }
    };

    let completed = pending.complete().await;

    // A reload during the delay swaps the gate; the stale result is dropped
    let mut session = state.session.lock().await;
    session.finish_submission(completed);
    Ok(session.snapshot())
}

/// Start over ("submit another video")
#[tauri::command]
pub async fn reload_campaign(
    state: State<'_, CampaignState>,
) -> Result<CampaignSnapshot, ErrorResponse> {
    let mut session = state.session.lock().await;
    session.reload();
    Ok(session.snapshot())
}
