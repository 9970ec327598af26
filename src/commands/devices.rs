//! Device listing commands

use crate::capture::audio::get_audio_input_devices;
use crate::capture::webcam::get_cameras as list_cameras;
use crate::capture::{AudioDeviceInfo, CameraInfo};

/// Get list of available audio input devices (microphones)
#[tauri::command]
pub async fn get_audio_devices() -> Result<Vec<AudioDeviceInfo>, String> {
    tauri::async_runtime::spawn_blocking(get_audio_input_devices)
        .await
        .map_err(|e| e.to_string())
}

/// Get list of available cameras/webcams
#[tauri::command]
pub async fn get_cameras() -> Result<Vec<CameraInfo>, String> {
    tauri::async_runtime::spawn_blocking(list_cameras)
        .await
        .map_err(|e| e.to_string())
}
