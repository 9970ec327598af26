//! Microphone discovery via cpal

use super::traits::AudioDeviceInfo;
use cpal::traits::{DeviceTrait, HostTrait};

/// List available audio input devices
pub fn get_audio_input_devices() -> Vec<AudioDeviceInfo> {
    let host = cpal::default_host();
    let default_name = host
        .default_input_device()
        .and_then(|d| d.name().ok());

    match host.input_devices() {
        Ok(devices) => devices
            .filter_map(|device| device.name().ok())
            .map(|name| AudioDeviceInfo {
                id: name.clone(),
                is_default: default_name.as_deref() == Some(name.as_str()),
                name,
            })
            .collect(),
        Err(e) => {
            tracing::warn!("Failed to enumerate audio input devices: {:?}", e);
            Vec::new()
        }
    }
}

/// The default microphone, if the host exposes one
pub fn default_microphone() -> Option<AudioDeviceInfo> {
    let device = cpal::default_host().default_input_device()?;
    let name = device.name().unwrap_or_else(|_| "Default microphone".to_string());

    Some(AudioDeviceInfo {
        id: name.clone(),
        name,
        is_default: true,
    })
}
