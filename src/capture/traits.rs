//! Capture trait definitions
//!
//! Platform-agnostic seams for the camera/microphone device and the
//! recorder that runs on top of an acquired stream.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

/// Where recorded chunks are delivered
pub type ChunkSender = mpsc::UnboundedSender<Bytes>;

/// Device-level failures. The session reports all of them as
/// "camera access denied".
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Platform error: {0}")]
    Platform(String),
}

/// Which camera to prefer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    User,
    Environment,
}

/// What to ask the device for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamConstraints {
    /// Camera to prefer
    pub facing_mode: FacingMode,

    /// Whether a microphone track is required
    pub audio: bool,
}

impl Default for StreamConstraints {
    fn default() -> Self {
        Self {
            facing_mode: FacingMode::User,
            audio: true,
        }
    }
}

/// Information about an audio device
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioDeviceInfo {
    /// Unique device ID
    pub id: String,

    /// Device name
    pub name: String,

    /// Whether this is the default device
    pub is_default: bool,
}

/// Information about a camera/webcam
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraInfo {
    /// Unique device ID
    pub id: String,

    /// Device name
    pub name: String,

    /// Supported resolutions
    pub supported_resolutions: Vec<Resolution>,
}

/// Video resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

/// Source of device streams
#[async_trait]
pub trait MediaDevices: Send + Sync {
    /// Acquire a video+audio stream. Suspends while the platform asks the
    /// user for permission.
    async fn request_stream(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<Box<dyn MediaStream>, DeviceError>;
}

/// A live device stream with a recorder attached to it
pub trait MediaStream: Send {
    /// Stream identifier, for logging
    fn id(&self) -> &str;

    /// Begin delivering recorded chunks into `sink`
    fn start_recording(&mut self, sink: ChunkSender) -> Result<(), DeviceError>;

    /// Stop the recorder. Every chunk produced so far must have been sent
    /// and the sink dropped when this returns.
    fn stop_recording(&mut self);

    /// Stop every underlying track and release the device
    fn stop(&mut self);

    /// Whether the tracks are still live
    fn is_live(&self) -> bool;

    /// MIME type of the chunks this recorder produces, when the stream
    /// knows better than the configured default
    fn mime_type(&self) -> Option<String> {
        None
    }
}
