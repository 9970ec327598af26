//! Device capture
//!
//! Traits for acquiring a camera/microphone stream plus the desktop
//! implementations built on nokhwa and cpal.

pub mod traits;

#[cfg(feature = "desktop")]
pub mod audio;

#[cfg(feature = "desktop")]
pub mod webcam;

#[cfg(test)]
pub(crate) mod testing;

pub use traits::{
    AudioDeviceInfo, CameraInfo, ChunkSender, DeviceError, FacingMode, MediaDevices, MediaStream,
    Resolution, StreamConstraints,
};
