//! Recording system module
//!
//! - MediaCaptureController drives the camera/recording state machine
//! - RecordingBuffer accumulates chunks until the recording is finalized

pub mod buffer;
pub mod controller;
pub mod state;

pub use buffer::RecordingBuffer;
pub use controller::{CaptureEvent, ChunkSource, MediaCaptureController};
pub use state::{CaptureState, RecordedVideo, RecordingSession};
