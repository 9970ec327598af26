//! Media capture controller
//!
//! Owns the device stream and the recording in progress. Transitions:
//!
//! ```text
//! Idle --start_camera--> CameraActive --start_recording--> Recording
//! Recording --stop_recording--> HasRecordedVideo --reset--> Idle
//! CameraActive --stop_camera--> Idle
//! ```
//!
//! Calls that do not apply to the current state are no-ops. The stream is
//! released on every path out of CameraActive/Recording.
//!
//! A recording takes chunks from exactly one source: the stream's own
//! recorder (through the channel) or direct pushes from the host. The first
//! source to deliver a chunk owns the recording and the other is refused.

use super::buffer::RecordingBuffer;
use super::state::{CaptureState, RecordedVideo, RecordingSession};
use crate::capture::{MediaDevices, MediaStream, StreamConstraints};
use crate::utils::{CampaignError, CampaignResult};
use bytes::Bytes;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

/// Events emitted by the controller
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CaptureEvent {
    /// Device stream acquired
    #[serde(rename_all = "camelCase")]
    CameraStarted { stream_id: String },
    /// Recorder attached
    RecordingStarted,
    /// Recording finalized
    #[serde(rename_all = "camelCase")]
    RecordingFinished { size_bytes: u64, duration_ms: f64 },
    /// Stream released without a recording
    CameraStopped,
    /// Everything cleared
    Reset,
}

/// Which side is feeding the current recording
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkSource {
    /// The stream's recorder, through the chunk channel
    Channel,
    /// Pushed by the host via [`MediaCaptureController::push_chunk`]
    Direct,
}

pub struct MediaCaptureController {
    devices: Arc<dyn MediaDevices>,
    constraints: StreamConstraints,
    default_mime_type: String,
    state: CaptureState,
    stream: Option<Box<dyn MediaStream>>,
    buffer: RecordingBuffer,
    chunk_rx: Option<mpsc::UnboundedReceiver<Bytes>>,
    chunk_source: Option<ChunkSource>,
    session: Option<RecordingSession>,
    recorded: Option<RecordedVideo>,
    event_tx: broadcast::Sender<CaptureEvent>,
}

impl MediaCaptureController {
    pub fn new(devices: Arc<dyn MediaDevices>, default_mime_type: impl Into<String>) -> Self {
        let (event_tx, _) = broadcast::channel(100);
        Self {
            devices,
            constraints: StreamConstraints::default(),
            default_mime_type: default_mime_type.into(),
            state: CaptureState::Idle,
            stream: None,
            buffer: RecordingBuffer::new(),
            chunk_rx: None,
            chunk_source: None,
            session: None,
            recorded: None,
            event_tx,
        }
    }

    pub fn with_constraints(mut self, constraints: StreamConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == CaptureState::Recording
    }

    pub fn has_stream(&self) -> bool {
        self.stream.is_some()
    }

    /// Source feeding the current recording, once one has delivered
    pub fn chunk_source(&self) -> Option<ChunkSource> {
        self.chunk_source
    }

    pub fn recorded_video(&self) -> Option<&RecordedVideo> {
        self.recorded.as_ref()
    }

    /// Milliseconds recorded so far
    pub fn recording_duration_ms(&self) -> f64 {
        self.session.as_ref().map(|s| s.elapsed_ms()).unwrap_or(0.0)
    }

    /// Subscribe to capture events
    pub fn subscribe(&self) -> broadcast::Receiver<CaptureEvent> {
        self.event_tx.subscribe()
    }

    fn emit(&self, event: CaptureEvent) {
        let _ = self.event_tx.send(event);
    }

    /// Acquire the camera and microphone
    pub async fn start_camera(&mut self) -> CampaignResult<CaptureState> {
        if matches!(self.state, CaptureState::Recording | CaptureState::HasRecordedVideo) {
            tracing::debug!("start_camera ignored in state {:?}", self.state);
            return Ok(self.state);
        }

        // Never hold two streams
        self.release_stream();
        self.state = CaptureState::Idle;

        match self.devices.request_stream(&self.constraints).await {
            Ok(stream) => {
                let stream_id = stream.id().to_string();
                tracing::info!("Camera started: {}", stream_id);
                self.stream = Some(stream);
                self.state = CaptureState::CameraActive;
                self.emit(CaptureEvent::CameraStarted { stream_id });
                Ok(self.state)
            }
            Err(e) => {
                tracing::warn!("Camera access failed: {}", e);
                Err(CampaignError::CameraAccessDenied)
            }
        }
    }

    /// Attach the recorder to the live stream
    pub fn start_recording(&mut self) -> CampaignResult<CaptureState> {
        if self.state != CaptureState::CameraActive {
            tracing::debug!("start_recording ignored in state {:?}", self.state);
            return Ok(self.state);
        }
        let Some(stream) = self.stream.as_mut() else {
            return Ok(self.state);
        };

        self.buffer.clear();
        self.chunk_source = None;
        let (tx, rx) = mpsc::unbounded_channel();
        if let Err(e) = stream.start_recording(tx) {
            tracing::warn!("Recorder failed to start: {}", e);
            self.release_stream();
            self.state = CaptureState::Idle;
            return Err(CampaignError::CameraAccessDenied);
        }

        self.chunk_rx = Some(rx);
        self.session = Some(RecordingSession::new());
        self.state = CaptureState::Recording;
        self.emit(CaptureEvent::RecordingStarted);

        tracing::info!("Recording started");
        Ok(self.state)
    }

    /// Append a chunk delivered directly by the platform binding. Refused
    /// once the stream's own recorder has started delivering.
    pub fn push_chunk(&mut self, chunk: Bytes) -> bool {
        if self.state != CaptureState::Recording {
            tracing::debug!("Dropping chunk outside of a recording");
            return false;
        }
        self.drain_chunks();
        if self.chunk_source == Some(ChunkSource::Channel) {
            tracing::warn!("Dropping pushed chunk: the stream recorder owns this recording");
            return false;
        }
        if chunk.is_empty() {
            return false;
        }

        self.chunk_source = Some(ChunkSource::Direct);
        self.buffer.push(chunk)
    }

    /// Move chunks waiting in the channel into the buffer. Channel chunks
    /// are discarded when the host is pushing chunks itself.
    pub fn drain_chunks(&mut self) -> usize {
        let Some(rx) = self.chunk_rx.as_mut() else {
            return 0;
        };

        let mut drained = 0;
        let mut discarded = 0;
        while let Ok(chunk) = rx.try_recv() {
            if chunk.is_empty() {
                continue;
            }
            if self.chunk_source == Some(ChunkSource::Direct) {
                discarded += 1;
                continue;
            }
            self.chunk_source = Some(ChunkSource::Channel);
            if self.buffer.push(chunk) {
                drained += 1;
            }
        }
        if discarded > 0 {
            tracing::warn!("Discarded {} stream chunks during a pushed recording", discarded);
        }
        drained
    }

    /// Finalize the recording and release the device
    pub fn stop_recording(&mut self) -> CaptureState {
        if self.state != CaptureState::Recording {
            tracing::debug!("stop_recording ignored in state {:?}", self.state);
            return self.state;
        }

        let mut mime_type = None;
        if let Some(stream) = self.stream.as_mut() {
            stream.stop_recording();
            mime_type = stream.mime_type();
        }
        self.drain_chunks();
        self.chunk_rx = None;
        self.chunk_source = None;

        let chunk_count = self.buffer.len();
        let data = self.buffer.finalize();
        let mut session = self.session.take().unwrap_or_default();
        session.end();

        let video = RecordedVideo::new(
            data,
            mime_type.unwrap_or_else(|| self.default_mime_type.clone()),
            chunk_count,
            &session,
        );
        let size_bytes = video.size_bytes;
        self.session = Some(session);
        self.recorded = Some(video);

        self.release_stream();
        self.state = CaptureState::HasRecordedVideo;
        self.emit(CaptureEvent::RecordingFinished {
            size_bytes,
            duration_ms: self.recording_duration_ms(),
        });

        tracing::info!(
            "Recording stopped: {} bytes in {} chunks",
            size_bytes,
            chunk_count
        );
        self.state
    }

    /// Release the stream without keeping anything recorded
    pub fn stop_camera(&mut self) -> CaptureState {
        if !matches!(self.state, CaptureState::CameraActive | CaptureState::Recording) {
            tracing::debug!("stop_camera ignored in state {:?}", self.state);
            return self.state;
        }

        self.discard_pending();
        self.release_stream();
        self.state = CaptureState::Idle;
        self.emit(CaptureEvent::CameraStopped);
        self.state
    }

    /// Drop a finalized recording (another video source replaced it)
    pub fn clear_recording(&mut self) {
        if self.recorded.take().is_some() {
            tracing::debug!("Recorded video discarded");
        }
        self.session = None;
        if self.state == CaptureState::HasRecordedVideo {
            self.state = CaptureState::Idle;
        }
    }

    /// Back to Idle from anywhere
    pub fn reset(&mut self) {
        self.discard_pending();
        self.release_stream();
        self.recorded = None;
        self.session = None;
        self.state = CaptureState::Idle;
        self.emit(CaptureEvent::Reset);
        tracing::info!("Capture reset");
    }

    fn discard_pending(&mut self) {
        if let Some(stream) = self.stream.as_mut() {
            stream.stop_recording();
        }
        self.chunk_rx = None;
        self.chunk_source = None;
        self.buffer.clear();
        if self.state == CaptureState::Recording {
            self.session = None;
        }
    }

    fn release_stream(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
            tracing::info!("Released stream {}", stream.id());
        }
    }
}

impl Drop for MediaCaptureController {
    fn drop(&mut self) {
        self.release_stream();
    }
}
