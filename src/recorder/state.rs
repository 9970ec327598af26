//! Capture state management
//!
//! The capture state machine, recording session timing and the finalized
//! recording.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Instant;
use uuid::Uuid;

/// Current state of the capture controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CaptureState {
    /// No stream, no recording
    Idle,
    /// Device stream acquired, preview running
    CameraActive,
    /// Recorder attached, chunks accumulating
    Recording,
    /// Recording finalized, stream released
    HasRecordedVideo,
}

impl Default for CaptureState {
    fn default() -> Self {
        Self::Idle
    }
}

/// Timing of one recording
#[derive(Debug, Clone)]
pub struct RecordingSession {
    started: Instant,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_ms: f64,
}

impl RecordingSession {
    /// Create a new session starting now
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            started_at: Utc::now(),
            ended_at: None,
            duration_ms: 0.0,
        }
    }

    /// End the session
    pub fn end(&mut self) {
        self.duration_ms = self.started.elapsed().as_secs_f64() * 1000.0;
        self.ended_at = Some(Utc::now());
    }

    /// Milliseconds recorded so far (or in total once ended)
    pub fn elapsed_ms(&self) -> f64 {
        match self.ended_at {
            Some(_) => self.duration_ms,
            None => self.started.elapsed().as_secs_f64() * 1000.0,
        }
    }
}

impl Default for RecordingSession {
    fn default() -> Self {
        Self::new()
    }
}

/// A finalized recording: one immutable blob
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedVideo {
    pub id: Uuid,
    pub mime_type: String,
    pub size_bytes: u64,
    pub chunk_count: usize,
    pub duration_ms: f64,
    pub recorded_at: DateTime<Utc>,
    #[serde(skip)]
    data: Bytes,
}

impl RecordedVideo {
    pub fn new(data: Bytes, mime_type: String, chunk_count: usize, session: &RecordingSession) -> Self {
        Self {
            id: Uuid::new_v4(),
            mime_type,
            size_bytes: data.len() as u64,
            chunk_count,
            duration_ms: session.duration_ms,
            recorded_at: session.ended_at.unwrap_or_else(Utc::now),
            data,
        }
    }

    /// The recorded bytes
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Playable reference handed to the UI, which fetches the bytes by id
    pub fn object_url(&self) -> String {
        format!("blob:recording/{}", self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_end_fixes_duration() {
        let mut session = RecordingSession::new();
        session.end();
        let fixed = session.elapsed_ms();

        std::thread::sleep(std::time::Duration::from_millis(5));
        assert_eq!(session.elapsed_ms(), fixed);
        assert!(session.ended_at.is_some());
    }

    #[test]
    fn test_recorded_video_reference() {
        let mut session = RecordingSession::new();
        session.end();
        let video = RecordedVideo::new(Bytes::from_static(b"abc"), "video/webm".into(), 2, &session);

        assert_eq!(video.size_bytes, 3);
        assert_eq!(video.object_url(), format!("blob:recording/{}", video.id));

        let json = serde_json::to_value(&video).unwrap();
        assert_eq!(json["mimeType"], "video/webm");
        assert!(json.get("data").is_none());
    }
}
