//! The current video, whichever path produced it

use crate::recorder::RecordedVideo;
use crate::upload::SelectedFile;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoSource {
    Recorded,
    Uploaded,
}

/// Borrowed view of the single authoritative video
#[derive(Debug, Clone, Copy)]
pub enum CurrentVideo<'a> {
    Recorded(&'a RecordedVideo),
    Uploaded(&'a SelectedFile),
}

impl CurrentVideo<'_> {
    pub fn source(&self) -> VideoSource {
        match self {
            CurrentVideo::Recorded(_) => VideoSource::Recorded,
            CurrentVideo::Uploaded(_) => VideoSource::Uploaded,
        }
    }

    pub fn object_url(&self) -> String {
        match self {
            CurrentVideo::Recorded(v) => v.object_url(),
            CurrentVideo::Uploaded(f) => f.object_url(),
        }
    }

    pub fn size_bytes(&self) -> u64 {
        match self {
            CurrentVideo::Recorded(v) => v.size_bytes,
            CurrentVideo::Uploaded(f) => f.size_bytes,
        }
    }

    pub fn summary(&self) -> VideoSummary {
        let (mime_type, name, duration_ms) = match self {
            CurrentVideo::Recorded(v) => (v.mime_type.clone(), None, Some(v.duration_ms)),
            CurrentVideo::Uploaded(f) => (f.mime_type.clone(), Some(f.name.clone()), None),
        };

        VideoSummary {
            source: self.source(),
            object_url: self.object_url(),
            size_bytes: self.size_bytes(),
            mime_type,
            name,
            duration_ms,
        }
    }
}

/// Owned description of the current video, for snapshots and entries
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSummary {
    pub source: VideoSource,
    pub object_url: String,
    pub size_bytes: u64,
    pub mime_type: String,
    pub name: Option<String>,
    pub duration_ms: Option<f64>,
}
