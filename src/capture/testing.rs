//! In-memory devices for tests

use super::traits::{ChunkSender, DeviceError, MediaDevices, MediaStream, StreamConstraints};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Hands out streams that emit a fixed set of chunks when recording starts
pub(crate) struct FakeDevices {
    chunks: Vec<Bytes>,
    deny: bool,
    fail_recorder: bool,
    acquired: Arc<AtomicUsize>,
    stopped: Arc<AtomicUsize>,
}

impl FakeDevices {
    pub(crate) fn granting(chunks: &[&[u8]]) -> Self {
        Self {
            chunks: chunks.iter().map(|c| Bytes::copy_from_slice(c)).collect(),
            deny: false,
            fail_recorder: false,
            acquired: Arc::new(AtomicUsize::new(0)),
            stopped: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn denying() -> Self {
        Self {
            deny: true,
            ..Self::granting(&[])
        }
    }

    /// Grants the camera, but the recorder refuses to attach
    pub(crate) fn failing_recorder() -> Self {
        Self {
            fail_recorder: true,
            ..Self::granting(&[])
        }
    }

    /// Streams handed out so far
    pub(crate) fn acquired_counter(&self) -> Arc<AtomicUsize> {
        self.acquired.clone()
    }

    /// Streams stopped so far
    pub(crate) fn stopped_counter(&self) -> Arc<AtomicUsize> {
        self.stopped.clone()
    }
}

#[async_trait]
impl MediaDevices for FakeDevices {
    async fn request_stream(
        &self,
        _constraints: &StreamConstraints,
    ) -> Result<Box<dyn MediaStream>, DeviceError> {
        if self.deny {
            return Err(DeviceError::PermissionDenied("user dismissed the prompt".to_string()));
        }

        let n = self.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeStream {
            id: format!("fake-{n}"),
            chunks: self.chunks.clone(),
            sink: None,
            fail_recorder: self.fail_recorder,
            live: true,
            stopped: self.stopped.clone(),
        }))
    }
}

struct FakeStream {
    id: String,
    chunks: Vec<Bytes>,
    sink: Option<ChunkSender>,
    fail_recorder: bool,
    live: bool,
    stopped: Arc<AtomicUsize>,
}

impl MediaStream for FakeStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn start_recording(&mut self, sink: ChunkSender) -> Result<(), DeviceError> {
        if self.fail_recorder {
            return Err(DeviceError::Platform("recorder unavailable".to_string()));
        }
        for chunk in &self.chunks {
            let _ = sink.send(chunk.clone());
        }
        self.sink = Some(sink);
        Ok(())
    }

    fn stop_recording(&mut self) {
        self.sink = None;
    }

    fn stop(&mut self) {
        if self.live {
            self.live = false;
            self.stopped.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn is_live(&self) -> bool {
        self.live
    }
}
