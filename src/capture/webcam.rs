//! Webcam capture using nokhwa
//!
//! The camera is opened on a dedicated thread (nokhwa cameras stay on the
//! thread that opened them). While a recorder is attached, raw frames are
//! piped into an FFmpeg child that encodes them to VP8 WebM; its stdout is
//! forwarded to the sink as chunks, so the finalized recording is a
//! playable `video/webm` file.

use super::audio::default_microphone;
use super::traits::{
    CameraInfo, ChunkSender, DeviceError, FacingMode, MediaDevices, MediaStream, Resolution,
    StreamConstraints,
};
use async_trait::async_trait;
use bytes::Bytes;
use nokhwa::pixel_format::RgbAFormat;
use nokhwa::utils::{ApiBackend, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType};
use nokhwa::Camera;
use parking_lot::Mutex as ParkingMutex;
use std::io::{ErrorKind, Read, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tokio::sync::oneshot;

const OUTPUT_CHUNK_SIZE: usize = 64 * 1024;

/// Get list of available cameras
pub fn get_cameras() -> Vec<CameraInfo> {
    match nokhwa::query(ApiBackend::Auto) {
        Ok(cameras) => cameras
            .into_iter()
            .map(|info| {
                let id = match info.index() {
                    CameraIndex::Index(i) => i.to_string(),
                    CameraIndex::String(s) => s.to_string(),
                };

                CameraInfo {
                    id,
                    name: info.human_name().to_string(),
                    supported_resolutions: vec![
                        Resolution {
                            width: 1280,
                            height: 720,
                        },
                        Resolution {
                            width: 640,
                            height: 480,
                        },
                    ],
                }
            })
            .collect(),
        Err(e) => {
            tracing::warn!("Failed to enumerate cameras: {:?}", e);
            Vec::new()
        }
    }
}

/// Device source backed by the local webcam and microphone
#[derive(Debug, Default)]
pub struct WebcamDevices;

impl WebcamDevices {
    pub fn new() -> Self {
        Self
    }

    /// Laptops list the built-in (user-facing) camera first
    fn camera_index(facing_mode: FacingMode, cameras: &[CameraInfo]) -> CameraIndex {
        let position = match facing_mode {
            FacingMode::User => 0,
            FacingMode::Environment => cameras.len().saturating_sub(1),
        };

        match cameras[position].id.parse::<u32>() {
            Ok(idx) => CameraIndex::Index(idx),
            Err(_) => CameraIndex::String(cameras[position].id.clone()),
        }
    }
}

#[async_trait]
impl MediaDevices for WebcamDevices {
    async fn request_stream(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<Box<dyn MediaStream>, DeviceError> {
        let cameras = tokio::task::spawn_blocking(get_cameras)
            .await
            .map_err(|e| DeviceError::Platform(e.to_string()))?;
        if cameras.is_empty() {
            return Err(DeviceError::DeviceNotFound("No cameras found".to_string()));
        }

        if constraints.audio && default_microphone().is_none() {
            return Err(DeviceError::DeviceNotFound("No microphone found".to_string()));
        }

        let index = Self::camera_index(constraints.facing_mode, &cameras);
        let stream = WebcamStream::open(index).await?;
        Ok(Box::new(stream))
    }
}

/// Negotiated camera format
#[derive(Debug, Clone, Copy)]
struct CaptureFormat {
    width: u32,
    height: u32,
    fps: u32,
    frame: FrameFormat,
}

impl CaptureFormat {
    /// FFmpeg input arguments for this camera's native frames
    fn input_args(&self) -> Vec<String> {
        let size = format!("{}x{}", self.width, self.height);
        let fps = self.fps.max(1).to_string();

        let pixel_format = match self.frame {
            FrameFormat::MJPEG => {
                return vec!["-f".into(), "mjpeg".into(), "-framerate".into(), fps];
            }
            FrameFormat::YUYV => "yuyv422",
            FrameFormat::NV12 => "nv12",
            FrameFormat::RAWRGB => "rgb24",
            FrameFormat::GRAY => "gray",
            other => {
                tracing::warn!("Unknown camera format {:?}, falling back to yuyv422", other);
                "yuyv422"
            }
        };

        vec![
            "-f".into(),
            "rawvideo".into(),
            "-pixel_format".into(),
            pixel_format.into(),
            "-video_size".into(),
            size,
            "-framerate".into(),
            fps,
        ]
    }
}

/// FFmpeg child turning raw frames into a WebM stream
struct WebmEncoder {
    process: Child,
    stdin: Option<ChildStdin>,
    reader: Option<JoinHandle<()>>,
    frame_count: u64,
    write_failed: bool,
}

impl WebmEncoder {
    fn spawn(format: &CaptureFormat, sink: ChunkSender) -> std::io::Result<Self> {
        let gop = (format.fps.max(1) * 2).to_string();
        let mut process = Command::new("ffmpeg")
            .args(["-hide_banner", "-loglevel", "error"])
            .args(format.input_args())
            .args(["-i", "-"])
            .args([
                "-an",
                "-c:v",
                "libvpx",
                "-deadline",
                "realtime",
                "-cpu-used",
                "8",
                "-b:v",
                "2M",
                "-g",
                &gop,
                "-pix_fmt",
                "yuv420p",
                "-f",
                "webm",
                "pipe:1",
            ])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdin = process.stdin.take();
        let Some(stdout) = process.stdout.take() else {
            let _ = process.kill();
            return Err(std::io::Error::other("FFmpeg stdout unavailable"));
        };
        let reader = std::thread::spawn(move || forward_output(stdout, sink));

        tracing::info!(
            "Started FFmpeg webm encoder: {}x{} @ {}fps, format={:?}",
            format.width,
            format.height,
            format.fps,
            format.frame
        );

        Ok(Self {
            process,
            stdin,
            reader: Some(reader),
            frame_count: 0,
            write_failed: false,
        })
    }

    fn write_frame(&mut self, data: &[u8]) {
        let Some(stdin) = self.stdin.as_mut() else {
            return;
        };
        match stdin.write_all(data) {
            Ok(()) => self.frame_count += 1,
            Err(e) if !self.write_failed => {
                tracing::warn!("FFmpeg rejected a frame: {}", e);
                self.write_failed = true;
            }
            Err(_) => {}
        }
    }

    /// Close stdin, wait for the encoder to flush and for every chunk to
    /// reach the sink
    fn finish(mut self) {
        drop(self.stdin.take());

        match self.process.wait_with_output() {
            Ok(output) if !output.status.success() => {
                tracing::warn!(
                    "FFmpeg webm encoder exited with status {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr)
                );
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("Failed to wait for FFmpeg: {}", e),
        }

        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }
        tracing::info!("FFmpeg webm encoder finished after {} frames", self.frame_count);
    }
}

/// Forward encoder output until EOF; drops the sink when done
fn forward_output(mut stdout: ChildStdout, sink: ChunkSender) {
    let mut buf = vec![0u8; OUTPUT_CHUNK_SIZE];
    loop {
        match stdout.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                if sink.send(Bytes::copy_from_slice(&buf[..n])).is_err() {
                    break;
                }
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                tracing::warn!("Failed to read FFmpeg output: {}", e);
                break;
            }
        }
    }
}

/// A live webcam stream
pub struct WebcamStream {
    id: String,
    live: Arc<AtomicBool>,
    format: CaptureFormat,
    encoder: Arc<ParkingMutex<Option<WebmEncoder>>>,
    capture_thread: Option<JoinHandle<()>>,
}

impl WebcamStream {
    async fn open(index: CameraIndex) -> Result<Self, DeviceError> {
        let live = Arc::new(AtomicBool::new(true));
        let encoder: Arc<ParkingMutex<Option<WebmEncoder>>> = Arc::new(ParkingMutex::new(None));
        let (ready_tx, ready_rx) = oneshot::channel();

        let thread_live = live.clone();
        let thread_encoder = encoder.clone();
        let thread_index = index.clone();

        let handle = std::thread::spawn(move || {
            let format =
                RequestedFormat::new::<RgbAFormat>(RequestedFormatType::AbsoluteHighestFrameRate);

            let mut camera = match Camera::new(thread_index.clone(), format) {
                Ok(c) => c,
                Err(e) => {
                    let _ = ready_tx.send(Err(DeviceError::PermissionDenied(format!(
                        "Failed to open camera {:?}: {:?}",
                        thread_index, e
                    ))));
                    return;
                }
            };

            if let Err(e) = camera.open_stream() {
                let _ = ready_tx.send(Err(DeviceError::PermissionDenied(format!(
                    "Failed to open camera stream: {:?}",
                    e
                ))));
                return;
            }

            let camera_format = camera.camera_format();
            let capture_format = CaptureFormat {
                width: camera_format.resolution().width(),
                height: camera_format.resolution().height(),
                fps: camera_format.frame_rate(),
                frame: camera_format.format(),
            };
            tracing::info!(
                "Webcam opened: {}x{} @ {}fps, format={:?}",
                capture_format.width,
                capture_format.height,
                capture_format.fps,
                capture_format.frame
            );
            let _ = ready_tx.send(Ok(capture_format));

            let mut frame_count: u64 = 0;
            while thread_live.load(Ordering::SeqCst) {
                match camera.frame() {
                    Ok(frame) => {
                        // Raw buffer in the camera's native format; FFmpeg converts
                        let mut guard = thread_encoder.lock();
                        if let Some(encoder) = guard.as_mut() {
                            encoder.write_frame(frame.buffer());
                            frame_count += 1;
                        }
                    }
                    Err(e) => {
                        tracing::debug!("Failed to capture frame: {:?}", e);
                    }
                }
            }

            if let Err(e) = camera.stop_stream() {
                tracing::warn!("Error stopping camera stream: {:?}", e);
            }
            tracing::info!("Webcam released after {} recorded frames", frame_count);
        });

        let format = match ready_rx.await {
            Ok(Ok(format)) => format,
            Ok(Err(e)) => {
                let _ = handle.join();
                return Err(e);
            }
            Err(_) => {
                let _ = handle.join();
                return Err(DeviceError::Platform("Camera thread exited".to_string()));
            }
        };

        Ok(Self {
            id: format!("webcam-{}", index),
            live,
            format,
            encoder,
            capture_thread: Some(handle),
        })
    }
}

impl MediaStream for WebcamStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn start_recording(&mut self, sink: ChunkSender) -> Result<(), DeviceError> {
        if !self.live.load(Ordering::SeqCst) {
            return Err(DeviceError::Platform("Stream already stopped".to_string()));
        }
        self.stop_recording();

        let encoder = WebmEncoder::spawn(&self.format, sink).map_err(|e| match e.kind() {
            ErrorKind::NotFound => DeviceError::Unsupported("ffmpeg not found on PATH".to_string()),
            _ => DeviceError::Platform(format!("Failed to start FFmpeg: {}", e)),
        })?;
        *self.encoder.lock() = Some(encoder);
        Ok(())
    }

    fn stop_recording(&mut self) {
        // Taken under the lock the capture thread writes under, so no frame
        // lands after this; finish() then drains the encoder into the sink.
        let encoder = self.encoder.lock().take();
        if let Some(encoder) = encoder {
            encoder.finish();
        }
    }

    fn stop(&mut self) {
        self.stop_recording();
        self.live.store(false, Ordering::SeqCst);
        if let Some(handle) = self.capture_thread.take() {
            let _ = handle.join();
        }
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    fn mime_type(&self) -> Option<String> {
        Some("video/webm".to_string())
    }
}

impl Drop for WebcamStream {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(frame: FrameFormat) -> CaptureFormat {
        CaptureFormat {
            width: 1280,
            height: 720,
            fps: 30,
            frame,
        }
    }

    #[test]
    fn test_raw_frames_describe_pixel_layout() {
        let args = format(FrameFormat::YUYV).input_args();
        assert_eq!(
            args,
            [
                "-f",
                "rawvideo",
                "-pixel_format",
                "yuyv422",
                "-video_size",
                "1280x720",
                "-framerate",
                "30"
            ]
        );
    }

    #[test]
    fn test_mjpeg_frames_use_mjpeg_demuxer() {
        let args = format(FrameFormat::MJPEG).input_args();
        assert_eq!(args, ["-f", "mjpeg", "-framerate", "30"]);
    }
}
